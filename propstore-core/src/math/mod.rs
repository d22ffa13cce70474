mod bitmask;
pub use self::bitmask::*;
