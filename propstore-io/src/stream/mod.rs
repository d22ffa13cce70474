mod stream_err;
pub use self::stream_err::*;

mod save_stream;
pub use self::save_stream::*;

mod load_stream;
pub use self::load_stream::*;
