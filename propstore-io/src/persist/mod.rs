use std::io::{Read, Write};

use crate::stream::{LoadStream, Result, SaveStream};

mod storage;
pub use self::storage::*;

mod property_object;
pub use self::property_object::*;

mod container;
pub use self::container::*;

mod file;
pub use self::file::*;

/// Base trait for all types that can write themselves to a `SaveStream`
pub trait SaveToStream {
    /// Writes `self` to `stream`. With `exclude_recomputable`, bulk element data is omitted and only the shape of
    /// the data is written, e.g. for a lightweight cache of a pipeline state whose arrays are recomputed on load
    fn save_to_stream<W: Write>(
        &self,
        stream: &mut SaveStream<W>,
        exclude_recomputable: bool,
    ) -> Result<()>;
}

/// Base trait for all types that can be restored from a `LoadStream`
pub trait LoadFromStream: Sized {
    fn load_from_stream<R: Read>(stream: &mut LoadStream<R>) -> Result<Self>;
}
