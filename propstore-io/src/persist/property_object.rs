use std::io::{Read, Write};

use log::trace;
use propstore_core::containers::{PropertyObject, PropertyStorage};

use super::{LoadFromStream, SaveToStream};
use crate::stream::{LoadStream, Result, SaveStream};

/// Chunk id of a persisted `PropertyObject`
pub const PROPERTY_OBJECT_CHUNK_ID: u32 = 0x01;

/// Writes the `exclude_recomputable` flag followed by the storage chunk. Element types and the title are not
/// persisted
impl SaveToStream for PropertyObject {
    fn save_to_stream<W: Write>(
        &self,
        stream: &mut SaveStream<W>,
        exclude_recomputable: bool,
    ) -> Result<()> {
        stream.begin_chunk(PROPERTY_OBJECT_CHUNK_ID);
        stream.write_bool(exclude_recomputable)?;
        self.storage().save_to_stream(stream, exclude_recomputable)?;
        stream.end_chunk()
    }
}

impl LoadFromStream for PropertyObject {
    fn load_from_stream<R: Read>(stream: &mut LoadStream<R>) -> Result<Self> {
        stream.expect_chunk(PROPERTY_OBJECT_CHUNK_ID)?;
        let excluded = stream.read_bool()?;
        let storage = PropertyStorage::load_from_stream(stream)?;
        stream.close_chunk()?;
        if excluded {
            trace!("Loaded property '{}' without element data", storage.name());
        }
        Ok(PropertyObject::new(storage))
    }
}
