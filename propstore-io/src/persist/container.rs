use std::io::{Read, Write};

use propstore_core::containers::{PropertyContainer, PropertyObject};
use propstore_core::layout::ContainerKind;

use super::{LoadFromStream, SaveToStream};
use crate::stream::{LoadStream, Result, SaveStream, StreamError};

/// Chunk id of the header of a persisted `PropertyContainer`, holding the `exclude_recomputable` flag
pub const CONTAINER_HEADER_CHUNK_ID: u32 = 0x01;
/// Chunk id of the content of a persisted `PropertyContainer`
pub const CONTAINER_CONTENT_CHUNK_ID: u32 = 0x02;

/// Writes a header chunk with the `exclude_recomputable` flag, followed by a content chunk with the custom title (empty
/// if there is none), the element count, the number of properties and every property object
impl<K: ContainerKind> SaveToStream for PropertyContainer<K> {
    fn save_to_stream<W: Write>(
        &self,
        stream: &mut SaveStream<W>,
        exclude_recomputable: bool,
    ) -> Result<()> {
        stream.begin_chunk(CONTAINER_HEADER_CHUNK_ID);
        stream.write_bool(exclude_recomputable)?;
        stream.end_chunk()?;

        stream.begin_chunk(CONTAINER_CONTENT_CHUNK_ID);
        stream.write_string(self.custom_title().unwrap_or_default())?;
        stream.write_size(self.element_count())?;
        stream.write_size(self.properties().len())?;
        for property in self.properties() {
            property.save_to_stream(stream, exclude_recomputable)?;
        }
        stream.end_chunk()
    }
}

/// Restores a container written by `save_to_stream`. If recomputable data was excluded, the container is restored
/// with zero elements and properties of the right layout, ready to be refilled
impl<K: ContainerKind> LoadFromStream for PropertyContainer<K> {
    fn load_from_stream<R: Read>(stream: &mut LoadStream<R>) -> Result<Self> {
        stream.expect_chunk(CONTAINER_HEADER_CHUNK_ID)?;
        let excluded = stream.read_bool()?;
        stream.close_chunk()?;

        stream.expect_chunk(CONTAINER_CONTENT_CHUNK_ID)?;
        let mut container = PropertyContainer::<K>::new();
        let title = stream.read_string()?;
        if !title.is_empty() {
            container.set_title(title);
        }
        let element_count = stream.read_size()?;
        let property_count = stream.read_size()?;
        for _ in 0..property_count {
            container.add_property(PropertyObject::load_from_stream(stream)?)?;
        }
        stream.close_chunk()?;

        if excluded || container.properties().is_empty() {
            container.set_element_count(if excluded { 0 } else { element_count });
        } else if container.element_count() != element_count {
            return Err(StreamError::Corrupt(format!(
                "{} container stores {} elements, but its properties have {} elements",
                K::DISPLAY_NAME,
                element_count,
                container.element_count()
            )));
        }
        container.verify_integrity()?;
        Ok(container)
    }
}
