use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use propstore_core::containers::PropertyContainer;
use propstore_core::layout::ContainerKind;

use super::{LoadFromStream, SaveToStream};
use crate::stream::{LoadStream, Result, SaveStream, StreamError};

/// Magic bytes at the start of every container file
pub const FILE_MAGIC: &[u8; 8] = b"PROPSTOR";
/// Version of the container file format written by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Writes `container` to `writer` as a container file (magic bytes, format version, container chunks) and returns
/// the writer
pub fn write_container<K: ContainerKind, W: Write>(
    writer: W,
    container: &PropertyContainer<K>,
    exclude_recomputable: bool,
) -> Result<W> {
    let mut stream = SaveStream::new(writer);
    stream.write_bytes(FILE_MAGIC)?;
    stream.write_u32(FORMAT_VERSION)?;
    container.save_to_stream(&mut stream, exclude_recomputable)?;
    stream.into_inner()
}

/// Reads a container file written by `write_container`
pub fn read_container<K: ContainerKind, R: Read>(reader: R) -> Result<PropertyContainer<K>> {
    let mut stream = LoadStream::new(reader);
    let mut magic = [0; 8];
    stream.read_bytes(&mut magic)?;
    if &magic != FILE_MAGIC {
        return Err(StreamError::Corrupt(
            "Not a property container file".to_owned(),
        ));
    }
    let version = stream.read_u32()?;
    if version > FORMAT_VERSION {
        return Err(StreamError::UnsupportedVersion(version));
    }
    PropertyContainer::load_from_stream(&mut stream)
}

/// Writes `container` to the file at `path`, replacing any existing file
pub fn save_container_to_path<K: ContainerKind, P: AsRef<Path>>(
    path: P,
    container: &PropertyContainer<K>,
    exclude_recomputable: bool,
) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    write_container(file, container, exclude_recomputable)?;
    Ok(())
}

/// Reads the container file at `path`
pub fn load_container_from_path<K: ContainerKind, P: AsRef<Path>>(
    path: P,
) -> Result<PropertyContainer<K>> {
    read_container(BufReader::new(File::open(path)?))
}
