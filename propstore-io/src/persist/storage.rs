use std::io::{Read, Write};

use log::debug;
use propstore_core::containers::{PropertyStorage, TypedSliceMut};
use propstore_core::layout::{DataType, FloatType};

use super::{LoadFromStream, SaveToStream};
use crate::stream::{LoadStream, Result, SaveStream, StreamError};

/// Chunk id of a persisted `PropertyStorage`
pub const STORAGE_CHUNK_ID: u32 = 0x02;

/// How a data type name stored in a stream maps to the data types of the running build
enum StoredType {
    Native(DataType),
    /// Floating-point values of a different width than `FloatType`, with the given size in bytes
    ForeignFloat(usize),
}

impl StoredType {
    fn resolve(type_name: &str) -> Result<Self> {
        if let Ok(data_type) = DataType::from_type_name(type_name) {
            return Ok(StoredType::Native(data_type));
        }
        match type_name {
            "f32" => Ok(StoredType::ForeignFloat(4)),
            "f64" => Ok(StoredType::ForeignFloat(8)),
            _ => Err(StreamError::UnknownDataType(type_name.to_owned())),
        }
    }

    fn size(&self) -> usize {
        match self {
            StoredType::Native(data_type) => data_type.size(),
            StoredType::ForeignFloat(size) => *size,
        }
    }
}

fn read_float(bytes: &[u8]) -> FloatType {
    if bytes.len() == 4 {
        let mut buffer = [0; 4];
        buffer.copy_from_slice(bytes);
        f32::from_ne_bytes(buffer) as FloatType
    } else {
        let mut buffer = [0; 8];
        buffer.copy_from_slice(bytes);
        f64::from_ne_bytes(buffer) as FloatType
    }
}

/// Converts floating-point values of width `stored_size` from `raw` into the `Float` storage `target`, value by value
/// (padding values included)
fn convert_float_width(raw: &[u8], stored_size: usize, target: &mut PropertyStorage) {
    if let TypedSliceMut::Float(values) = target.as_typed_slice_mut() {
        for (value, bytes) in values.iter_mut().zip(raw.chunks_exact(stored_size)) {
            *value = read_float(bytes);
        }
    }
}

/// Writes the layout of a storage followed by its raw element bytes: name, semantic type id, data type name, data
/// type size, stride, component count, component names, element count and `element count * stride` bytes. With
/// `exclude_recomputable`, the element count is written as zero and no element bytes follow
impl SaveToStream for PropertyStorage {
    fn save_to_stream<W: Write>(
        &self,
        stream: &mut SaveStream<W>,
        exclude_recomputable: bool,
    ) -> Result<()> {
        stream.begin_chunk(STORAGE_CHUNK_ID);
        stream.write_string(self.name())?;
        stream.write_i32(self.type_id())?;
        stream.write_string(self.data_type().type_name())?;
        stream.write_size(self.data_type_size())?;
        stream.write_size(self.stride())?;
        stream.write_size(self.component_count())?;
        stream.write_string_list(self.component_names())?;
        if exclude_recomputable {
            stream.write_size(0)?;
        } else {
            stream.write_size(self.size())?;
            stream.write_bytes(self.bytes())?;
        }
        stream.end_chunk()
    }
}

/// Restores a storage written by `save_to_stream`. Floating-point data of a different width than `FloatType` is
/// converted to `FloatType`, with the stride scaled accordingly. Fails with `StreamError::UnknownDataType` if the
/// data type name is not known to this build
impl LoadFromStream for PropertyStorage {
    fn load_from_stream<R: Read>(stream: &mut LoadStream<R>) -> Result<Self> {
        stream.expect_chunk(STORAGE_CHUNK_ID)?;
        let name = stream.read_string()?;
        let type_id = stream.read_i32()?;
        let type_name = stream.read_string()?;
        let stored_type_size = stream.read_size()?;
        let stored_stride = stream.read_size()?;
        let component_count = stream.read_size()?;
        let component_names = stream.read_string_list()?;
        let element_count = stream.read_size()?;

        let stored_type = StoredType::resolve(&type_name)?;
        if stored_type_size != stored_type.size() {
            return Err(StreamError::Corrupt(format!(
                "Property '{}' has data type '{}', but a data type size of {} bytes",
                name, type_name, stored_type_size
            )));
        }
        if stored_stride % stored_type_size != 0 {
            return Err(StreamError::Corrupt(format!(
                "Stride {} of property '{}' is not a multiple of its data type size",
                stored_stride, name
            )));
        }
        let byte_count = element_count.checked_mul(stored_stride).ok_or_else(|| {
            StreamError::Corrupt(format!(
                "Property '{}' with {} elements exceeds the address space",
                name, element_count
            ))
        })?;

        // The layout is validated on an empty storage, the elements are only allocated once their bytes were read
        let storage = match stored_type {
            StoredType::Native(data_type) => {
                let mut storage =
                    PropertyStorage::new(0, data_type, component_count, stored_stride, name)?;
                let raw = stream.read_byte_vec(byte_count)?;
                storage.resize(element_count, false);
                storage.bytes_mut().copy_from_slice(&raw);
                storage
            }
            StoredType::ForeignFloat(stored_size) => {
                let stride = (stored_stride / stored_size)
                    .checked_mul(DataType::Float.size())
                    .ok_or_else(|| {
                        StreamError::Corrupt(format!(
                            "Stride {} of property '{}' exceeds the address space",
                            stored_stride, name
                        ))
                    })?;
                let mut storage =
                    PropertyStorage::new(0, DataType::Float, component_count, stride, name)?;
                let raw = stream.read_byte_vec(byte_count)?;
                debug!(
                    "Converting property '{}' from {}-byte to {}-byte floating-point values",
                    storage.name(),
                    stored_size,
                    DataType::Float.size()
                );
                storage.resize(element_count, false);
                convert_float_width(&raw, stored_size, &mut storage);
                storage
            }
        };
        stream.close_chunk()?;
        Ok(storage
            .with_type_id(type_id)
            .with_component_names(component_names))
    }
}
