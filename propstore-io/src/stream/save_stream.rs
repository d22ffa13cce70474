use std::convert::TryFrom;
use std::io::Write;

use byteorder::{NativeEndian, WriteBytesExt};

use super::{Result, StreamError};

/// Writes binary data as a sequence of nested chunks. Every chunk starts with its numeric id and the length of its
/// payload in bytes, so that readers can verify chunk boundaries and skip trailing data they do not understand.
///
/// The payload of an open chunk is buffered in memory until `end_chunk` is called, which means that the underlying
/// writer does not have to support seeking. All integers are written in native byte order, sizes as `u64`.
///
/// ```
/// # use propstore_io::stream::*;
/// let mut stream = SaveStream::new(vec![]);
/// stream.begin_chunk(0x01);
/// stream.write_string("Position").unwrap();
/// stream.end_chunk().unwrap();
/// let bytes = stream.into_inner().unwrap();
/// // id, payload length, string length, string
/// assert_eq!(bytes.len(), 4 + 8 + 4 + 8);
/// ```
pub struct SaveStream<W: Write> {
    writer: W,
    open_chunks: Vec<(u32, Vec<u8>)>,
}

impl<W: Write> SaveStream<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            open_chunks: vec![],
        }
    }

    fn sink(&mut self) -> &mut dyn Write {
        match self.open_chunks.last_mut() {
            Some((_, payload)) => payload,
            None => &mut self.writer,
        }
    }

    /// Opens a new chunk with the given id. All data written until the matching `end_chunk` call becomes the payload
    /// of this chunk
    pub fn begin_chunk(&mut self, id: u32) {
        self.open_chunks.push((id, vec![]));
    }

    /// Closes the innermost open chunk and writes it to the enclosing chunk (or the underlying writer)
    pub fn end_chunk(&mut self) -> Result<()> {
        let (id, payload) = self
            .open_chunks
            .pop()
            .ok_or_else(|| StreamError::Corrupt("end_chunk called without an open chunk".into()))?;
        let sink = self.sink();
        sink.write_u32::<NativeEndian>(id)?;
        sink.write_u64::<NativeEndian>(payload.len() as u64)?;
        sink.write_all(&payload)?;
        Ok(())
    }

    /// Number of chunks that are currently open
    pub fn open_chunk_count(&self) -> usize {
        self.open_chunks.len()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink().write_all(bytes)?;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.sink().write_u8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.sink().write_u32::<NativeEndian>(value)?;
        Ok(())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.sink().write_i32::<NativeEndian>(value)?;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.sink().write_u64::<NativeEndian>(value)?;
        Ok(())
    }

    /// Writes a `usize` as a 64-bit value
    pub fn write_size(&mut self, value: usize) -> Result<()> {
        self.write_u64(value as u64)
    }

    /// Writes a UTF-8 string, prefixed by its length in bytes as `u32`
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        let length = u32::try_from(value.len()).map_err(|_| {
            StreamError::Corrupt(format!(
                "String of {} bytes is too long to be stored",
                value.len()
            ))
        })?;
        self.write_u32(length)?;
        self.write_bytes(value.as_bytes())
    }

    /// Writes a list of strings, prefixed by the number of strings as `u32`
    pub fn write_string_list<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        let count = u32::try_from(values.len()).map_err(|_| {
            StreamError::Corrupt(format!("List of {} strings is too long", values.len()))
        })?;
        self.write_u32(count)?;
        for value in values {
            self.write_string(value.as_ref())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the underlying writer. Fails if any chunk is still open, since its payload would be lost
    pub fn into_inner(mut self) -> Result<W> {
        if !self.open_chunks.is_empty() {
            return Err(StreamError::Corrupt(format!(
                "{} chunk(s) were not closed",
                self.open_chunks.len()
            )));
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_chunks_are_length_prefixed() {
        let mut stream = SaveStream::new(vec![]);
        stream.begin_chunk(0x01);
        stream.write_bool(true).unwrap();
        stream.begin_chunk(0x02);
        stream.write_i32(-7).unwrap();
        stream.end_chunk().unwrap();
        stream.end_chunk().unwrap();
        let bytes = stream.into_inner().unwrap();

        let inner_length = 4;
        let outer_length = 1 + 4 + 8 + inner_length;
        assert_eq!(bytes.len(), 4 + 8 + outer_length);
        assert_eq!(&bytes[0..4], &1u32.to_ne_bytes());
        assert_eq!(&bytes[4..12], &(outer_length as u64).to_ne_bytes());
        assert_eq!(bytes[12], 1);
        assert_eq!(&bytes[13..17], &2u32.to_ne_bytes());
        assert_eq!(&bytes[25..29], &(-7i32).to_ne_bytes());
    }

    #[test]
    fn test_unbalanced_chunks_are_errors() {
        let mut stream = SaveStream::new(vec![]);
        assert!(matches!(stream.end_chunk(), Err(StreamError::Corrupt(_))));
        stream.begin_chunk(0x03);
        assert_eq!(stream.open_chunk_count(), 1);
        assert!(matches!(stream.into_inner(), Err(StreamError::Corrupt(_))));
    }
}
