use std::convert::TryFrom;
use std::io::{self, Read};

use byteorder::{NativeEndian, ReadBytesExt};
use log::debug;

use super::{Result, StreamError};

/// Reads binary data that was written by a `SaveStream`. Chunk boundaries are tracked, so reading past the end of
/// the current chunk fails with `StreamError::Corrupt` instead of silently consuming the next chunk, and data at the
/// end of a chunk that the reader does not consume is skipped by `close_chunk`
pub struct LoadStream<R: Read> {
    reader: R,
    position: u64,
    chunk_ends: Vec<u64>,
}

macro_rules! read_primitive {
    ($name:ident, $type:ty, $read_fn:ident $(, $endian:ty)?) => {
        pub fn $name(&mut self) -> Result<$type> {
            self.check_available(std::mem::size_of::<$type>() as u64)?;
            let value = self.reader.$read_fn$(::<$endian>)?()?;
            self.position += std::mem::size_of::<$type>() as u64;
            Ok(value)
        }
    };
}

impl<R: Read> LoadStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            position: 0,
            chunk_ends: vec![],
        }
    }

    /// Number of bytes read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Fails if fewer than `count` bytes are left in the current chunk. Outside of any chunk this always succeeds
    pub fn check_available(&self, count: u64) -> Result<()> {
        if let Some(end) = self.chunk_ends.last() {
            if self.position.saturating_add(count) > *end {
                return Err(StreamError::Corrupt(format!(
                    "Reading {} bytes at offset {} crosses the end of the current chunk at offset {}",
                    count, self.position, end
                )));
            }
        }
        Ok(())
    }

    /// Reads the header of the next chunk and fails with `StreamError::ChunkMismatch` if its id is not `id`
    pub fn expect_chunk(&mut self, id: u32) -> Result<()> {
        let found = self.read_u32()?;
        if found != id {
            return Err(StreamError::ChunkMismatch { expected: id, found });
        }
        let length = self.read_u64()?;
        self.check_available(length)?;
        self.chunk_ends.push(self.position + length);
        Ok(())
    }

    /// Leaves the innermost chunk, skipping any of its data that was not read
    pub fn close_chunk(&mut self) -> Result<()> {
        let end = self
            .chunk_ends
            .pop()
            .ok_or_else(|| StreamError::Corrupt("close_chunk called without an open chunk".into()))?;
        let remaining = end - self.position;
        if remaining > 0 {
            debug!("Skipping {} unread bytes at the end of a chunk", remaining);
            let skipped = io::copy(&mut (&mut self.reader).take(remaining), &mut io::sink())?;
            if skipped != remaining {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
            self.position = end;
        }
        Ok(())
    }

    /// Fills `buffer` with the next bytes of the stream
    pub fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.check_available(buffer.len() as u64)?;
        self.reader.read_exact(buffer)?;
        self.position += buffer.len() as u64;
        Ok(())
    }

    read_primitive!(read_u8, u8, read_u8);
    read_primitive!(read_u32, u32, read_u32, NativeEndian);
    read_primitive!(read_i32, i32, read_i32, NativeEndian);
    read_primitive!(read_u64, u64, read_u64, NativeEndian);

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(StreamError::Corrupt(format!(
                "Invalid boolean value {}",
                other
            ))),
        }
    }

    /// Reads a 64-bit size and fails if it does not fit into `usize`
    pub fn read_size(&mut self) -> Result<usize> {
        let value = self.read_u64()?;
        usize::try_from(value)
            .map_err(|_| StreamError::Corrupt(format!("Size {} exceeds the address space", value)))
    }

    /// Reads the next `count` bytes into a new buffer. The buffer grows with the data that actually arrives, so a
    /// corrupt `count` fails with an `UnexpectedEof` error instead of a huge allocation
    pub fn read_byte_vec(&mut self, count: usize) -> Result<Vec<u8>> {
        let length = count as u64;
        self.check_available(length)?;
        let mut bytes = vec![];
        let read = (&mut self.reader).take(length).read_to_end(&mut bytes)? as u64;
        self.position += read;
        if read != length {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(bytes)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_u32()? as usize;
        let bytes = self.read_byte_vec(length)?;
        Ok(String::from_utf8(bytes)?)
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let count = self.read_u32()?;
        (0..count).map(|_| self.read_string()).collect()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::stream::SaveStream;

    fn sample_stream() -> Vec<u8> {
        let mut stream = SaveStream::new(vec![]);
        stream.begin_chunk(0x01);
        stream.write_string("Färbung").unwrap();
        stream.write_size(42).unwrap();
        stream.write_string_list(&["X", "Y"]).unwrap();
        stream.write_i32(-3).unwrap();
        stream.end_chunk().unwrap();
        stream.begin_chunk(0x02);
        stream.write_bool(false).unwrap();
        stream.end_chunk().unwrap();
        stream.into_inner().unwrap()
    }

    #[test]
    fn test_read_back_values() {
        let mut stream = LoadStream::new(Cursor::new(sample_stream()));
        stream.expect_chunk(0x01).unwrap();
        assert_eq!(stream.read_string().unwrap(), "Färbung");
        assert_eq!(stream.read_size().unwrap(), 42);
        assert_eq!(stream.read_string_list().unwrap(), vec!["X", "Y"]);
        assert_eq!(stream.read_i32().unwrap(), -3);
        stream.close_chunk().unwrap();
        stream.expect_chunk(0x02).unwrap();
        assert!(!stream.read_bool().unwrap());
        stream.close_chunk().unwrap();
    }

    #[test]
    fn test_close_chunk_skips_unread_data() {
        let bytes = sample_stream();
        let length = bytes.len() as u64;
        let mut stream = LoadStream::new(Cursor::new(bytes));
        stream.expect_chunk(0x01).unwrap();
        assert_eq!(stream.read_string().unwrap(), "Färbung");
        stream.close_chunk().unwrap();
        stream.expect_chunk(0x02).unwrap();
        stream.close_chunk().unwrap();
        assert_eq!(stream.position(), length);
    }

    #[test]
    fn test_chunk_mismatch_and_overrun() {
        let mut stream = LoadStream::new(Cursor::new(sample_stream()));
        assert!(matches!(
            stream.expect_chunk(0x02),
            Err(StreamError::ChunkMismatch {
                expected: 0x02,
                found: 0x01
            })
        ));

        let mut stream = LoadStream::new(Cursor::new(sample_stream()));
        stream.expect_chunk(0x01).unwrap();
        stream.close_chunk().unwrap();
        stream.expect_chunk(0x02).unwrap();
        stream.read_bool().unwrap();
        assert!(matches!(stream.read_u32(), Err(StreamError::Corrupt(_))));
    }

    #[test]
    fn test_byte_vec_is_bounded_by_available_data() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&0x07u32.to_ne_bytes());
        bytes.extend_from_slice(&(u64::MAX / 2).to_ne_bytes());
        bytes.extend_from_slice(&[1, 2, 3]);
        let mut stream = LoadStream::new(Cursor::new(bytes));
        stream.expect_chunk(0x07).unwrap();
        assert!(matches!(
            stream.read_byte_vec(1 << 30),
            Err(StreamError::Io(_))
        ));

        let mut stream = LoadStream::new(Cursor::new(vec![4, 5, 6]));
        assert_eq!(stream.read_byte_vec(2).unwrap(), vec![4, 5]);
        assert_eq!(stream.position(), 2);
    }

    #[test]
    fn test_truncated_stream() {
        let mut bytes = sample_stream();
        bytes.truncate(10);
        let mut stream = LoadStream::new(Cursor::new(bytes));
        stream.read_u32().unwrap();
        assert!(matches!(stream.read_u64(), Err(StreamError::Io(_))));
    }
}
