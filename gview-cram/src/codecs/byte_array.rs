//! BYTE_ARRAY_LEN and BYTE_ARRAY_STOP: the two variable-length byte-string
//! codecs, both backed by an EXTERNAL block's byte stream.

use gview_core::error::{Error, Result};

/// A forward-only cursor owning an external block's decompressed bytes.
#[derive(Clone, Debug)]
pub struct ByteStream {
    data: Vec<u8>,
    pos: usize,
}

impl ByteStream {
    /// Wraps `data` for sequential reads from the start.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// Reads a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(Error::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    /// Reads an ITF8-encoded integer from this stream.
    pub fn read_itf8(&mut self) -> Result<i32> {
        crate::io::read_itf8(self)
    }
}

impl std::io::Read for ByteStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Reads `len` bytes, as given by a preceding length codec invocation.
pub fn read_byte_array_len(stream: &mut ByteStream, len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(stream.read_u8()?);
    }
    Ok(out)
}

/// Reads bytes until (and consuming) the `stop` sentinel.
pub fn read_byte_array_stop(stream: &mut ByteStream, stop: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    loop {
        let b = stream.read_u8()?;
        if b == stop {
            break;
        }
        out.push(b);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_array_len() {
        let data = b"ACGTACGT".to_vec();
        let mut stream = ByteStream::new(data);
        let bytes = read_byte_array_len(&mut stream, 4).unwrap();
        assert_eq!(bytes, b"ACGT");
    }

    #[test]
    fn test_byte_array_stop() {
        let data = b"hello\0world".to_vec();
        let mut stream = ByteStream::new(data);
        let bytes = read_byte_array_stop(&mut stream, 0).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_byte_array_stop_underrun() {
        let data = b"no-terminator".to_vec();
        let mut stream = ByteStream::new(data);
        assert!(read_byte_array_stop(&mut stream, 0).is_err());
    }
}
