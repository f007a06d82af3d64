use hex::FromHexError;
use snafu::{ensure, Snafu};
use tracing::trace;

use alaio_macros::with_location;

#[with_location]
#[derive(Debug, Snafu)]
pub enum StreamError {
    #[snafu(display("stream ended, tried to read {wanted} byte(s) but only {available} available"))]
    Ended { wanted: usize, available: usize },

    #[snafu(display("buffer overflow, tried to write {wanted} byte(s) but only room for {available}"))]
    Overflow { wanted: usize, available: usize },

    #[snafu(display("varint too long to fit in u32"))]
    InvalidVarInt,
}


/// Sink for the binary serialization of a value.
///
/// There are three implementations with the same observable write sequence:
/// [`ByteStream`] appends to a growable buffer, [`SizeStream`] only counts the
/// bytes that would be produced, and [`FixedBufStream`] fills a caller-provided
/// buffer and fails with [`StreamError::Overflow`] when it runs out of room.
pub trait StreamWriter {
    fn write_byte(&mut self, byte: u8) -> Result<(), StreamError>;
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError>;

    /// Write an unsigned integer in LEB128 encoding (1 to 5 bytes).
    fn write_var_u32(&mut self, n: u32) -> Result<(), StreamError> {
        let mut n = n;
        loop {
            if n >> 7 != 0 {
                self.write_byte((0x80 | (n & 0x7f)) as u8)?;
                n >>= 7;
            }
            else {
                self.write_byte(n as u8)?;
                break;
            }
        }
        Ok(())
    }

    /// Write a signed integer in zig-zag encoding (1 to 5 bytes).
    fn write_var_i32(&mut self, n: i32) -> Result<(), StreamError> {
        self.write_var_u32(((n as u32) << 1) ^ ((n >> 31) as u32))
    }
}


/// Provide access to a byte stream along with a cursor to read into it.
///
/// This is different from both `std::io::Read`/`std::io::Write` and the
/// `bytes` crate as this is supposed to be used for reading from buffers that
/// have an end, so the `read` operation is fallible, while the `write`
/// operation only grows the owned buffer and never fails.
#[derive(Default)]
pub struct ByteStream {
    data: Vec<u8>,

    read_pos: usize,
}

impl From<ByteStream> for Vec<u8> {
    fn from(stream: ByteStream) -> Vec<u8> {
        stream.data
    }
}

impl ByteStream {
    pub fn new() -> Self {
        Self {
            data: vec![],
            read_pos: 0,
        }
    }

    pub fn from(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    pub fn from_hex(repr: &str) -> Result<Self, FromHexError> {
        Ok(Self::from(hex::decode(repr)?))
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }

    pub fn hex_data(&self) -> String {
        hex::encode(&self.data)
    }

    /// Return the part of the stream that has not been read yet.
    pub fn leftover(&self) -> &[u8] {
        &self.data[self.read_pos..]
    }

    pub fn read_byte(&mut self) -> Result<u8, StreamError> {
        let pos = self.read_pos;
        ensure!(pos != self.data.len(), EndedSnafu { wanted: 1_usize, available: 0_usize });

        trace!("read 1 byte - hex: {}", hex::encode(&self.data[pos..pos + 1]));
        self.read_pos += 1;
        Ok(self.data[pos])
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], StreamError> {
        let available = self.data.len() - self.read_pos;
        ensure!(n <= available, EndedSnafu { wanted: n, available });

        let result = &self.data[self.read_pos..self.read_pos + n];
        trace!("read {n} bytes - hex: {}", hex::encode(result));
        self.read_pos += n;
        Ok(result)
    }

    pub fn read_var_u32(&mut self) -> Result<u32, StreamError> {
        let mut offset = 0;
        let mut result = 0;
        loop {
            let byte = self.read_byte()?;
            ensure!(offset < 32, InvalidVarIntSnafu);
            // the 5th byte may only carry the 4 remaining value bits
            if offset == 28 {
                ensure!(byte >> 4 == 0, InvalidVarIntSnafu);
            }
            result |= (byte as u32 & 0x7F) << offset;
            offset += 7;
            if (byte & 0x80) == 0 { break; }
        }
        Ok(result)
    }

    pub fn read_var_i32(&mut self) -> Result<i32, StreamError> {
        let n = self.read_var_u32()?;
        Ok(match n & 1 {
            0 => n >> 1,
            _ => ((!n) >> 1) | 0x8000_0000,
        } as i32)
    }
}

impl StreamWriter for ByteStream {
    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        self.data.push(byte);
        Ok(())
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}


/// Stream that only measures the size of the output without producing it.
#[derive(Default, Debug, Copy, Clone)]
pub struct SizeStream {
    size: usize,
}

impl SizeStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl StreamWriter for SizeStream {
    #[inline]
    fn write_byte(&mut self, _byte: u8) -> Result<(), StreamError> {
        self.size += 1;
        Ok(())
    }

    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.size += bytes.len();
        Ok(())
    }
}


/// Stream writing into a caller-provided buffer of fixed capacity.
pub struct FixedBufStream<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> FixedBufStream<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Return the part of the buffer that has been written so far.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl StreamWriter for FixedBufStream<'_> {
    #[inline]
    fn write_byte(&mut self, byte: u8) -> Result<(), StreamError> {
        let available = self.buf.len() - self.pos;
        ensure!(available >= 1, OverflowSnafu { wanted: 1_usize, available });
        self.buf[self.pos] = byte;
        self.pos += 1;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let available = self.buf.len() - self.pos;
        ensure!(bytes.len() <= available, OverflowSnafu { wanted: bytes.len(), available });
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrip() {
        let values = [0_u32, 1, 127, 128, 0xFF, 0x3FFF, 0x4000, u32::MAX];
        for v in values {
            let mut ds = ByteStream::new();
            ds.write_var_u32(v).unwrap();
            assert_eq!(ds.read_var_u32().unwrap(), v);
        }
    }

    #[test]
    fn overlong_varint() {
        // 6 continuation bytes
        let mut ds = ByteStream::from(vec![0x80, 0x80, 0x80, 0x80, 0x80, 0x80]);
        assert!(ds.read_var_u32().is_err());

        // 5th byte carries bits beyond the 4 low ones
        let mut ds = ByteStream::from(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x10]);
        assert!(ds.read_var_u32().is_err());

        let mut ds = ByteStream::from(vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
        assert_eq!(ds.read_var_u32().unwrap(), u32::MAX);
    }

    #[test]
    fn fixed_buf_overflow() {
        let mut buf = [0_u8; 4];
        let mut ds = FixedBufStream::new(&mut buf);
        ds.write_bytes(b"abc").unwrap();
        assert!(ds.write_bytes(b"de").is_err());
        assert_eq!(ds.written(), b"abc");
    }
}
