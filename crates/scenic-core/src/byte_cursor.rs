use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::status::{BufferError, BufferResult};

/// Read-only view over a byte buffer with bounds-checked scalar reads.
///
/// Unlike a stream, a `ByteCursor` has no position: every read names its
/// absolute offset. This matches how interchange formats address their
/// records (end offsets, chunk offsets) and keeps the cursor `Copy`.
///
/// # Example
///
/// ```
/// use scenic_core::ByteCursor;
///
/// let data = [0x67, 0x6C, 0x54, 0x46, 0x02, 0x00, 0x00, 0x00];
/// let cursor = ByteCursor::new(&data);
///
/// assert_eq!(cursor.read_u32_le(0).unwrap(), 0x4654_6C67);
/// assert_eq!(cursor.read_u32_le(4).unwrap(), 2);
/// assert!(cursor.read_u32_le(6).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Total size of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the whole underlying buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `BufferError::OutOfBounds` if the range exceeds the buffer.
    pub fn slice(&self, offset: usize, len: usize) -> BufferResult<&'a [u8]> {
        let end = offset.checked_add(len).ok_or(BufferError::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        })?;
        if end > self.data.len() {
            return Err(BufferError::OutOfBounds {
                offset,
                len,
                size: self.data.len(),
            });
        }
        Ok(&self.data[offset..end])
    }

    /// True when `len` bytes at `offset` are all zero.
    ///
    /// A range that does not fit in the buffer is reported as zero: there is
    /// no data there to interpret.
    pub fn is_zero_block(&self, offset: usize, len: usize) -> bool {
        match self.slice(offset, len) {
            Ok(bytes) => bytes.iter().all(|&b| b == 0),
            Err(_) => true,
        }
    }

    pub fn read_u8(&self, offset: usize) -> BufferResult<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_u16_le(&self, offset: usize) -> BufferResult<u16> {
        Ok(LittleEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn read_i16_le(&self, offset: usize) -> BufferResult<i16> {
        Ok(LittleEndian::read_i16(self.slice(offset, 2)?))
    }

    pub fn read_u32_le(&self, offset: usize) -> BufferResult<u32> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }

    pub fn read_i32_le(&self, offset: usize) -> BufferResult<i32> {
        Ok(LittleEndian::read_i32(self.slice(offset, 4)?))
    }

    pub fn read_i64_le(&self, offset: usize) -> BufferResult<i64> {
        Ok(LittleEndian::read_i64(self.slice(offset, 8)?))
    }

    pub fn read_f32_le(&self, offset: usize) -> BufferResult<f32> {
        Ok(LittleEndian::read_f32(self.slice(offset, 4)?))
    }

    pub fn read_f64_le(&self, offset: usize) -> BufferResult<f64> {
        Ok(LittleEndian::read_f64(self.slice(offset, 8)?))
    }

    pub fn read_u16_be(&self, offset: usize) -> BufferResult<u16> {
        Ok(BigEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn read_u32_be(&self, offset: usize) -> BufferResult<u32> {
        Ok(BigEndian::read_u32(self.slice(offset, 4)?))
    }
}
