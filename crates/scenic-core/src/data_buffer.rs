use byteorder::{ByteOrder, LittleEndian};

use crate::status::BufferResult;

/// The single contiguous byte buffer backing every attribute of a scene.
///
/// Built once (either appended to through [`BlobBuilder`] or adopted whole
/// from a container's binary chunk) and immutable afterwards.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BinaryBlob {
    data: Vec<u8>,
}

impl BinaryBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts an existing byte buffer as the blob.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrows `len` bytes at `offset`.
    pub fn range(&self, offset: usize, len: usize) -> BufferResult<&[u8]> {
        crate::byte_cursor::ByteCursor::new(&self.data).slice(offset, len)
    }
}

/// Appends typed data to a growing blob, keeping every range 4-byte aligned.
#[derive(Debug, Default)]
pub struct BlobBuilder {
    data: Vec<u8>,
}

impl BlobBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends little-endian `f32` values and returns `(byte_offset, byte_length)`.
    pub fn push_f32s(&mut self, values: &[f32]) -> (usize, usize) {
        self.align();
        let offset = self.data.len();
        let byte_length = values.len() * 4;
        self.data.resize(offset + byte_length, 0);
        LittleEndian::write_f32_into(values, &mut self.data[offset..]);
        (offset, byte_length)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn finish(self) -> BinaryBlob {
        BinaryBlob::from_bytes(self.data)
    }

    fn align(&mut self) {
        let padded = (self.data.len() + 3) & !3;
        self.data.resize(padded, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_read_back() {
        let mut builder = BlobBuilder::new();
        let (pos_offset, pos_len) = builder.push_f32s(&[1.0, 2.0, 3.0]);
        let (uv_offset, uv_len) = builder.push_f32s(&[7.0, 8.0]);
        assert_eq!((pos_offset, pos_len), (0, 12));
        assert_eq!((uv_offset, uv_len), (12, 8));

        let blob = builder.finish();
        let bytes = blob.range(uv_offset, uv_len).unwrap();
        assert_eq!(LittleEndian::read_f32(&bytes[4..]), 8.0);
        assert_eq!(LittleEndian::read_f32(&blob.data()[4..8]), 2.0);
    }

    #[test]
    fn test_ranges_are_aligned() {
        let mut builder = BlobBuilder::new();
        builder.data.push(0xAA);
        let (offset, _) = builder.push_f32s(&[0.5]);
        assert_eq!(offset, 4);
    }

    #[test]
    fn test_blob_range_bounds() {
        let blob = BinaryBlob::from_bytes(vec![0; 8]);
        assert!(blob.range(4, 4).is_ok());
        assert!(blob.range(5, 4).is_err());
    }
}
