//! GLB container decoder.
//!
//! A GLB file is a 12-byte header followed by a JSON chunk and an optional
//! binary chunk. Decoding yields a [`GlbDocument`]: the parsed JSON value
//! tree plus the binary chunk, which accessors and buffer views address by
//! byte range.
//!
//! JSON fields are read through [`FieldAccess`], which turns absent fields
//! into `LoadError::MissingField` instead of panicking or defaulting.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use scenic_core::ByteCursor;

use crate::error::{LoadError, Result};

pub const GLB_MAGIC: u32 = 0x46546C67; // "glTF" in little-endian
pub const GLB_VERSION: u32 = 2;
pub const GLB_CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
pub const GLB_CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Fallible navigation over JSON values.
pub trait FieldAccess {
    /// Object member `name`, or `MissingField`.
    fn field(&self, name: &str) -> Result<&Value>;

    /// Array element `index`.
    fn element(&self, index: usize) -> Result<&Value>;

    /// Object member `name` as a non-negative integer.
    fn index_field(&self, name: &str) -> Result<usize>;
}

impl FieldAccess for Value {
    fn field(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| LoadError::MissingField(name.to_string()))
    }

    fn element(&self, index: usize) -> Result<&Value> {
        let items = self
            .as_array()
            .ok_or_else(|| LoadError::MalformedContainer(format!("expected an array, found {}", self)))?;
        items.get(index).ok_or(LoadError::InvalidIndex {
            kind: "array element",
            index: index as i64,
            len: items.len(),
        })
    }

    fn index_field(&self, name: &str) -> Result<usize> {
        let value = self.field(name)?;
        value
            .as_u64()
            .map(|v| v as usize)
            .ok_or_else(|| LoadError::MalformedContainer(format!("{} must be a non-negative integer", name)))
    }
}

/// Decoded GLB container.
#[derive(Debug, Clone, PartialEq)]
pub struct GlbDocument {
    pub version: u32,
    pub json: Value,
    /// Binary chunk, absent for JSON-only containers.
    pub blob: Option<Vec<u8>>,
}

impl GlbDocument {
    /// Top-level JSON member `name`.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.json.field(name)
    }

    /// Deserializes the top-level array `name`; absent means empty.
    pub fn array<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        match self.json.get(name) {
            Some(value) => Ok(Vec::<T>::deserialize(value)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Decodes a GLB container held in memory.
pub fn decode(data: &[u8]) -> Result<GlbDocument> {
    let cursor = ByteCursor::new(data);
    if data.len() < GLB_HEADER_LEN {
        return Err(LoadError::InvalidHeader("File too small for GLB header".into()));
    }

    let magic = cursor.read_u32_le(0)?;
    if magic != GLB_MAGIC {
        return Err(LoadError::InvalidHeader("Invalid GLB magic".into()));
    }
    let version = cursor.read_u32_le(4)?;
    if version != GLB_VERSION {
        return Err(LoadError::UnsupportedVersion(version));
    }
    let length = cursor.read_u32_le(8)? as usize;
    if length > data.len() {
        return Err(LoadError::MalformedContainer(format!(
            "declared length {} exceeds file size {}",
            length,
            data.len()
        )));
    }

    let mut index = GLB_HEADER_LEN;
    if cursor.read_u32_le(index + 4)? != GLB_CHUNK_JSON {
        return Err(LoadError::MalformedContainer("First chunk is not JSON".into()));
    }
    let json_len = cursor.read_u32_le(index)? as usize;
    let json: Value = serde_json::from_slice(cursor.slice(index + CHUNK_HEADER_LEN, json_len)?)?;
    index += CHUNK_HEADER_LEN + json_len;

    if index > length {
        return Err(LoadError::MalformedContainer("JSON chunk extends past declared length".into()));
    }
    if index == length {
        return Ok(GlbDocument { version, json, blob: None });
    }

    // Padding between chunks is skipped, not read.
    index = (index + 3) & !3;
    if index + CHUNK_HEADER_LEN > length {
        log::warn!("GLB has trailing bytes but no second chunk header");
        return Ok(GlbDocument { version, json, blob: None });
    }
    let chunk_type = cursor.read_u32_le(index + 4)?;
    if chunk_type != GLB_CHUNK_BIN {
        log::warn!("Unknown GLB chunk type {:#010x}, ignoring", chunk_type);
        return Ok(GlbDocument { version, json, blob: None });
    }
    let bin_len = cursor.read_u32_le(index)? as usize;
    let blob = cursor.slice(index + CHUNK_HEADER_LEN, bin_len)?.to_vec();
    log::debug!("GLB: {} JSON bytes, {} binary bytes", json_len, bin_len);

    Ok(GlbDocument {
        version,
        json,
        blob: Some(blob),
    })
}
