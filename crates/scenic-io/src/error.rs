use std::io;

use scenic_core::BufferError;
use thiserror::Error;

/// Every way a load can fail. The first error aborts the whole load.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),

    #[error("Malformed record at offset {offset}: {reason}")]
    MalformedRecord { offset: usize, reason: String },

    #[error("Malformed property at offset {offset}: {reason}")]
    MalformedProperty { offset: usize, reason: String },

    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    #[error("Unsupported topology in {mesh}: {reason}")]
    UnsupportedTopology { mesh: String, reason: String },

    #[error("Unsupported buffer source: {0}")]
    UnsupportedBufferSource(String),

    #[error("Incomplete mesh {mesh}: {reason}")]
    IncompleteMesh { mesh: String, reason: String },

    #[error("Parse error on line {line}: {text:?}")]
    Parse { line: usize, text: String },

    #[error("Invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("{kind} index {index} out of range ({len} available)")]
    InvalidIndex {
        kind: &'static str,
        index: i64,
        len: usize,
    },

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Checks `index` against a table of `len` entries.
pub(crate) fn check_index(kind: &'static str, index: i64, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(LoadError::InvalidIndex { kind, index, len })
}
