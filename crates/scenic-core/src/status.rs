use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("Out of bounds: {len} bytes at offset {offset} exceed buffer of {size} bytes")]
    OutOfBounds { offset: usize, len: usize, size: usize },
}

pub type BufferResult<T> = Result<T, BufferError>;

/// Consistency failures reported by `Scene::validate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("{kind} index {index} out of range ({len} available)")]
    DanglingIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Attribute {semantic} of mesh {mesh}: {source}")]
    AttributeRange {
        mesh: usize,
        semantic: String,
        source: BufferError,
    },
}
