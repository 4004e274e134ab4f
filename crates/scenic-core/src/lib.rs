//! Scenic Core Library
//!
//! Format-independent building blocks for scene ingestion: a bounds-checked
//! byte cursor, component data types, the shared binary blob, 4x4 matrix
//! helpers and the render-ready scene representation every decoder produces.

pub mod byte_cursor;
pub mod data_buffer;
pub mod data_types;
pub mod geometry_attribute;
pub mod math_utils;
pub mod mesh;
pub mod scene;
pub mod status;

pub use byte_cursor::ByteCursor;
pub use data_buffer::{BinaryBlob, BlobBuilder};
pub use data_types::ComponentType;
pub use geometry_attribute::{Attribute, Semantic};
pub use math_utils::Mat4;
pub use mesh::{Mesh, Primitive};
pub use scene::{Material, MaterialKind, Node, Sampler, Scene, Texture, TextureImage};
pub use status::{BufferError, BufferResult, SceneError};
