//! Common trait for format implementations.
//!
//! Every supported format is a two-stage pipeline: `decode` turns raw bytes
//! into a format-specific document, `build` turns that document into the
//! shared [`Scene`]. Generic code can load any format through the trait:
//!
//! ```ignore
//! use scenic_io::{FbxFormat, LoadOptions, SceneFormat};
//!
//! fn load<F: SceneFormat>(path: &str) -> scenic_io::Result<Scene> {
//!     F::open(path, &LoadOptions::default())
//! }
//!
//! let scene = load::<FbxFormat>("cube.fbx")?;
//! ```

use std::fs;
use std::path::Path;

use scenic_core::Scene;

use crate::error::Result;
use crate::loader::LoadOptions;

/// A scene interchange format.
pub trait SceneFormat {
    /// Intermediate representation produced by the decoder.
    type Document;

    /// Decode raw file bytes.
    fn decode(bytes: &[u8]) -> Result<Self::Document>;

    /// Build the scene representation from a decoded document.
    fn build(document: &Self::Document, options: &LoadOptions) -> Result<Scene>;

    /// Decode and build in one step.
    fn load(bytes: &[u8], options: &LoadOptions) -> Result<Scene> {
        let document = Self::decode(bytes)?;
        Self::build(&document, options)
    }

    /// Read a file from disk and load it.
    fn open<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Scene> {
        let bytes = fs::read(path)?;
        Self::load(&bytes, options)
    }
}
