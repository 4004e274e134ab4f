//! Extension-based format selection and the load entry points.
//!
//! ```ignore
//! use scenic_io::loader::{load_scene, LoadOptions};
//!
//! let scene = load_scene("model.glb", &LoadOptions::default())?;
//! println!("{} nodes, {} meshes", scene.nodes.len(), scene.meshes.len());
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use scenic_core::Scene;

use crate::error::{LoadError, Result};
use crate::fbx_scene::FbxFormat;
use crate::gltf_scene::GlbFormat;
use crate::material::MaterialAssignment;
use crate::obj_scene::ObjFormat;
use crate::traits::SceneFormat;

/// Per-load settings.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    decode_textures: bool,
    material_assignment: Option<MaterialAssignment>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            decode_textures: true,
            material_assignment: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode embedded images to RGBA pixels (default: true). When disabled
    /// textures keep their encoded bytes.
    pub fn with_texture_decoding(mut self, decode: bool) -> Self {
        self.decode_textures = decode;
        self
    }

    /// Materials for formats that carry none.
    pub fn with_material_assignment(mut self, assignment: MaterialAssignment) -> Self {
        self.material_assignment = Some(assignment);
        self
    }

    pub fn decode_textures(&self) -> bool {
        self.decode_textures
    }

    pub fn material_assignment(&self) -> Option<&MaterialAssignment> {
        self.material_assignment.as_ref()
    }
}

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Binary FBX.
    Fbx,
    /// Binary glTF container.
    Glb,
    /// Wavefront OBJ text.
    Obj,
}

impl SourceFormat {
    /// Maps a file extension, ignoring case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "fbx" => Some(SourceFormat::Fbx),
            "glb" => Some(SourceFormat::Glb),
            "obj" => Some(SourceFormat::Obj),
            _ => None,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| LoadError::UnsupportedFormat(path.display().to_string()))
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Fbx => "FBX",
            SourceFormat::Glb => "GLB",
            SourceFormat::Obj => "OBJ",
        })
    }
}

/// Loads a scene file, choosing the decoder from its extension.
pub fn load_scene<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Scene> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;
    let bytes = fs::read(path)?;
    log::info!("Loading {} ({} bytes) as {}", path.display(), bytes.len(), format);
    load_scene_from_bytes(format, &bytes, options)
}

/// Loads a scene already held in memory.
pub fn load_scene_from_bytes(format: SourceFormat, bytes: &[u8], options: &LoadOptions) -> Result<Scene> {
    let scene = match format {
        SourceFormat::Fbx => FbxFormat::load(bytes, options)?,
        SourceFormat::Glb => GlbFormat::load(bytes, options)?,
        SourceFormat::Obj => ObjFormat::load(bytes, options)?,
    };
    log::info!(
        "{} scene: {} nodes, {} meshes, {} materials, {} textures, {} blob bytes",
        format,
        scene.nodes.len(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.textures.len(),
        scene.blob.len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_sniffing() {
        assert_eq!(SourceFormat::from_path("a/b/model.FBX").unwrap(), SourceFormat::Fbx);
        assert_eq!(SourceFormat::from_path("scene.glb").unwrap(), SourceFormat::Glb);
        assert_eq!(SourceFormat::from_path("mesh.Obj").unwrap(), SourceFormat::Obj);
        assert!(matches!(
            SourceFormat::from_path("scene.gltf"),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(SourceFormat::from_path("noext").is_err());
    }

    #[test]
    fn test_options_builder() {
        let options = LoadOptions::new();
        assert!(options.decode_textures());
        assert!(options.material_assignment().is_none());

        let options = options
            .with_texture_decoding(false)
            .with_material_assignment(MaterialAssignment::new());
        assert!(!options.decode_textures());
        assert!(options.material_assignment().is_some());
    }

    #[test]
    fn test_wrong_format_fails_inside_decoder() {
        let obj = b"v 0 0 0\n";
        assert!(matches!(
            load_scene_from_bytes(SourceFormat::Fbx, obj, &LoadOptions::default()),
            Err(LoadError::InvalidHeader(_))
        ));
    }
}
