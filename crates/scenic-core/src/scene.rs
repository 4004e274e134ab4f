//! Render-ready scene representation.
//!
//! A [`Scene`] is built once per loaded file and never mutated afterwards.
//! Nodes form a flat list whose `children` entries index back into that
//! list; every [`Attribute`] addresses a byte range of the single
//! [`BinaryBlob`] the scene owns.

use crate::data_buffer::BinaryBlob;
use crate::geometry_attribute::Attribute;
use crate::math_utils::{Mat4, IDENTITY};
use crate::mesh::Mesh;
use crate::status::{BufferError, BufferResult, SceneError};

/// Base color used when a material supplies neither a texture nor a color.
pub const DEFAULT_BASE_COLOR: [f32; 4] = [0.9, 0.9, 0.8, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    /// Column-major transform; after loading it already includes every
    /// ancestor's transform.
    pub matrix: Mat4,
    pub mesh: Option<usize>,
    pub children: Option<Vec<usize>>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            matrix: IDENTITY,
            mesh: None,
            children: None,
        }
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_matrix(mut self, matrix: Mat4) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn add_child(&mut self, child: usize) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    /// RGBA base color, components in `0.0..=1.0`.
    Color([f32; 4]),
    /// Index into `Scene::textures`.
    Texture(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
}

impl Material {
    pub fn color(name: impl Into<String>, rgba: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Color(rgba),
        }
    }

    pub fn texture(name: impl Into<String>, texture: usize) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Texture(texture),
        }
    }
}

/// Filtering hints carried over from the source file (OpenGL enum values).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sampler {
    pub min_filter: Option<u32>,
    pub mag_filter: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureImage {
    /// Decoded 8-bit RGBA pixels, row-major, top row first.
    Decoded { width: u32, height: u32, rgba: Vec<u8> },
    /// Encoded image bytes kept as-is because decoding was disabled.
    Undecoded {
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub image: TextureImage,
    pub sampler: Option<Sampler>,
}

impl Texture {
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.image {
            TextureImage::Decoded { width, height, .. } => Some((*width, *height)),
            TextureImage::Undecoded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub blob: BinaryBlob,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows the bytes an attribute describes.
    pub fn attribute_bytes(&self, attribute: &Attribute) -> BufferResult<&[u8]> {
        self.blob.range(attribute.byte_offset, attribute.byte_length)
    }

    /// Checks that every index is in range and every attribute lies inside
    /// the blob.
    pub fn validate(&self) -> Result<(), SceneError> {
        for node in &self.nodes {
            if let Some(mesh) = node.mesh {
                check_index("mesh", mesh, self.meshes.len())?;
            }
            for &child in node.children.iter().flatten() {
                check_index("node", child, self.nodes.len())?;
            }
        }

        for (mesh_index, mesh) in self.meshes.iter().enumerate() {
            for primitive in &mesh.primitives {
                if let Some(material) = primitive.material {
                    check_index("material", material, self.materials.len())?;
                }
                for (semantic, attribute) in &primitive.attributes {
                    let range_error = |source: BufferError| SceneError::AttributeRange {
                        mesh: mesh_index,
                        semantic: semantic.to_string(),
                        source,
                    };
                    let required = attribute.required_length().ok_or_else(|| {
                        range_error(BufferError::OutOfBounds {
                            offset: attribute.byte_offset,
                            len: usize::MAX,
                            size: self.blob.len(),
                        })
                    })?;
                    let len = attribute.byte_length.max(required);
                    self.blob.range(attribute.byte_offset, len).map_err(range_error)?;
                }
            }
        }

        for material in &self.materials {
            if let MaterialKind::Texture(texture) = material.kind {
                check_index("texture", texture, self.textures.len())?;
            }
        }
        Ok(())
    }
}

fn check_index(kind: &'static str, index: usize, len: usize) -> Result<(), SceneError> {
    if index < len {
        Ok(())
    } else {
        Err(SceneError::DanglingIndex { kind, index, len })
    }
}
