//! Caller-supplied materials for formats that carry none (OBJ).
//!
//! A [`MaterialAssignment`] is an ordered list of material definitions plus,
//! for each mesh, the index of the material it should use. Meshes can be
//! addressed by position (aligned with the decoded sub-mesh order) or by
//! name.
//!
//! ```
//! use scenic_io::material::{MaterialAssignment, MaterialDefinition};
//!
//! let mut assignment = MaterialAssignment::new();
//! let red = assignment.add_material(MaterialDefinition::from_hex("Red", "#ff0000").unwrap());
//! assignment.assign_named("Cube", red);
//! ```

use scenic_core::{Material, Texture};

use crate::error::{check_index, LoadError, Result};
use crate::loader::LoadOptions;
use crate::texture;

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialSource {
    /// RGBA, components in `0.0..=1.0`.
    Color([f32; 4]),
    /// Encoded image file bytes (PNG or JPEG).
    Image(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDefinition {
    pub name: String,
    pub source: MaterialSource,
}

impl MaterialDefinition {
    pub fn color(name: impl Into<String>, rgba: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            source: MaterialSource::Color(rgba),
        }
    }

    pub fn image(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: MaterialSource::Image(bytes),
        }
    }

    /// Opaque color from a `#RRGGBB` string.
    pub fn from_hex(name: impl Into<String>, hex: &str) -> Result<Self> {
        Ok(Self::color(name, parse_hex_color(hex)?))
    }
}

/// Parses `#RRGGBB` into RGBA with alpha 1.
pub fn parse_hex_color(hex: &str) -> Result<[f32; 4]> {
    let invalid = || LoadError::InvalidColor(hex.to_string());
    let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }

    let mut rgba = [1.0f32; 4];
    for (i, channel) in rgba.iter_mut().take(3).enumerate() {
        let byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        *channel = byte as f32 / 255.0;
    }
    Ok(rgba)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialAssignment {
    pub materials: Vec<MaterialDefinition>,
    /// Material per mesh, aligned with mesh order.
    pub assignments: Vec<Option<usize>>,
    /// Material per mesh name; takes precedence over `assignments`.
    pub named: Vec<(String, usize)>,
}

impl MaterialAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a material and returns its index.
    pub fn add_material(&mut self, material: MaterialDefinition) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Assigns a material to the mesh at `mesh` in decode order.
    pub fn assign(&mut self, mesh: usize, material: usize) {
        if self.assignments.len() <= mesh {
            self.assignments.resize(mesh + 1, None);
        }
        self.assignments[mesh] = Some(material);
    }

    pub fn assign_named(&mut self, mesh_name: impl Into<String>, material: usize) {
        self.named.push((mesh_name.into(), material));
    }

    fn material_for(&self, mesh: usize, mesh_name: &str) -> Option<usize> {
        self.named
            .iter()
            .find(|(name, _)| name == mesh_name)
            .map(|&(_, material)| material)
            .or_else(|| self.assignments.get(mesh).copied().flatten())
    }

    /// Turns the definitions into scene materials and textures and returns
    /// the material index for each of `mesh_names`.
    pub(crate) fn resolve(
        &self,
        mesh_names: &[&str],
        options: &LoadOptions,
    ) -> Result<(Vec<Material>, Vec<Texture>, Vec<Option<usize>>)> {
        let mut materials = Vec::with_capacity(self.materials.len());
        let mut textures = Vec::new();
        for definition in &self.materials {
            match &definition.source {
                MaterialSource::Color(rgba) => {
                    materials.push(Material::color(definition.name.clone(), *rgba));
                }
                MaterialSource::Image(bytes) => {
                    let texture = texture::load_texture(&definition.name, bytes.clone(), None, None, options)?;
                    textures.push(texture);
                    materials.push(Material::texture(definition.name.clone(), textures.len() - 1));
                }
            }
        }

        let per_mesh = mesh_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.material_for(i, name)
                    .map(|m| check_index("material", m as i64, materials.len()))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((materials, textures, per_mesh))
    }
}
