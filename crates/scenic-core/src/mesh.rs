use std::collections::BTreeMap;

use crate::geometry_attribute::{Attribute, Semantic};

/// One drawable piece of a mesh: a single attribute set and material.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Primitive {
    pub attributes: BTreeMap<Semantic, Attribute>,
    /// Number of vertices to draw (index count when indexed).
    pub vertices: usize,
    pub indexed: bool,
    pub material: Option<usize>,
}

impl Primitive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute(&self, semantic: &Semantic) -> Option<&Attribute> {
        self.attributes.get(semantic)
    }

    pub fn set_attribute(&mut self, semantic: Semantic, attribute: Attribute) {
        self.attributes.insert(semantic, attribute);
    }

    /// True when position, normal and the first texture coordinate set are
    /// all present.
    pub fn has_required_attributes(&self) -> bool {
        [Semantic::Position, Semantic::Normal, Semantic::TexCoord0]
            .iter()
            .all(|s| self.attributes.contains_key(s))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitives: Vec::new(),
        }
    }

    pub fn add_primitive(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }
}
