//! OBJ document to scene conversion.
//!
//! Each sub-mesh becomes one mesh with a single non-indexed primitive and
//! one identity node. Corners are written to the blob as one interleaved
//! region per mesh: position, normal, uv (8 floats, 32 bytes per corner).
//!
//! Whether normals and UVs exist is decided once, from the first face of
//! the file. When the first face lacks them they are zero-filled for every
//! face, even faces that do reference them.

use scenic_core::{Attribute, BlobBuilder, Mesh, Node, Primitive, Scene, Semantic};

use crate::error::{check_index, Result};
use crate::loader::LoadOptions;
use crate::obj_reader::{self, ObjDocument, ObjObject};
use crate::traits::SceneFormat;

const FLOATS_PER_CORNER: usize = 8;
const CORNER_STRIDE: usize = FLOATS_PER_CORNER * 4;
const NORMAL_OFFSET: usize = 12;
const UV_OFFSET: usize = 24;

/// Wavefront OBJ text format.
pub struct ObjFormat;

impl SceneFormat for ObjFormat {
    type Document = ObjDocument;

    fn decode(bytes: &[u8]) -> Result<ObjDocument> {
        obj_reader::decode(bytes)
    }

    fn build(document: &ObjDocument, options: &LoadOptions) -> Result<Scene> {
        build_scene(document, options)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Presence {
    normals: bool,
    uvs: bool,
}

impl Presence {
    fn of(document: &ObjDocument) -> Self {
        match document.first_face() {
            Some(face) => Self {
                normals: face[0].normal.is_some(),
                uvs: face[0].uv.is_some(),
            },
            None => Self::default(),
        }
    }
}

/// Converts a decoded OBJ document into a scene.
pub fn build_scene(document: &ObjDocument, options: &LoadOptions) -> Result<Scene> {
    let presence = Presence::of(document);
    let mut scene = Scene::new();
    let mut blob = BlobBuilder::new();

    for (index, object) in document.objects.iter().enumerate() {
        let primitive = interleave(document, object, presence, &mut blob)?;
        let mut mesh = Mesh::new(object.name.clone());
        mesh.add_primitive(primitive);
        scene.meshes.push(mesh);
        scene.nodes.push(Node::new(object.name.clone()).with_mesh(index));
    }

    if let Some(assignment) = options.material_assignment() {
        let names: Vec<&str> = document.objects.iter().map(|o| o.name.as_str()).collect();
        let (materials, textures, per_mesh) = assignment.resolve(&names, options)?;
        for (mesh, material) in scene.meshes.iter_mut().zip(per_mesh) {
            for primitive in &mut mesh.primitives {
                primitive.material = material;
            }
        }
        scene.materials = materials;
        scene.textures = textures;
    }

    scene.blob = blob.finish();
    Ok(scene)
}

fn interleave(
    document: &ObjDocument,
    object: &ObjObject,
    presence: Presence,
    blob: &mut BlobBuilder,
) -> Result<Primitive> {
    let corners = object.faces.len() * 3;
    let mut data = Vec::with_capacity(corners * FLOATS_PER_CORNER);
    let mut disagreements = 0usize;

    for corner in object.faces.iter().flatten() {
        let position = document.positions[check_index("vertex", corner.position as i64, document.positions.len())?];
        data.extend_from_slice(&position);

        match corner.normal.filter(|_| presence.normals) {
            Some(n) => data.extend_from_slice(&document.normals[check_index("normal", n as i64, document.normals.len())?]),
            None => data.extend_from_slice(&[0.0; 3]),
        }
        match corner.uv.filter(|_| presence.uvs) {
            Some(t) => data.extend_from_slice(&document.uvs[check_index("uv", t as i64, document.uvs.len())?]),
            None => data.extend_from_slice(&[0.0; 2]),
        }

        if corner.normal.is_some() != presence.normals || corner.uv.is_some() != presence.uvs {
            disagreements += 1;
        }
    }
    if disagreements > 0 {
        log::warn!(
            "{}: {} corners disagree with the first face's attributes (normals: {}, uvs: {}); those values are zero-filled or ignored",
            object.name,
            disagreements,
            presence.normals,
            presence.uvs
        );
    }

    let (offset, len) = blob.push_f32s(&data);
    let mut primitive = Primitive::new();
    primitive.set_attribute(
        Semantic::Position,
        Attribute::float32(3, corners, offset, len).with_stride(CORNER_STRIDE),
    );
    primitive.set_attribute(
        Semantic::Normal,
        Attribute::float32(3, corners, offset + NORMAL_OFFSET, len.saturating_sub(NORMAL_OFFSET))
            .with_stride(CORNER_STRIDE),
    );
    primitive.set_attribute(
        Semantic::TexCoord0,
        Attribute::float32(2, corners, offset + UV_OFFSET, len.saturating_sub(UV_OFFSET)).with_stride(CORNER_STRIDE),
    );
    primitive.vertices = corners;
    primitive.indexed = false;
    Ok(primitive)
}
