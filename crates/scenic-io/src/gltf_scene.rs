//! GLB document to scene normalization.
//!
//! The node graph of the active scene is flattened breadth-first into a
//! single list (children refer to flat indices), every node's matrix is
//! composed with its ancestors', accessors become typed [`Attribute`]
//! ranges over the binary chunk, and only meshes some node references are
//! kept, renumbered densely.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use scenic_core::data_types::components_per_entry;
use scenic_core::math_utils::from_scale_rotation_translation;
use scenic_core::scene::DEFAULT_BASE_COLOR;
use scenic_core::{
    Attribute, BinaryBlob, ComponentType, Mat4, Material, Mesh, Node, Primitive, Sampler, Scene, Semantic,
};

use crate::error::{check_index, LoadError, Result};
use crate::gltf_reader::{self, FieldAccess, GlbDocument};
use crate::hierarchy::propagate_transforms;
use crate::loader::LoadOptions;
use crate::texture::load_texture;
use crate::traits::SceneFormat;

// ============================================================================
// glTF JSON Schema
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfScene {
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfNode {
    name: Option<String>,
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfMesh {
    name: Option<String>,
    #[serde(default)]
    primitives: Vec<GltfPrimitive>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfPrimitive {
    #[serde(default)]
    attributes: BTreeMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Accessor {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    accessor_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferView {
    #[serde(default)]
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfMaterial {
    name: Option<String>,
    pbr_metallic_roughness: Option<PbrMetallicRoughness>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PbrMetallicRoughness {
    base_color_factor: Option<[f32; 4]>,
    base_color_texture: Option<TextureInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextureInfo {
    index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfTexture {
    name: Option<String>,
    source: Option<usize>,
    sampler: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfImage {
    name: Option<String>,
    buffer_view: Option<usize>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GltfSampler {
    min_filter: Option<u32>,
    mag_filter: Option<u32>,
}

// ============================================================================
// Normalizer
// ============================================================================

/// Binary glTF container.
pub struct GlbFormat;

impl SceneFormat for GlbFormat {
    type Document = GlbDocument;

    fn decode(bytes: &[u8]) -> Result<GlbDocument> {
        gltf_reader::decode(bytes)
    }

    fn build(document: &GlbDocument, options: &LoadOptions) -> Result<Scene> {
        build_scene(document, options)
    }
}

/// Byte ranges of the binary chunk, resolved through buffer views.
struct BufferViews<'a> {
    views: Vec<BufferView>,
    blob: Option<&'a [u8]>,
}

impl<'a> BufferViews<'a> {
    /// Offset, length and stride of view `index` inside the binary chunk.
    fn resolve(&self, index: usize) -> Result<(&BufferView, &'a [u8])> {
        let view = &self.views[check_index("bufferView", index as i64, self.views.len())?];
        let blob = match self.blob {
            Some(blob) if view.buffer == 0 => blob,
            _ => {
                return Err(LoadError::UnsupportedBufferSource(format!(
                    "bufferView {} is not backed by the embedded binary chunk",
                    index
                )))
            }
        };
        let bytes = scenic_core::ByteCursor::new(blob).slice(view.byte_offset, view.byte_length)?;
        Ok((view, bytes))
    }
}

/// Converts a decoded GLB document into a scene.
pub fn build_scene(document: &GlbDocument, options: &LoadOptions) -> Result<Scene> {
    let source_nodes: Vec<GltfNode> = document.array("nodes")?;
    let source_meshes: Vec<GltfMesh> = document.array("meshes")?;
    let accessors: Vec<Accessor> = document.array("accessors")?;
    let views = BufferViews {
        views: document.array("bufferViews")?,
        blob: document.blob.as_deref(),
    };

    let mut nodes = flatten_nodes(document, &source_nodes)?;

    // Keep referenced meshes only, in their original order.
    let mut used = BTreeSet::new();
    for node in &nodes {
        if let Some(mesh) = node.mesh {
            used.insert(check_index("mesh", mesh as i64, source_meshes.len())?);
        }
    }
    let remap: BTreeMap<usize, usize> = used.iter().enumerate().map(|(new, &old)| (old, new)).collect();
    for node in &mut nodes {
        node.mesh = node.mesh.and_then(|old| remap.get(&old).copied());
    }

    let materials = build_materials(document)?;
    let mut meshes = Vec::with_capacity(used.len());
    for &index in &used {
        let source = &source_meshes[index];
        let name = source.name.clone().unwrap_or_else(|| format!("Mesh{}", index));
        let primitives = source
            .primitives
            .iter()
            .map(|primitive| build_primitive(primitive, &name, &accessors, &views, materials.len()))
            .collect::<Result<Vec<_>>>()?;
        let mut mesh = Mesh::new(name);
        for primitive in primitives {
            mesh.add_primitive(primitive);
        }
        meshes.push(mesh);
    }
    if used.len() < source_meshes.len() {
        log::debug!("Dropped {} unreferenced meshes", source_meshes.len() - used.len());
    }

    let textures = build_textures(document, &views, options)?;
    for material in &materials {
        if let scenic_core::MaterialKind::Texture(texture) = material.kind {
            check_index("texture", texture as i64, textures.len())?;
        }
    }

    propagate_transforms(&mut nodes);

    Ok(Scene {
        nodes,
        meshes,
        materials,
        textures,
        blob: BinaryBlob::from_bytes(document.blob.clone().unwrap_or_default()),
    })
}

/// Local matrix: explicit `matrix`, or scale, rotation and translation.
fn node_matrix(node: &GltfNode) -> Mat4 {
    match node.matrix {
        Some(matrix) => matrix,
        None => from_scale_rotation_translation(
            node.scale.unwrap_or([1.0; 3]),
            node.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]),
            node.translation.unwrap_or([0.0; 3]),
        ),
    }
}

fn convert_node(source: &GltfNode, index: usize, children: Vec<usize>) -> Node {
    let mut node = Node::new(source.name.clone().unwrap_or_else(|| format!("Node{}", index)));
    node.matrix = node_matrix(source);
    node.mesh = source.mesh;
    node.children = (!children.is_empty()).then_some(children);
    node
}

/// Flattens the active scene's node graph breadth-first. Without any
/// scenes the document's node list is used as is.
fn flatten_nodes(document: &GlbDocument, source: &[GltfNode]) -> Result<Vec<Node>> {
    let scenes: Vec<GltfScene> = document.array("scenes")?;
    if scenes.is_empty() {
        if document.json.get("nodes").is_none() {
            return Err(LoadError::MissingField("nodes".into()));
        }
        return source
            .iter()
            .enumerate()
            .map(|(index, node)| {
                for &child in &node.children {
                    check_index("node", child as i64, source.len())?;
                }
                Ok(convert_node(node, index, node.children.clone()))
            })
            .collect();
    }

    let active = match document.json.get("scene") {
        Some(_) => document.json.index_field("scene")?,
        None => 0,
    };
    let scene = &scenes[check_index("scene", active as i64, scenes.len())?];

    // order[flat] is the source index of each flat node.
    let mut order: Vec<usize> = scene.nodes.clone();
    let mut visited = vec![false; source.len()];
    let mut nodes = Vec::with_capacity(order.len());
    let mut flat = 0;
    while flat < order.len() {
        let index = check_index("node", order[flat] as i64, source.len())?;
        if std::mem::replace(&mut visited[index], true) {
            return Err(LoadError::MalformedContainer(format!(
                "node {} is reachable more than once",
                index
            )));
        }
        let node = &source[index];
        let children = node
            .children
            .iter()
            .map(|&child| {
                order.push(child);
                order.len() - 1
            })
            .collect();
        nodes.push(convert_node(node, index, children));
        flat += 1;
    }
    log::debug!("Flattened {} of {} nodes from scene {}", nodes.len(), source.len(), active);
    Ok(nodes)
}

/// Resolves one accessor into an attribute over the binary chunk.
fn resolve_accessor(index: usize, accessors: &[Accessor], views: &BufferViews<'_>) -> Result<Attribute> {
    let accessor = &accessors[check_index("accessor", index as i64, accessors.len())?];
    let component_type = ComponentType::from_code(accessor.component_type).ok_or_else(|| {
        LoadError::MalformedContainer(format!(
            "accessor {} has unsupported componentType {}",
            index, accessor.component_type
        ))
    })?;
    let components = components_per_entry(&accessor.accessor_type).ok_or_else(|| {
        LoadError::MalformedContainer(format!(
            "accessor {} has unsupported type {}",
            index, accessor.accessor_type
        ))
    })?;
    let view_index = accessor
        .buffer_view
        .ok_or_else(|| LoadError::UnsupportedBufferSource(format!("accessor {} has no bufferView", index)))?;
    let (view, bytes) = views.resolve(view_index)?;

    let byte_length = bytes.len().checked_sub(accessor.byte_offset).ok_or_else(|| {
        LoadError::MalformedContainer(format!("accessor {} starts past its bufferView", index))
    })?;
    let attribute = Attribute {
        component_type,
        components_per_entry: components,
        entry_count: accessor.count,
        byte_offset: view.byte_offset + accessor.byte_offset,
        byte_length,
        byte_stride: view.byte_stride,
    };
    let required = attribute.required_length().ok_or_else(|| {
        LoadError::MalformedContainer(format!("accessor {} count {} overflows", index, accessor.count))
    })?;
    if required > byte_length {
        return Err(LoadError::MalformedContainer(format!(
            "accessor {} needs {} bytes, bufferView holds {}",
            index, required, byte_length
        )));
    }
    Ok(attribute)
}

fn build_primitive(
    source: &GltfPrimitive,
    mesh_name: &str,
    accessors: &[Accessor],
    views: &BufferViews<'_>,
    material_count: usize,
) -> Result<Primitive> {
    let mut primitive = Primitive::new();
    for (name, &accessor) in &source.attributes {
        primitive.set_attribute(Semantic::from_name(name), resolve_accessor(accessor, accessors, views)?);
    }
    if !primitive.has_required_attributes() {
        return Err(LoadError::IncompleteMesh {
            mesh: mesh_name.to_string(),
            reason: "primitives need POSITION, NORMAL and TEXCOORD_0".into(),
        });
    }

    match source.indices {
        Some(indices) => {
            let attribute = resolve_accessor(indices, accessors, views)?;
            primitive.vertices = attribute.entry_count;
            primitive.indexed = true;
            primitive.set_attribute(Semantic::Indices, attribute);
        }
        None => {
            primitive.vertices = primitive
                .attribute(&Semantic::Position)
                .map_or(0, |position| position.entry_count);
            primitive.indexed = false;
        }
    }

    primitive.material = source
        .material
        .map(|m| check_index("material", m as i64, material_count))
        .transpose()?;
    Ok(primitive)
}

fn build_materials(document: &GlbDocument) -> Result<Vec<Material>> {
    let materials: Vec<GltfMaterial> = document.array("materials")?;
    Ok(materials
        .into_iter()
        .enumerate()
        .map(|(index, material)| {
            let name = material.name.unwrap_or_else(|| format!("Material{}", index));
            let pbr = material.pbr_metallic_roughness;
            match pbr {
                Some(PbrMetallicRoughness {
                    base_color_texture: Some(info),
                    ..
                }) => Material::texture(name, info.index),
                Some(PbrMetallicRoughness {
                    base_color_factor: Some(color),
                    ..
                }) => Material::color(name, color),
                _ => Material::color(name, DEFAULT_BASE_COLOR),
            }
        })
        .collect())
}

fn build_textures(
    document: &GlbDocument,
    views: &BufferViews<'_>,
    options: &LoadOptions,
) -> Result<Vec<scenic_core::Texture>> {
    let textures: Vec<GltfTexture> = document.array("textures")?;
    let images: Vec<GltfImage> = document.array("images")?;
    let samplers: Vec<GltfSampler> = document.array("samplers")?;

    textures
        .iter()
        .enumerate()
        .map(|(index, texture)| {
            let source = texture
                .source
                .ok_or_else(|| LoadError::MissingField(format!("textures[{}].source", index)))?;
            let image = &images[check_index("image", source as i64, images.len())?];
            let view = image.buffer_view.ok_or_else(|| {
                LoadError::UnsupportedBufferSource(format!("image {} is not stored in a bufferView", source))
            })?;
            let (_, bytes) = views.resolve(view)?;

            let sampler = texture
                .sampler
                .map(|s| check_index("sampler", s as i64, samplers.len()))
                .transpose()?
                .map(|s| Sampler {
                    min_filter: samplers[s].min_filter,
                    mag_filter: samplers[s].mag_filter,
                });
            let name = texture
                .name
                .clone()
                .or_else(|| image.name.clone())
                .unwrap_or_else(|| format!("Texture{}", index));
            load_texture(&name, bytes.to_vec(), image.mime_type.as_deref(), sampler, options)
        })
        .collect()
}
