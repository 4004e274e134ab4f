//! FBX document to scene conversion.
//!
//! Every `Geometry` under `Objects` becomes one mesh with a single
//! non-indexed primitive: positions, normals and UVs are expanded per
//! triangle corner into three float streams. Every `Model` becomes a node
//! whose matrix comes from its `Lcl Translation`, `Lcl Rotation` and
//! `Lcl Scaling` properties. `C` connections attach geometries to models
//! and models to parent models.

use scenic_core::math_utils::from_euler_degrees;
use scenic_core::{Attribute, BlobBuilder, Material, Mesh, Node, Primitive, Scene, Semantic};

use crate::error::{check_index, LoadError, Result};
use crate::fbx_reader::{self, FbxDocument, NodeRef};
use crate::hierarchy::propagate_transforms;
use crate::loader::LoadOptions;
use crate::texture::load_texture;
use crate::traits::SceneFormat;

/// Exporters write a scale of 100 on every model to convert centimetres;
/// that exact value is dropped instead of applied.
pub const EXPORTER_UNIT_SCALE: [f64; 3] = [100.0, 100.0, 100.0];

/// Separator between an object's name and its class in name properties.
const NAME_CLASS_SEPARATOR: &str = "\u{0}\u{1}";

/// FBX binary format.
pub struct FbxFormat;

impl SceneFormat for FbxFormat {
    type Document = FbxDocument;

    fn decode(bytes: &[u8]) -> Result<FbxDocument> {
        fbx_reader::decode(bytes)
    }

    fn build(document: &FbxDocument, options: &LoadOptions) -> Result<Scene> {
        build_scene(document, options)
    }
}

/// Object name from property 1, without the class suffix.
fn object_name(object: &NodeRef<'_>, fallback: &str, index: usize) -> String {
    match object.property(1).and_then(|p| p.as_str()) {
        Some(name) => name.split(NAME_CLASS_SEPARATOR).next().unwrap_or(name).to_string(),
        None => format!("{}{}", fallback, index),
    }
}

fn object_id(object: &NodeRef<'_>) -> Option<i64> {
    object.property(0).and_then(|p| p.as_i64())
}

/// Converts a decoded FBX document into a scene.
pub fn build_scene(document: &FbxDocument, options: &LoadOptions) -> Result<Scene> {
    let root = document.root();
    let objects = root
        .child("Objects")
        .ok_or_else(|| LoadError::MissingField("Objects".into()))?;
    let geometries: Vec<NodeRef<'_>> = objects.children("Geometry").collect();
    let models: Vec<NodeRef<'_>> = objects.children("Model").collect();

    let mut scene = Scene::new();
    let mut blob = BlobBuilder::new();

    if let Some(content) = objects
        .child("Video")
        .and_then(|video| video.child("Content"))
        .and_then(|content| content.property(0))
        .and_then(|p| p.as_bytes())
        .filter(|bytes| !bytes.is_empty())
    {
        let texture = load_texture("Video", content.to_vec(), None, None, options)?;
        scene.textures.push(texture);
        scene.materials.push(Material::texture("Video", 0));
    }
    let material = (!scene.materials.is_empty()).then_some(0);

    for (index, geometry) in geometries.iter().enumerate() {
        let name = object_name(geometry, "Geometry", index);
        let mut primitive = expand_geometry(geometry, &name, &mut blob)?;
        primitive.material = material;
        let mut mesh = Mesh::new(name);
        mesh.add_primitive(primitive);
        scene.meshes.push(mesh);
    }

    scene.nodes = models
        .iter()
        .enumerate()
        .map(|(index, model)| Node::new(object_name(model, "Model", index)).with_matrix(model_matrix(model)))
        .collect();

    if models.is_empty() {
        scene.nodes = scene
            .meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| Node::new(mesh.name.clone()).with_mesh(index))
            .collect();
    } else {
        let geometry_ids: Vec<Option<i64>> = geometries.iter().map(object_id).collect();
        let model_ids: Vec<Option<i64>> = models.iter().map(object_id).collect();
        resolve_connections(document, &geometry_ids, &model_ids, &mut scene.nodes);
    }

    propagate_transforms(&mut scene.nodes);
    scene.blob = blob.finish();

    log::info!(
        "FBX scene: {} geometries, {} models, {} textures",
        geometries.len(),
        models.len(),
        scene.textures.len()
    );
    Ok(scene)
}

/// Links geometries to models and models to parent models. The first
/// connection seen for a child wins; later ones are ignored.
fn resolve_connections(document: &FbxDocument, geometry_ids: &[Option<i64>], model_ids: &[Option<i64>], nodes: &mut [Node]) {
    let root = document.root();
    let connections = root
        .child("Connections")
        .or_else(|| root.child("Objects").and_then(|objects| objects.child("Connections")));
    let Some(connections) = connections else {
        return;
    };

    let find = |ids: &[Option<i64>], id: i64| ids.iter().position(|&candidate| candidate == Some(id));
    let mut geometry_linked = vec![false; geometry_ids.len()];
    let mut model_linked = vec![false; model_ids.len()];

    for connection in connections.children("C") {
        let (Some(child), Some(parent)) = (
            connection.property(1).and_then(|p| p.as_i64()),
            connection.property(2).and_then(|p| p.as_i64()),
        ) else {
            continue;
        };
        let Some(parent_model) = find(model_ids, parent) else {
            continue;
        };

        if let Some(geometry) = find(geometry_ids, child) {
            if geometry_linked[geometry] || nodes[parent_model].mesh.is_some() {
                log::debug!("Ignoring extra connection of geometry {} to model {}", child, parent);
                continue;
            }
            geometry_linked[geometry] = true;
            nodes[parent_model].mesh = Some(geometry);
        } else if let Some(model) = find(model_ids, child) {
            if model_linked[model] || model == parent_model {
                log::debug!("Ignoring extra connection of model {} to model {}", child, parent);
                continue;
            }
            model_linked[model] = true;
            nodes[parent_model].add_child(model);
        }
    }
}

/// Matrix from the model's local translation, rotation and scaling.
fn model_matrix(model: &NodeRef<'_>) -> scenic_core::Mat4 {
    let mut translation = [0.0; 3];
    let mut rotation = [0.0; 3];
    let mut scaling = [1.0; 3];

    let table = model
        .child("Properties70")
        .or_else(|| model.child("Properties60"));
    for entry in table.iter().flat_map(|t| t.all_children()) {
        let Some(key) = entry.property(0).and_then(|p| p.as_str()) else {
            continue;
        };
        let target = match key {
            "Lcl Translation" => &mut translation,
            "Lcl Rotation" => &mut rotation,
            "Lcl Scaling" => &mut scaling,
            _ => continue,
        };
        let values: Vec<f64> = entry.properties().iter().filter_map(|p| p.as_f64()).collect();
        if let [.., x, y, z] = values.as_slice() {
            *target = [*x, *y, *z];
        }
    }

    if scaling == EXPORTER_UNIT_SCALE {
        scaling = [1.0; 3];
    }
    from_euler_degrees(translation, rotation, scaling)
}

/// How a layer element maps its values onto the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mapping {
    PolygonVertex,
    ControlPoint,
    Polygon,
    AllSame,
}

/// Per-corner data stored in a `LayerElement*` child of a geometry.
struct LayerElement {
    values: Vec<f64>,
    width: usize,
    mapping: Mapping,
    indices: Option<Vec<i64>>,
}

impl LayerElement {
    fn read(geometry: &NodeRef<'_>, layer: &str, values: &str, index: &str, width: usize) -> Option<Self> {
        let layer = geometry.child(layer)?;
        let values = layer.child(values)?.property(0)?.to_f64_vec()?;
        let mapping = match layer
            .child("MappingInformationType")
            .and_then(|n| n.property(0))
            .and_then(|p| p.as_str())
        {
            Some("ByVertice") | Some("ByVertex") | Some("ByControlPoint") => Mapping::ControlPoint,
            Some("ByPolygon") => Mapping::Polygon,
            Some("AllSame") => Mapping::AllSame,
            _ => Mapping::PolygonVertex,
        };
        let indices = layer
            .child(index)
            .and_then(|n| n.property(0))
            .and_then(|p| p.to_i64_vec());
        Some(Self {
            values,
            width,
            mapping,
            indices,
        })
    }

    fn value(&self, corner: usize, control_point: usize) -> Result<&[f64]> {
        let element = match self.mapping {
            Mapping::PolygonVertex => corner,
            Mapping::ControlPoint => control_point,
            Mapping::Polygon => corner / 3,
            Mapping::AllSame => 0,
        };
        let entry = match &self.indices {
            Some(indices) => {
                let slot = check_index("layer element", element as i64, indices.len())?;
                indices[slot]
            }
            None => element as i64,
        };
        let entry = check_index("layer value", entry, self.values.len() / self.width)?;
        Ok(&self.values[entry * self.width..(entry + 1) * self.width])
    }
}

/// Expands one geometry into per-corner float streams appended to `blob`.
fn expand_geometry(geometry: &NodeRef<'_>, name: &str, blob: &mut BlobBuilder) -> Result<Primitive> {
    let incomplete = |field: &str| LoadError::IncompleteMesh {
        mesh: name.to_string(),
        reason: format!("missing {}", field),
    };
    let vertices = geometry
        .child("Vertices")
        .and_then(|n| n.property(0))
        .and_then(|p| p.to_f64_vec())
        .ok_or_else(|| incomplete("Vertices"))?;
    let polygon_indices = geometry
        .child("PolygonVertexIndex")
        .and_then(|n| n.property(0))
        .and_then(|p| p.to_i64_vec())
        .ok_or_else(|| incomplete("PolygonVertexIndex"))?;

    if polygon_indices.len() % 3 != 0 {
        return Err(LoadError::UnsupportedTopology {
            mesh: name.to_string(),
            reason: format!("{} polygon indices do not form triangles", polygon_indices.len()),
        });
    }

    let normals = LayerElement::read(geometry, "LayerElementNormal", "Normals", "NormalsIndex", 3);
    let uvs = LayerElement::read(geometry, "LayerElementUV", "UV", "UVIndex", 2);
    if normals.is_none() {
        log::debug!("Geometry {} has no normals, zero-filling", name);
    }

    let corner_count = polygon_indices.len();
    let control_points = vertices.len() / 3;
    let mut positions = Vec::with_capacity(corner_count * 3);
    let mut normal_data = vec![0.0f32; corner_count * 3];
    let mut uv_data = vec![0.0f32; corner_count * 2];

    for (face, triangle) in polygon_indices.chunks_exact(3).enumerate() {
        // The last corner of each polygon is stored bitwise-negated.
        let corners = [triangle[0], triangle[1], !triangle[2]];
        if corners.iter().any(|&i| i < 0) {
            return Err(LoadError::UnsupportedTopology {
                mesh: name.to_string(),
                reason: format!("face {} is not a triangle", face),
            });
        }

        for (k, &control_point) in corners.iter().enumerate() {
            let corner = face * 3 + k;
            let point = check_index("vertex", control_point, control_points)?;
            positions.extend(vertices[point * 3..point * 3 + 3].iter().map(|&v| v as f32));

            if let Some(normals) = &normals {
                let n = normals.value(corner, point)?;
                for (dst, &src) in normal_data[corner * 3..corner * 3 + 3].iter_mut().zip(n) {
                    *dst = src as f32;
                }
            }
            if let Some(uvs) = &uvs {
                let uv = uvs.value(corner, point)?;
                for (dst, &src) in uv_data[corner * 2..corner * 2 + 2].iter_mut().zip(uv) {
                    *dst = src as f32;
                }
            }
        }
    }

    let mut primitive = Primitive::new();
    let (offset, len) = blob.push_f32s(&positions);
    primitive.set_attribute(Semantic::Position, Attribute::float32(3, corner_count, offset, len));
    let (offset, len) = blob.push_f32s(&normal_data);
    primitive.set_attribute(Semantic::Normal, Attribute::float32(3, corner_count, offset, len));
    let (offset, len) = blob.push_f32s(&uv_data);
    primitive.set_attribute(Semantic::TexCoord0, Attribute::float32(2, corner_count, offset, len));
    primitive.vertices = corner_count;
    primitive.indexed = false;

    log::debug!("Geometry {}: {} triangles", name, corner_count / 3);
    Ok(primitive)
}
