//! Fixture writers shared by the integration tests.
#![allow(dead_code)]

use miniz_oxide::deflate::compress_to_vec_zlib;
use scenic_io::fbx_reader::FBX_MAGIC;
use scenic_io::gltf_reader::{GLB_CHUNK_BIN, GLB_CHUNK_JSON, GLB_MAGIC, GLB_VERSION};
use scenic_io::FbxProperty;
use serde_json::Value;

pub const FBX_VERSION: u32 = 7400;
const NULL_RECORD_SIZE: usize = 13;

// ============================================================================
// FBX
// ============================================================================

/// Record tree to be encoded as a binary FBX file.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub properties: Vec<FbxProperty>,
    pub children: Vec<Record>,
}

impl Record {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, property: FbxProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn child(mut self, child: Record) -> Self {
        self.children.push(child);
        self
    }

    /// Number of records in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Record::count).sum::<usize>()
    }
}

/// Writes 32-bit-header FBX files; arrays are optionally zlib-compressed.
pub struct FbxWriter {
    version: u32,
    compress: bool,
}

impl FbxWriter {
    pub fn new() -> Self {
        Self {
            version: FBX_VERSION,
            compress: false,
        }
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn write(&self, records: &[Record]) -> Vec<u8> {
        let mut data = FBX_MAGIC.to_vec();
        data.extend_from_slice(&[0x1A, 0x00]);
        data.extend_from_slice(&self.version.to_le_bytes());
        for record in records {
            self.write_record(&mut data, record);
        }
        data.extend_from_slice(&[0u8; NULL_RECORD_SIZE]);
        data
    }

    fn write_record(&self, data: &mut Vec<u8>, record: &Record) {
        let start = data.len();
        // End offset, property count and property list length are patched below.
        data.extend_from_slice(&[0u8; 12]);
        data.push(record.name.len() as u8);
        data.extend_from_slice(record.name.as_bytes());

        let properties_start = data.len();
        for property in &record.properties {
            self.write_property(data, property);
        }
        let property_list_len = data.len() - properties_start;

        for child in &record.children {
            self.write_record(data, child);
        }
        data.extend_from_slice(&[0u8; NULL_RECORD_SIZE]);

        let end = data.len() as u32;
        data[start..start + 4].copy_from_slice(&end.to_le_bytes());
        data[start + 4..start + 8].copy_from_slice(&(record.properties.len() as u32).to_le_bytes());
        data[start + 8..start + 12].copy_from_slice(&(property_list_len as u32).to_le_bytes());
    }

    fn write_property(&self, data: &mut Vec<u8>, property: &FbxProperty) {
        data.push(property.type_code());
        match property {
            FbxProperty::Bool(v) => data.push(*v as u8),
            FbxProperty::I16(v) => data.extend_from_slice(&v.to_le_bytes()),
            FbxProperty::I32(v) => data.extend_from_slice(&v.to_le_bytes()),
            FbxProperty::I64(v) => data.extend_from_slice(&v.to_le_bytes()),
            FbxProperty::F32(v) => data.extend_from_slice(&v.to_le_bytes()),
            FbxProperty::F64(v) => data.extend_from_slice(&v.to_le_bytes()),
            FbxProperty::String(s) => {
                data.extend_from_slice(&(s.len() as u32).to_le_bytes());
                data.extend_from_slice(s.as_bytes());
            }
            FbxProperty::Raw(bytes) => {
                data.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                data.extend_from_slice(bytes);
            }
            FbxProperty::BoolArray(v) => {
                self.write_array(data, v.len(), v.iter().map(|&b| b as u8).collect())
            }
            FbxProperty::I32Array(v) => {
                self.write_array(data, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect())
            }
            FbxProperty::I64Array(v) => {
                self.write_array(data, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect())
            }
            FbxProperty::F32Array(v) => {
                self.write_array(data, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect())
            }
            FbxProperty::F64Array(v) => {
                self.write_array(data, v.len(), v.iter().flat_map(|x| x.to_le_bytes()).collect())
            }
        }
    }

    fn write_array(&self, data: &mut Vec<u8>, count: usize, raw: Vec<u8>) {
        data.extend_from_slice(&(count as u32).to_le_bytes());
        let (encoding, payload) = if self.compress {
            (1u32, compress_to_vec_zlib(&raw, 6))
        } else {
            (0u32, raw)
        };
        data.extend_from_slice(&encoding.to_le_bytes());
        data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        data.extend_from_slice(&payload);
    }
}

pub fn string(s: &str) -> FbxProperty {
    FbxProperty::String(s.to_string())
}

/// `P` entry of a `Properties70` table holding a numeric triple.
pub fn p_vector(key: &str, value: [f64; 3]) -> Record {
    Record::new("P")
        .prop(string(key))
        .prop(string(key))
        .prop(string(""))
        .prop(string("A"))
        .prop(FbxProperty::F64(value[0]))
        .prop(FbxProperty::F64(value[1]))
        .prop(FbxProperty::F64(value[2]))
}

pub fn model(id: i64, name: &str, properties: Vec<Record>) -> Record {
    let mut table = Record::new("Properties70");
    table.children = properties;
    Record::new("Model")
        .prop(FbxProperty::I64(id))
        .prop(string(&format!("{}\u{0}\u{1}Model", name)))
        .prop(string("Mesh"))
        .child(table)
}

pub fn connection(child: i64, parent: i64) -> Record {
    Record::new("C")
        .prop(string("OO"))
        .prop(FbxProperty::I64(child))
        .prop(FbxProperty::I64(parent))
}

/// Unit cube triangulated into 12 faces, normals per corner.
pub fn cube_geometry(id: i64, name: &str) -> Record {
    let vertices = vec![
        0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0,
    ];
    let triangles: [[i32; 3]; 12] = [
        [0, 2, 1], [0, 3, 2], // -z
        [4, 5, 6], [4, 6, 7], // +z
        [0, 1, 5], [0, 5, 4], // -y
        [3, 7, 6], [3, 6, 2], // +y
        [0, 4, 7], [0, 7, 3], // -x
        [1, 2, 6], [1, 6, 5], // +x
    ];
    let face_normals = [
        [0.0, 0.0, -1.0],
        [0.0, 0.0, 1.0],
        [0.0, -1.0, 0.0],
        [0.0, 1.0, 0.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
    ];

    let mut polygon_vertex_index = Vec::with_capacity(36);
    let mut normals = Vec::with_capacity(108);
    for (face, triangle) in triangles.iter().enumerate() {
        polygon_vertex_index.extend_from_slice(&[triangle[0], triangle[1], !triangle[2]]);
        for _ in 0..3 {
            normals.extend_from_slice(&face_normals[face / 2]);
        }
    }
    let uv_index: Vec<i32> = (0..36).map(|corner| corner % 4).collect();

    Record::new("Geometry")
        .prop(FbxProperty::I64(id))
        .prop(string(&format!("{}\u{0}\u{1}Geometry", name)))
        .prop(string("Mesh"))
        .child(Record::new("Vertices").prop(FbxProperty::F64Array(vertices)))
        .child(Record::new("PolygonVertexIndex").prop(FbxProperty::I32Array(polygon_vertex_index)))
        .child(
            Record::new("LayerElementNormal")
                .prop(FbxProperty::I32(0))
                .child(Record::new("MappingInformationType").prop(string("ByPolygonVertex")))
                .child(Record::new("ReferenceInformationType").prop(string("Direct")))
                .child(Record::new("Normals").prop(FbxProperty::F64Array(normals))),
        )
        .child(
            Record::new("LayerElementUV")
                .prop(FbxProperty::I32(0))
                .child(Record::new("MappingInformationType").prop(string("ByPolygonVertex")))
                .child(Record::new("ReferenceInformationType").prop(string("IndexToDirect")))
                .child(Record::new("UV").prop(FbxProperty::F64Array(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])))
                .child(Record::new("UVIndex").prop(FbxProperty::I32Array(uv_index))),
        )
}

/// Document with the given objects and top-level connections.
pub fn fbx_document(objects: Vec<Record>, connections: Vec<Record>) -> Vec<u8> {
    let header = Record::new("FBXHeaderExtension")
        .child(Record::new("FBXHeaderVersion").prop(FbxProperty::I32(1003)))
        .child(Record::new("FBXVersion").prop(FbxProperty::I32(FBX_VERSION as i32)));
    let mut objects_record = Record::new("Objects");
    objects_record.children = objects;
    let mut connections_record = Record::new("Connections");
    connections_record.children = connections;
    FbxWriter::new().write(&[header, objects_record, connections_record])
}

/// Single cube geometry with no model.
pub fn cube_fbx() -> Vec<u8> {
    fbx_document(vec![cube_geometry(10, "Cube")], Vec::new())
}

// ============================================================================
// GLB
// ============================================================================

/// Assembles a GLB container; the binary chunk is omitted when `bin` is empty.
pub fn glb(json: &Value, bin: &[u8]) -> Vec<u8> {
    let mut json_bytes = serde_json::to_vec(json).unwrap();
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }

    let mut data = Vec::new();
    data.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    data.extend_from_slice(&GLB_VERSION.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
    data.extend_from_slice(&GLB_CHUNK_JSON.to_le_bytes());
    data.extend_from_slice(&json_bytes);
    if !bin.is_empty() {
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        data.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        data.extend_from_slice(&GLB_CHUNK_BIN.to_le_bytes());
        data.extend_from_slice(&bin);
    }
    let len = data.len() as u32;
    data[8..12].copy_from_slice(&len.to_le_bytes());
    data
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Binary chunk holding one triangle: positions, normals, uvs (96 bytes),
/// with matching buffer views 0..3 and accessors 0..3.
pub fn triangle_buffers() -> (Vec<u8>, Value, Value) {
    let mut bin = f32_bytes(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    bin.extend(f32_bytes(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]));
    bin.extend(f32_bytes(&[0.0, 0.0, 1.0, 0.0, 0.0, 1.0]));
    let views = serde_json::json!([
        { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 36, "byteLength": 36 },
        { "buffer": 0, "byteOffset": 72, "byteLength": 24 }
    ]);
    let accessors = serde_json::json!([
        { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
        { "bufferView": 2, "componentType": 5126, "count": 3, "type": "VEC2" }
    ]);
    (bin, views, accessors)
}

pub fn triangle_primitive() -> Value {
    serde_json::json!({ "attributes": { "POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2 } })
}
