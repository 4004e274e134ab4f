mod common;

use common::{connection, cube_fbx, cube_geometry, fbx_document, model, p_vector, string, FbxWriter, Record};
use scenic_core::math_utils::{approx_eq, translation, IDENTITY};
use scenic_core::{MaterialKind, Scene, Semantic, TextureImage};
use scenic_io::{FbxFormat, FbxProperty, LoadError, LoadOptions, SceneFormat};

fn load(data: &[u8]) -> Scene {
    let scene = FbxFormat::load(data, &LoadOptions::default()).unwrap();
    scene.validate().unwrap();
    scene
}

fn read_f32s(scene: &Scene, semantic: Semantic) -> Vec<f32> {
    let attribute = scene.meshes[0].primitives[0].attribute(&semantic).unwrap().clone();
    scene
        .attribute_bytes(&attribute)
        .unwrap()
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn test_cube_without_models() {
    let scene = load(&cube_fbx());

    assert_eq!(scene.nodes.len(), 1);
    assert_eq!(scene.nodes[0].matrix, IDENTITY);
    assert_eq!(scene.nodes[0].mesh, Some(0));
    assert_eq!(scene.meshes.len(), 1);
    assert_eq!(scene.meshes[0].name, "Cube");

    let primitive = &scene.meshes[0].primitives[0];
    assert_eq!(primitive.vertices, 36);
    assert!(!primitive.indexed);
    assert_eq!(primitive.attribute(&Semantic::Position).unwrap().entry_count, 36);
    assert_eq!(primitive.attribute(&Semantic::TexCoord0).unwrap().components_per_entry, 2);
    assert_eq!(scene.blob.len(), 36 * (3 + 3 + 2) * 4);
}

#[test]
fn test_cube_corner_data() {
    let scene = load(&cube_fbx());

    let positions = read_f32s(&scene, Semantic::Position);
    // Third corner of the first triangle was stored as !2.
    assert_eq!(&positions[6..9], &[1.0, 0.0, 0.0]);

    let normals = read_f32s(&scene, Semantic::Normal);
    assert_eq!(&normals[0..3], &[0.0, 0.0, -1.0]);
    assert_eq!(&normals[105..108], &[1.0, 0.0, 0.0]);

    // UVIndex cycles 0..4 over corners.
    let uvs = read_f32s(&scene, Semantic::TexCoord0);
    assert_eq!(&uvs[4..6], &[1.0, 1.0]);
    assert_eq!(&uvs[6..8], &[0.0, 1.0]);
}

#[test]
fn test_compressed_arrays_decode_identically() {
    let geometry = cube_geometry(10, "Cube");
    let plain = FbxWriter::new().write(&[Record::new("Objects").child(geometry.clone())]);
    let packed = FbxWriter::new()
        .with_compression(true)
        .write(&[Record::new("Objects").child(geometry)]);
    assert_ne!(plain, packed);
    assert_eq!(load(&plain), load(&packed));
}

#[test]
fn test_model_hierarchy() {
    let objects = vec![
        cube_geometry(10, "Cube"),
        model(1, "Parent", vec![p_vector("Lcl Translation", [1.0, 0.0, 0.0])]),
        model(2, "Child", vec![p_vector("Lcl Translation", [2.0, 0.0, 0.0])]),
    ];
    let connections = vec![connection(2, 1), connection(10, 2)];
    let scene = load(&fbx_document(objects, connections));

    assert_eq!(scene.nodes.len(), 2);
    assert_eq!(scene.nodes[0].name, "Parent");
    assert_eq!(scene.nodes[0].children, Some(vec![1]));
    assert_eq!(scene.nodes[0].mesh, None);
    assert_eq!(scene.nodes[1].mesh, Some(0));
    assert_eq!(translation(&scene.nodes[0].matrix), [1.0, 0.0, 0.0]);
    assert_eq!(translation(&scene.nodes[1].matrix), [3.0, 0.0, 0.0]);
}

#[test]
fn test_first_connection_wins() {
    let objects = vec![
        cube_geometry(10, "First"),
        cube_geometry(11, "Second"),
        model(1, "Holder", Vec::new()),
        model(2, "Other", Vec::new()),
    ];
    let connections = vec![
        connection(10, 1),
        connection(11, 1),
        connection(10, 2),
        connection(2, 1),
        connection(2, 1),
    ];
    let scene = load(&fbx_document(objects, connections));

    assert_eq!(scene.nodes[0].mesh, Some(0));
    assert_eq!(scene.nodes[1].mesh, None);
    assert_eq!(scene.nodes[0].children, Some(vec![1]));
}

#[test]
fn test_connections_inside_objects() {
    let objects = Record::new("Objects")
        .child(cube_geometry(10, "Cube"))
        .child(model(1, "Model", Vec::new()))
        .child(Record::new("Connections").child(connection(10, 1)));
    let scene = load(&FbxWriter::new().write(&[objects]));
    assert_eq!(scene.nodes[0].mesh, Some(0));
}

#[test]
fn test_unit_scale_is_suppressed_and_rotation_applied() {
    let objects = vec![
        cube_geometry(10, "Cube"),
        model(
            1,
            "Rotated",
            vec![
                p_vector("Lcl Scaling", [100.0, 100.0, 100.0]),
                p_vector("Lcl Rotation", [0.0, 0.0, 90.0]),
            ],
        ),
        model(2, "Scaled", vec![p_vector("Lcl Scaling", [2.0, 2.0, 2.0])]),
    ];
    let scene = load(&fbx_document(objects, vec![connection(10, 1)]));

    let expected = [
        0.0, 1.0, 0.0, 0.0, //
        -1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];
    assert!(approx_eq(&scene.nodes[0].matrix, &expected, 1e-6));
    assert_eq!(scene.nodes[1].matrix[0], 2.0);
    assert_eq!(scene.nodes[1].matrix[10], 2.0);
}

#[test]
fn test_quad_is_unsupported() {
    let geometry = Record::new("Geometry")
        .prop(FbxProperty::I64(10))
        .prop(string("Quad\u{0}\u{1}Geometry"))
        .child(Record::new("Vertices").prop(FbxProperty::F64Array(vec![0.0; 12])))
        .child(Record::new("PolygonVertexIndex").prop(FbxProperty::I32Array(vec![0, 1, 2, -4, 0, -3])));
    let err = FbxFormat::load(&fbx_document(vec![geometry], Vec::new()), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedTopology { .. }));
}

#[test]
fn test_extreme_polygon_index_is_rejected() {
    let geometry = Record::new("Geometry")
        .prop(FbxProperty::I64(10))
        .prop(string("Wide\u{0}\u{1}Geometry"))
        .child(Record::new("Vertices").prop(FbxProperty::F64Array(vec![0.0; 9])))
        .child(Record::new("PolygonVertexIndex").prop(FbxProperty::I64Array(vec![0, 1, i64::MIN])));
    let result = FbxFormat::load(&fbx_document(vec![geometry], Vec::new()), &LoadOptions::default());
    assert!(matches!(result, Err(LoadError::InvalidIndex { kind: "vertex", .. })));
}

#[test]
fn test_missing_vertices() {
    let geometry = Record::new("Geometry")
        .prop(FbxProperty::I64(10))
        .prop(string("Empty\u{0}\u{1}Geometry"))
        .child(Record::new("PolygonVertexIndex").prop(FbxProperty::I32Array(vec![0, 1, -3])));
    let err = FbxFormat::load(&fbx_document(vec![geometry], Vec::new()), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::IncompleteMesh { .. }));
}

#[test]
fn test_embedded_texture() {
    let mut png = Vec::new();
    image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 20, 30, 255]))
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let video = Record::new("Video")
        .prop(FbxProperty::I64(20))
        .child(Record::new("Content").prop(FbxProperty::Raw(png)));
    let scene = load(&fbx_document(vec![cube_geometry(10, "Cube"), video], Vec::new()));

    assert_eq!(scene.textures.len(), 1);
    assert_eq!(scene.textures[0].dimensions(), Some((2, 2)));
    match &scene.textures[0].image {
        TextureImage::Decoded { rgba, .. } => assert_eq!(&rgba[..4], &[10, 20, 30, 255]),
        other => panic!("expected a decoded texture, got {:?}", other),
    }
    assert_eq!(scene.materials[0].kind, MaterialKind::Texture(0));
    assert_eq!(scene.meshes[0].primitives[0].material, Some(0));
}

#[test]
fn test_newer_version_is_rejected() {
    let data = FbxWriter::new().with_version(7500).write(&[Record::new("Objects")]);
    assert!(matches!(
        FbxFormat::load(&data, &LoadOptions::default()),
        Err(LoadError::UnsupportedVersion(7500))
    ));
}
