use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scenic_io::{FbxFormat, LoadOptions, SceneFormat};

#[path = "../tests/common/mod.rs"]
mod common;

use common::{connection, cube_geometry, fbx_document, model, p_vector, FbxWriter, Record};

/// A row of cubes, each under its own translated model.
fn cube_row(count: i64) -> Vec<Record> {
    let mut objects = Vec::new();
    for i in 0..count {
        objects.push(cube_geometry(1000 + i, &format!("Cube{}", i)));
        objects.push(model(i + 1, &format!("Model{}", i), vec![p_vector("Lcl Translation", [i as f64, 0.0, 0.0])]));
    }
    objects
}

fn bench_fbx(c: &mut Criterion) {
    let objects = cube_row(64);
    let connections = (0..64).map(|i| connection(1000 + i, i + 1)).collect();
    let plain = fbx_document(objects.clone(), connections);

    let mut packed_objects = Record::new("Objects");
    packed_objects.children = objects;
    let packed = FbxWriter::new().with_compression(true).write(&[packed_objects]);

    let options = LoadOptions::default();
    c.bench_function("fbx_decode_tree", |b| b.iter(|| FbxFormat::decode(black_box(&plain)).unwrap()));
    c.bench_function("fbx_decode_compressed_tree", |b| {
        b.iter(|| FbxFormat::decode(black_box(&packed)).unwrap())
    });
    c.bench_function("fbx_load_scene", |b| b.iter(|| FbxFormat::load(black_box(&plain), &options).unwrap()));
}

criterion_group!(benches, bench_fbx);
criterion_main!(benches);
