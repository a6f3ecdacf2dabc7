//! Integration tests for OBJ loading and texture interning.

use std::io::Write;

use glam::Vec3;

use glaze_resources::{MeshData, TextureRegistry, load_obj};

/// Two triangles sharing an edge: 4 unique corners, 6 indices.
const QUAD_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
f 1/1 2/2 3/3
f 3/3 4/4 1/1
";

fn write_temp_obj(name: &str, contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(name);
    let mut file = std::fs::File::create(&path).expect("create temp obj");
    file.write_all(contents.as_bytes()).expect("write temp obj");
    path
}

#[test]
fn quad_deduplicates_shared_corners() {
    let path = write_temp_obj("glaze_quad_dedup.obj", QUAD_OBJ);

    let mut mesh = MeshData::new();
    let mut registry = TextureRegistry::new();

    load_obj(&path, &mut mesh, &mut registry, Vec3::ZERO, 1.0).expect("load quad");

    // The shared diagonal corners collapse: 6 face corners, 4 vertices
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.index_count(), 6);

    // No material file: everything references the default texture
    assert!(mesh.vertices.iter().all(|v| v.texture_index == 0));
    assert_eq!(registry.len(), 1);

    let _ = std::fs::remove_file(path);
}

#[test]
fn offset_and_scale_are_applied() {
    let path = write_temp_obj("glaze_quad_transform.obj", QUAD_OBJ);

    let mut mesh = MeshData::new();
    let mut registry = TextureRegistry::new();

    load_obj(&path, &mut mesh, &mut registry, Vec3::new(1.0, 0.0, 0.0), 2.0)
        .expect("load quad");

    // First corner (0,0,0) becomes ((0,0,0) + (1,0,0)) * 2
    let first = mesh.vertices[mesh.indices[0] as usize];
    assert_eq!(first.position, Vec3::new(2.0, 0.0, 0.0));

    let _ = std::fs::remove_file(path);
}

#[test]
fn texcoord_v_is_flipped() {
    let path = write_temp_obj("glaze_quad_uv.obj", QUAD_OBJ);

    let mut mesh = MeshData::new();
    let mut registry = TextureRegistry::new();

    load_obj(&path, &mut mesh, &mut registry, Vec3::ZERO, 1.0).expect("load quad");

    // vt 0.0 0.0 maps to (0.0, 1.0) after the V flip
    let first = mesh.vertices[mesh.indices[0] as usize];
    assert_eq!(first.tex_coord.x, 0.0);
    assert_eq!(first.tex_coord.y, 1.0);

    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_file_reports_obj_error() {
    let mut mesh = MeshData::new();
    let mut registry = TextureRegistry::new();

    let result = load_obj(
        std::path::Path::new("does_not_exist.obj"),
        &mut mesh,
        &mut registry,
        Vec3::ZERO,
        1.0,
    );

    assert!(result.is_err());
}
