//! Triangulated OBJ mesh loading.
//!
//! Parsing is delegated to `tobj`; this module flattens the parsed shapes
//! into the renderer's vertex format, assigning texture indices through the
//! registry and deduplicating vertices as they are pushed.

use std::path::Path;

use glam::{Vec2, Vec3};
use tracing::info;

use glaze_rhi::sampler::FilterMode;
use glaze_rhi::vertex::MeshVertex;

use crate::error::{ResourceError, ResourceResult};
use crate::mesh::MeshData;
use crate::pixels::TextureRegistry;

/// Load a triangulated OBJ file, appending its geometry to `mesh`.
///
/// Every face corner becomes a [`MeshVertex`]: world position is
/// `(position + offset) * scale`, color is white, the V texture coordinate
/// is flipped for Vulkan's image origin, and the texture index comes from
/// interning the face material's diffuse texture name (0, the default
/// texture, when the material has none). Filtering is nearest for all
/// loaded geometry.
///
/// # Errors
///
/// Returns [`ResourceError::ObjLoad`] if parsing fails. Missing material
/// files degrade to the default texture rather than failing the load.
pub fn load_obj(
    path: &Path,
    mesh: &mut MeshData,
    registry: &mut TextureRegistry,
    offset: Vec3,
    scale: f32,
) -> ResourceResult<()> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj(path, &load_options).map_err(|e| {
        ResourceError::ObjLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    // A missing .mtl is not fatal; the mesh falls back to the default texture
    let materials = materials.unwrap_or_default();

    let texture_index_for = |material_id: Option<usize>, registry: &mut TextureRegistry| {
        material_id
            .and_then(|id| materials.get(id))
            .and_then(|material| material.diffuse_texture.as_deref())
            .map(|name| registry.intern(name) as i32)
            .unwrap_or(0)
    };

    let before_vertices = mesh.vertex_count();
    let before_indices = mesh.index_count();

    for model in &models {
        let tobj_mesh = &model.mesh;
        let texture_index = texture_index_for(tobj_mesh.material_id, registry);
        let has_texcoords = !tobj_mesh.texcoords.is_empty();

        for &index in &tobj_mesh.indices {
            let i = index as usize;

            let position = Vec3::new(
                tobj_mesh.positions[3 * i],
                tobj_mesh.positions[3 * i + 1],
                tobj_mesh.positions[3 * i + 2],
            );

            let tex_coord = if has_texcoords {
                Vec2::new(
                    tobj_mesh.texcoords[2 * i],
                    1.0 - tobj_mesh.texcoords[2 * i + 1],
                )
            } else {
                Vec2::ZERO
            };

            mesh.push_vertex(MeshVertex {
                position: (position + offset) * scale,
                color: Vec3::ONE,
                tex_coord,
                texture_index,
                sampler_index: FilterMode::Nearest.index(),
            });
        }
    }

    info!(
        "Loaded {:?}: {} unique vertices, {} indices ({} shapes)",
        path,
        mesh.vertex_count() - before_vertices,
        mesh.index_count() - before_indices,
        models.len()
    );

    Ok(())
}
