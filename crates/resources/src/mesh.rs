//! Flat mesh data with structural vertex deduplication.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use glaze_rhi::sampler::FilterMode;
use glaze_rhi::vertex::MeshVertex;

/// Flat vertex/index lists ready for GPU upload.
///
/// Vertices are unique: pushing a vertex that is byte-identical to an
/// earlier one only appends its existing index. The lookup map relies on
/// [`MeshVertex`]'s byte-exact equality and hash.
#[derive(Debug, Default)]
pub struct MeshData {
    /// Deduplicated vertex list.
    pub vertices: Vec<MeshVertex>,
    /// Triangle index list into `vertices`.
    pub indices: Vec<u32>,
    /// Index of each unique vertex already seen.
    lookup: HashMap<MeshVertex, u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one face-corner vertex.
    ///
    /// Returns the index the corner resolved to, fresh for a new vertex and
    /// recycled for a duplicate. The index is also appended to `indices`.
    pub fn push_vertex(&mut self, vertex: MeshVertex) -> u32 {
        let index = match self.lookup.get(&vertex) {
            Some(&index) => index,
            None => {
                let index = self.vertices.len() as u32;
                self.lookup.insert(vertex, index);
                self.vertices.push(vertex);
                index
            }
        };
        self.indices.push(index);
        index
    }

    /// Number of unique vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices (three per triangle).
    #[inline]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// A unit cube centered at the origin, textured with the default
    /// texture and nearest filtering on every face.
    ///
    /// Used as the fallback scene when no model path is supplied: 24 unique
    /// vertices (four per face, faces do not share UVs) and 36 indices.
    pub fn unit_cube() -> Self {
        let mut mesh = Self::new();

        // (normal axis, four corners in CCW order viewed from outside)
        let faces: [[Vec3; 4]; 6] = [
            // +Z
            [
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
            ],
            // -Z
            [
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
            ],
            // +X
            [
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(0.5, 0.5, 0.5),
            ],
            // -X
            [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(-0.5, -0.5, 0.5),
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ],
            // +Y
            [
                Vec3::new(-0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, 0.5),
                Vec3::new(0.5, 0.5, -0.5),
                Vec3::new(-0.5, 0.5, -0.5),
            ],
            // -Y
            [
                Vec3::new(-0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, -0.5),
                Vec3::new(0.5, -0.5, 0.5),
                Vec3::new(-0.5, -0.5, 0.5),
            ],
        ];

        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        for corners in faces {
            let base: Vec<u32> = corners
                .iter()
                .zip(uvs)
                .map(|(&position, tex_coord)| {
                    // Collect the corner indices without emitting them yet
                    let vertex = MeshVertex {
                        position,
                        color: Vec3::ONE,
                        tex_coord,
                        texture_index: 0,
                        sampler_index: FilterMode::Nearest.index(),
                    };
                    let index = mesh.vertices.len() as u32;
                    mesh.lookup.insert(vertex, index);
                    mesh.vertices.push(vertex);
                    index
                })
                .collect();

            // Two triangles per face
            mesh.indices
                .extend_from_slice(&[base[0], base[1], base[2], base[2], base[3], base[0]]);
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(x: f32, y: f32, z: f32) -> MeshVertex {
        MeshVertex {
            position: Vec3::new(x, y, z),
            color: Vec3::ONE,
            tex_coord: Vec2::ZERO,
            texture_index: 0,
            sampler_index: 0,
        }
    }

    #[test]
    fn duplicate_vertices_share_an_index() {
        let mut mesh = MeshData::new();
        let a = mesh.push_vertex(corner(0.0, 0.0, 0.0));
        let b = mesh.push_vertex(corner(1.0, 0.0, 0.0));
        let c = mesh.push_vertex(corner(0.0, 0.0, 0.0));

        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.index_count(), 3);
    }

    #[test]
    fn differing_attributes_break_sharing() {
        let mut mesh = MeshData::new();
        let mut v = corner(0.0, 0.0, 0.0);
        let a = mesh.push_vertex(v);

        v.tex_coord = Vec2::new(1.0, 0.0);
        let b = mesh.push_vertex(v);

        assert_ne!(a, b);
        assert_eq!(mesh.vertex_count(), 2);
    }

    #[test]
    fn cube_face_corners_deduplicate_to_24() {
        // Pushing the cube's 36 face corners through the dedup path must
        // produce the canonical 24-vertex, 36-index layout.
        let reference = MeshData::unit_cube();

        let mut mesh = MeshData::new();
        for &index in &reference.indices {
            mesh.push_vertex(reference.vertices[index as usize]);
        }

        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
    }

    #[test]
    fn unit_cube_shape() {
        let cube = MeshData::unit_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.index_count(), 36);

        // Every index must be in range
        assert!(cube.indices.iter().all(|&i| (i as usize) < 24));
    }
}
