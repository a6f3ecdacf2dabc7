//! Mesh vertex format and its Vulkan input descriptions.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Vertex format for the textured mesh pipeline.
///
/// Each vertex carries the texture and sampler it samples from at draw time,
/// which is what lets a single draw call cover a mesh spanning many
/// textures.
///
/// # Memory Layout
///
/// `#[repr(C)]`, 40 bytes, no padding:
/// - Offset 0: position (12 bytes)
/// - Offset 12: color (12 bytes)
/// - Offset 24: tex_coord (8 bytes)
/// - Offset 32: texture_index (4 bytes)
/// - Offset 36: sampler_index (4 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct MeshVertex {
    /// Position in object space.
    pub position: Vec3,
    /// Vertex color, multiplied into the sampled texel.
    pub color: Vec3,
    /// Texture coordinates.
    pub tex_coord: Vec2,
    /// Index into the bindless texture array (0 = default texture).
    pub texture_index: i32,
    /// Index into the fixed sampler array.
    pub sampler_index: i32,
}

impl MeshVertex {
    /// Returns the size of the vertex in bytes.
    #[inline]
    pub const fn size() -> usize {
        std::mem::size_of::<Self>()
    }

    /// Get the vertex input binding description (binding 0, per-vertex rate).
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Self>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Get the vertex attribute descriptions.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 5] {
        [
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 0,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: 12,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: 24,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32_SINT,
                offset: 32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 4,
                format: vk::Format::R32_SINT,
                offset: 36,
            },
        ]
    }
}

// Equality and hashing are byte-exact over the full struct so vertices can
// key the deduplication map during mesh loading. The Pod bound guarantees
// there are no padding bytes to poison the comparison.
impl PartialEq for MeshVertex {
    fn eq(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }
}

impl Eq for MeshVertex {}

impl std::hash::Hash for MeshVertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        bytemuck::bytes_of(self).hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn vertex_size_and_stride() {
        assert_eq!(MeshVertex::size(), 40);
        assert_eq!(MeshVertex::binding_description().stride, 40);
    }

    #[test]
    fn attribute_offsets_match_layout() {
        use std::mem::offset_of;

        let attrs = MeshVertex::attribute_descriptions();
        assert_eq!(attrs[0].offset as usize, offset_of!(MeshVertex, position));
        assert_eq!(attrs[1].offset as usize, offset_of!(MeshVertex, color));
        assert_eq!(attrs[2].offset as usize, offset_of!(MeshVertex, tex_coord));
        assert_eq!(
            attrs[3].offset as usize,
            offset_of!(MeshVertex, texture_index)
        );
        assert_eq!(
            attrs[4].offset as usize,
            offset_of!(MeshVertex, sampler_index)
        );
    }

    #[test]
    fn attribute_formats() {
        let attrs = MeshVertex::attribute_descriptions();
        assert_eq!(attrs[0].format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(attrs[2].format, vk::Format::R32G32_SFLOAT);
        assert_eq!(attrs[3].format, vk::Format::R32_SINT);
        assert_eq!(attrs[4].format, vk::Format::R32_SINT);
    }

    #[test]
    fn byte_equality_distinguishes_texture_index() {
        let a = MeshVertex {
            position: Vec3::new(1.0, 2.0, 3.0),
            color: Vec3::ONE,
            tex_coord: Vec2::new(0.5, 0.5),
            texture_index: 0,
            sampler_index: 0,
        };
        let mut b = a;
        assert_eq!(a, b);

        b.texture_index = 1;
        assert_ne!(a, b);
    }

    #[test]
    fn usable_as_hash_map_key() {
        let v = MeshVertex {
            position: Vec3::X,
            color: Vec3::ONE,
            tex_coord: Vec2::ZERO,
            texture_index: 0,
            sampler_index: 1,
        };

        let mut map = HashMap::new();
        map.insert(v, 7u32);
        assert_eq!(map.get(&v), Some(&7));
    }
}
