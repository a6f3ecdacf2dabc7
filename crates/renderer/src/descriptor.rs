//! The descriptor binding set.
//!
//! One layout with three bindings:
//! - 0: uniform buffer, vertex stage
//! - 1: fixed sampler array, fragment stage
//! - 2: variable-count sampled-image array, fragment stage
//!
//! One set is allocated per frame slot; each binds its slot's uniform
//! buffer plus the complete sampler and texture lists. Written once after
//! every GPU resource exists, then static for the process lifetime.

use std::sync::Arc;

use glaze_rhi::vk;
use tracing::info;

use glaze_rhi::buffer::Buffer;
use glaze_rhi::descriptor::{DescriptorPool, DescriptorSetLayout, update_descriptor_sets};
use glaze_rhi::device::Device;
use glaze_rhi::RhiResult;

use crate::texture_set::{SamplerSet, TextureSet};
use crate::ubo::MvpUbo;

/// Pool capacities for `frame_count` sets over `sampler_count` samplers and
/// `texture_count` textures: `frame_count x {1, samplers, textures}` per
/// descriptor type.
pub fn pool_sizes(
    frame_count: u32,
    sampler_count: u32,
    texture_count: u32,
) -> [vk::DescriptorPoolSize; 3] {
    [
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: frame_count,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::SAMPLER,
            descriptor_count: frame_count * sampler_count,
        },
        vk::DescriptorPoolSize {
            ty: vk::DescriptorType::SAMPLED_IMAGE,
            descriptor_count: frame_count * texture_count,
        },
    ]
}

/// Layout, pool and per-frame descriptor sets for the mesh pipeline.
pub struct DescriptorState {
    /// Three-binding layout described in the module docs.
    layout: DescriptorSetLayout,
    /// Pool sized exactly for the per-frame sets; owns the sets.
    _pool: DescriptorPool,
    /// One set per frame slot.
    sets: Vec<vk::DescriptorSet>,
}

impl DescriptorState {
    /// Builds the layout, pool, and sets, and writes every binding.
    ///
    /// `uniform_buffers` must hold one buffer per frame slot; its length
    /// decides the set count.
    ///
    /// # Errors
    ///
    /// Returns an error if layout/pool creation or set allocation fails.
    pub fn new(
        device: &Arc<Device>,
        uniform_buffers: &[Buffer],
        samplers: &SamplerSet,
        textures: &TextureSet,
    ) -> RhiResult<Self> {
        let frame_count = uniform_buffers.len() as u32;
        let sampler_count = samplers.len() as u32;
        let texture_count = textures.len() as u32;

        let bindings = [
            vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX),
            vk::DescriptorSetLayoutBinding::default()
                .binding(1)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .descriptor_count(sampler_count)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            vk::DescriptorSetLayoutBinding::default()
                .binding(2)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .descriptor_count(texture_count)
                .stage_flags(vk::ShaderStageFlags::FRAGMENT),
        ];

        // Only the texture array is variable-count
        let binding_flags = [
            vk::DescriptorBindingFlags::empty(),
            vk::DescriptorBindingFlags::empty(),
            vk::DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT,
        ];

        let layout =
            DescriptorSetLayout::with_binding_flags(device.clone(), &bindings, &binding_flags)?;

        let sizes = pool_sizes(frame_count, sampler_count, texture_count);
        let pool = DescriptorPool::new(device.clone(), frame_count, &sizes)?;

        let layouts = vec![layout.handle(); frame_count as usize];
        let variable_counts = vec![texture_count; frame_count as usize];
        let sets = pool.allocate_variable(&layouts, &variable_counts)?;

        write_sets(device, &sets, uniform_buffers, samplers, textures);

        info!(
            "Descriptor state built: {} set(s), {} sampler(s), {} texture(s)",
            frame_count, sampler_count, texture_count
        );

        Ok(Self {
            layout,
            _pool: pool,
            sets,
        })
    }

    /// Returns the descriptor set layout handle.
    #[inline]
    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout.handle()
    }

    /// Returns the descriptor set for a frame slot.
    ///
    /// # Panics
    ///
    /// Panics if `frame_index` is out of range.
    #[inline]
    pub fn set(&self, frame_index: usize) -> vk::DescriptorSet {
        self.sets[frame_index]
    }

    /// Number of allocated sets.
    #[inline]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}

/// Writes all three bindings of every per-frame set.
fn write_sets(
    device: &Arc<Device>,
    sets: &[vk::DescriptorSet],
    uniform_buffers: &[Buffer],
    samplers: &SamplerSet,
    textures: &TextureSet,
) {
    let sampler_infos: Vec<vk::DescriptorImageInfo> = samplers
        .handles()
        .into_iter()
        .map(|sampler| vk::DescriptorImageInfo::default().sampler(sampler))
        .collect();

    let texture_infos: Vec<vk::DescriptorImageInfo> = textures
        .image_views()
        .into_iter()
        .map(|view| {
            vk::DescriptorImageInfo::default()
                .image_view(view)
                .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        })
        .collect();

    for (&set, uniform) in sets.iter().zip(uniform_buffers) {
        let buffer_info = [vk::DescriptorBufferInfo::default()
            .buffer(uniform.handle())
            .offset(0)
            .range(MvpUbo::SIZE as vk::DeviceSize)];

        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(0)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info),
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(1)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::SAMPLER)
                .image_info(&sampler_infos),
            vk::WriteDescriptorSet::default()
                .dst_set(set)
                .dst_binding(2)
                .dst_array_element(0)
                .descriptor_type(vk::DescriptorType::SAMPLED_IMAGE)
                .image_info(&texture_infos),
        ];

        update_descriptor_sets(device, &writes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_sizes_scale_with_frame_count() {
        let sizes = pool_sizes(2, 2, 5);

        assert_eq!(sizes[0].ty, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(sizes[0].descriptor_count, 2);

        assert_eq!(sizes[1].ty, vk::DescriptorType::SAMPLER);
        assert_eq!(sizes[1].descriptor_count, 4);

        assert_eq!(sizes[2].ty, vk::DescriptorType::SAMPLED_IMAGE);
        assert_eq!(sizes[2].descriptor_count, 10);
    }

    #[test]
    fn pool_sizes_with_single_texture() {
        let sizes = pool_sizes(3, 2, 1);
        assert_eq!(sizes[0].descriptor_count, 3);
        assert_eq!(sizes[1].descriptor_count, 6);
        assert_eq!(sizes[2].descriptor_count, 3);
    }
}
