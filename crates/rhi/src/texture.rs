//! Sampled textures.
//!
//! A [`Texture`] is an R8G8B8A8_SRGB image with a full mip chain. Pixels are
//! uploaded through a staging buffer, the base level is copied in, and the
//! remaining levels are generated with linear blits. All transfer work runs
//! on one-shot command buffers at load time.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::buffer::{Buffer, BufferUsage};
use crate::command::{CommandPool, submit_one_shot};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;

/// Texel format for all sampled textures.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_SRGB;

/// Number of mip levels for a base image size.
#[inline]
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Sampled texture with managed memory.
///
/// Destruction order: image view, image, then the allocation.
pub struct Texture {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Vulkan image view handle.
    image_view: vk::ImageView,
    /// GPU memory allocation; taken in Drop.
    allocation: Option<Allocation>,
    /// Number of mip levels.
    mip_levels: u32,
    /// Base level extent.
    extent: vk::Extent2D,
}

impl Texture {
    /// Creates a texture from tightly packed RGBA8 pixels.
    ///
    /// The upload path: staging buffer write, layout transition of the whole
    /// mip chain to TRANSFER_DST, buffer-to-image copy of level 0, then a
    /// blit cascade that downsamples level by level and leaves every level
    /// in SHADER_READ_ONLY layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel slice does not match `width * height *
    /// 4`, if the device cannot linearly filter the texture format (needed
    /// for the blit cascade), or if any allocation or submission fails.
    pub fn from_rgba_pixels(
        device: Arc<Device>,
        instance: &Instance,
        pool: &CommandPool,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> RhiResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RhiError::InvalidArgument(format!(
                "pixel buffer is {} bytes, expected {} for {}x{} RGBA",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        let format_properties = unsafe {
            instance
                .handle()
                .get_physical_device_format_properties(device.physical_device(), TEXTURE_FORMAT)
        };
        if !format_properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR)
        {
            return Err(RhiError::InvalidArgument(
                "texture format does not support linear blitting".to_string(),
            ));
        }

        let mip_levels = mip_level_count(width, height);

        let staging = Buffer::new(
            device.clone(),
            BufferUsage::Staging,
            pixels.len() as vk::DeviceSize,
        )?;
        staging.write(0, pixels)?;

        let (image, allocation) = create_image(
            &device,
            width,
            height,
            mip_levels,
            TEXTURE_FORMAT,
            vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST
                | vk::ImageUsageFlags::SAMPLED,
        )?;

        let upload = submit_one_shot(&device, pool, |cmd| {
            transition_for_transfer(&device, cmd, image, mip_levels);
            copy_buffer_to_image(&device, cmd, staging.handle(), image, width, height);
            generate_mipmaps(&device, cmd, image, width, height, mip_levels);
        });

        if let Err(e) = upload {
            destroy_image(&device, image, allocation);
            return Err(e);
        }

        let image_view = match create_view(&device, image, mip_levels) {
            Ok(view) => view,
            Err(e) => {
                destroy_image(&device, image, allocation);
                return Err(e);
            }
        };

        debug!(
            "Created texture {}x{} with {} mip level(s)",
            width, height, mip_levels
        );

        Ok(Self {
            device,
            image,
            image_view,
            allocation: Some(allocation),
            mip_levels,
            extent: vk::Extent2D { width, height },
        })
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

    /// Returns the number of mip levels.
    #[inline]
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    /// Returns the base level extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_image_view(self.image_view, None);
        }
        if let Some(allocation) = self.allocation.take() {
            destroy_image(&self.device, self.image, allocation);
        }
        debug!(
            "Destroyed texture {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

/// Creates an optimal-tiling 2D image with device-local memory.
fn create_image(
    device: &Arc<Device>,
    width: u32,
    height: u32,
    mip_levels: u32,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
) -> RhiResult<(vk::Image, Allocation)> {
    let image_info = vk::ImageCreateInfo::default()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format)
        .extent(vk::Extent3D {
            width,
            height,
            depth: 1,
        })
        .mip_levels(mip_levels)
        .array_layers(1)
        .samples(vk::SampleCountFlags::TYPE_1)
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .initial_layout(vk::ImageLayout::UNDEFINED);

    let image = unsafe { device.handle().create_image(&image_info, None)? };

    let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

    let allocation = {
        let mut allocator = device.allocator().lock().unwrap();
        allocator.allocate(&AllocationCreateDesc {
            name: "texture",
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })
    };

    let allocation = match allocation {
        Ok(allocation) => allocation,
        Err(e) => {
            unsafe { device.handle().destroy_image(image, None) };
            return Err(e.into());
        }
    };

    if let Err(e) = unsafe {
        device
            .handle()
            .bind_image_memory(image, allocation.memory(), allocation.offset())
    } {
        destroy_image(device, image, allocation);
        return Err(e.into());
    }

    Ok((image, allocation))
}

fn destroy_image(device: &Arc<Device>, image: vk::Image, allocation: Allocation) {
    unsafe { device.handle().destroy_image(image, None) };
    let mut allocator = device.allocator().lock().unwrap();
    if let Err(e) = allocator.free(allocation) {
        tracing::error!("Failed to free image allocation: {:?}", e);
    }
}

fn create_view(device: &Arc<Device>, image: vk::Image, mip_levels: u32) -> RhiResult<vk::ImageView> {
    let view_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(TEXTURE_FORMAT)
        .subresource_range(
            vk::ImageSubresourceRange::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(mip_levels)
                .base_array_layer(0)
                .layer_count(1),
        );

    Ok(unsafe { device.handle().create_image_view(&view_info, None)? })
}

/// Transitions every mip level from UNDEFINED to TRANSFER_DST.
fn transition_for_transfer(device: &Device, cmd: vk::CommandBuffer, image: vk::Image, mip_levels: u32) {
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(vk::ImageLayout::UNDEFINED)
        .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(
            vk::ImageSubresourceRange::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .base_mip_level(0)
                .level_count(mip_levels)
                .base_array_layer(0)
                .layer_count(1),
        );

    unsafe {
        device.handle().cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::PipelineStageFlags::TRANSFER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
}

/// Copies the staging buffer into mip level 0.
fn copy_buffer_to_image(
    device: &Device,
    cmd: vk::CommandBuffer,
    buffer: vk::Buffer,
    image: vk::Image,
    width: u32,
    height: u32,
) {
    let region = vk::BufferImageCopy::default()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(
            vk::ImageSubresourceLayers::default()
                .aspect_mask(vk::ImageAspectFlags::COLOR)
                .mip_level(0)
                .base_array_layer(0)
                .layer_count(1),
        )
        .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
        .image_extent(vk::Extent3D {
            width,
            height,
            depth: 1,
        });

    unsafe {
        device.handle().cmd_copy_buffer_to_image(
            cmd,
            buffer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            &[region],
        );
    }
}

/// Blits each mip level from the one above it, finishing every level in
/// SHADER_READ_ONLY layout.
fn generate_mipmaps(
    device: &Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    width: u32,
    height: u32,
    mip_levels: u32,
) {
    let subresource = |mip: u32| {
        vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(mip)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1)
    };

    let mut mip_width = width as i32;
    let mut mip_height = height as i32;

    for level in 1..mip_levels {
        // Source level: TRANSFER_DST -> TRANSFER_SRC
        let to_src = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::TRANSFER_READ)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(subresource(level - 1));

        unsafe {
            device.handle().cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_src],
            );
        }

        let dst_width = (mip_width / 2).max(1);
        let dst_height = (mip_height / 2).max(1);

        let blit = vk::ImageBlit::default()
            .src_subresource(
                vk::ImageSubresourceLayers::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .mip_level(level - 1)
                    .base_array_layer(0)
                    .layer_count(1),
            )
            .src_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: mip_width,
                    y: mip_height,
                    z: 1,
                },
            ])
            .dst_subresource(
                vk::ImageSubresourceLayers::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .mip_level(level)
                    .base_array_layer(0)
                    .layer_count(1),
            )
            .dst_offsets([
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: dst_width,
                    y: dst_height,
                    z: 1,
                },
            ]);

        unsafe {
            device.handle().cmd_blit_image(
                cmd,
                image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );
        }

        // Source level is final: TRANSFER_SRC -> SHADER_READ_ONLY
        let to_shader = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_access_mask(vk::AccessFlags::TRANSFER_READ)
            .dst_access_mask(vk::AccessFlags::SHADER_READ)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(subresource(level - 1));

        unsafe {
            device.handle().cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_shader],
            );
        }

        mip_width = dst_width;
        mip_height = dst_height;
    }

    // The last level was only ever a blit destination
    let last = vk::ImageMemoryBarrier::default()
        .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
        .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
        .dst_access_mask(vk::AccessFlags::SHADER_READ)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(subresource(mip_levels - 1));

    unsafe {
        device.handle().cmd_pipeline_barrier(
            cmd,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[last],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_for_common_sizes() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 2), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(512, 128), 10);
        assert_eq!(mip_level_count(1000, 1000), 10);
    }

    #[test]
    fn texture_format_is_srgb() {
        assert_eq!(TEXTURE_FORMAT, vk::Format::R8G8B8A8_SRGB);
    }
}
