//! Texture samplers.
//!
//! The renderer carries a small fixed list of samplers; each vertex selects
//! one by index at draw time. Both samplers use repeat addressing and the
//! device's maximum anisotropy, differing only in their filtering mode.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Filtering mode; the discriminant is the index vertices use to pick the
/// sampler from the descriptor array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum FilterMode {
    /// Nearest-neighbor filtering
    Nearest = 0,
    /// Linear filtering
    Linear = 1,
}

impl FilterMode {
    /// Converts to the Vulkan filter.
    pub fn to_vk_filter(self) -> vk::Filter {
        match self {
            FilterMode::Nearest => vk::Filter::NEAREST,
            FilterMode::Linear => vk::Filter::LINEAR,
        }
    }

    /// Index of this mode in the sampler array.
    #[inline]
    pub fn index(self) -> i32 {
        self as i32
    }
}

/// Vulkan sampler wrapper.
pub struct Sampler {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan sampler handle.
    sampler: vk::Sampler,
    /// Filtering mode this sampler was built with.
    mode: FilterMode,
}

impl Sampler {
    /// Creates a sampler for the given filtering mode.
    ///
    /// Mip filtering follows the min/mag filter, addressing is repeat in all
    /// dimensions, anisotropy is enabled at the device maximum, and the full
    /// mip chain is addressable.
    ///
    /// # Errors
    ///
    /// Returns an error if sampler creation fails.
    pub fn new(device: Arc<Device>, mode: FilterMode) -> RhiResult<Self> {
        let filter = mode.to_vk_filter();
        let mipmap_mode = match mode {
            FilterMode::Nearest => vk::SamplerMipmapMode::NEAREST,
            FilterMode::Linear => vk::SamplerMipmapMode::LINEAR,
        };

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap_mode)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(true)
            .max_anisotropy(device.max_sampler_anisotropy())
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE);

        let sampler = unsafe { device.handle().create_sampler(&create_info, None)? };

        debug!("Created {:?} sampler", mode);

        Ok(Self {
            device,
            sampler,
            mode,
        })
    }

    /// Returns the Vulkan sampler handle.
    #[inline]
    pub fn handle(&self) -> vk::Sampler {
        self.sampler
    }

    /// Returns the filtering mode.
    #[inline]
    pub fn mode(&self) -> FilterMode {
        self.mode
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
        debug!("Destroyed {:?} sampler", self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_mode_indices_are_stable() {
        // Shaders index the sampler array with these values
        assert_eq!(FilterMode::Nearest.index(), 0);
        assert_eq!(FilterMode::Linear.index(), 1);
    }

    #[test]
    fn filter_mode_vk_mapping() {
        assert_eq!(FilterMode::Nearest.to_vk_filter(), vk::Filter::NEAREST);
        assert_eq!(FilterMode::Linear.to_vk_filter(), vk::Filter::LINEAR);
    }
}
