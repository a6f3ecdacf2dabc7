//! GPU-resident texture and sampler sets.
//!
//! Both sets are built once before the descriptor state and stay immutable
//! for the rest of the run; the descriptor sets reference every entry, and
//! vertices select among them by index.

use std::sync::Arc;

use glaze_rhi::vk;
use tracing::info;

use glaze_resources::TexturePixels;
use glaze_rhi::command::CommandPool;
use glaze_rhi::device::Device;
use glaze_rhi::instance::Instance;
use glaze_rhi::sampler::{FilterMode, Sampler};
use glaze_rhi::texture::Texture;
use glaze_rhi::RhiResult;

/// Dense list of sampled textures, in registry index order.
///
/// Index 0 is the default checkerboard the loader interns first.
pub struct TextureSet {
    textures: Vec<Texture>,
}

impl TextureSet {
    /// Uploads every decoded texture, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first upload failure; textures uploaded before it are
    /// released by their Drop impls.
    pub fn upload(
        device: Arc<Device>,
        instance: &Instance,
        pool: &CommandPool,
        pixels: &[TexturePixels],
    ) -> RhiResult<Self> {
        let mut textures = Vec::with_capacity(pixels.len());

        for entry in pixels {
            textures.push(Texture::from_rgba_pixels(
                device.clone(),
                instance,
                pool,
                &entry.pixels,
                entry.width,
                entry.height,
            )?);
        }

        info!("Uploaded {} texture(s) to the GPU", textures.len());

        Ok(Self { textures })
    }

    /// Number of textures.
    #[inline]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Image views in index order, as the descriptor write expects them.
    pub fn image_views(&self) -> Vec<vk::ImageView> {
        self.textures.iter().map(|t| t.image_view()).collect()
    }
}

/// The fixed sampler list: nearest at index 0, linear at index 1.
pub struct SamplerSet {
    samplers: Vec<Sampler>,
}

impl SamplerSet {
    /// Creates the two samplers.
    ///
    /// # Errors
    ///
    /// Returns an error if sampler creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let samplers = vec![
            Sampler::new(device.clone(), FilterMode::Nearest)?,
            Sampler::new(device, FilterMode::Linear)?,
        ];

        Ok(Self { samplers })
    }

    /// Number of samplers.
    #[inline]
    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }

    /// Sampler handles in index order.
    pub fn handles(&self) -> Vec<vk::Sampler> {
        self.samplers.iter().map(|s| s.handle()).collect()
    }
}
