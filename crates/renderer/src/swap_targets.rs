//! The swap target set: swapchain, shared depth buffer, and one framebuffer
//! per presentable image.
//!
//! The whole set is created and destroyed as a unit. Destruction order is
//! load-bearing: framebuffers reference the depth view and the color views,
//! the depth buffer holds its own image, and the color views belong to the
//! swapchain, so teardown runs framebuffers, then depth, then image views,
//! then the swapchain. The first step is explicit in `Drop`; the rest is
//! the struct's field declaration order.

use std::sync::Arc;

use glaze_rhi::vk;
use tracing::debug;

use glaze_rhi::device::Device;
use glaze_rhi::instance::Instance;
use glaze_rhi::render_pass::RenderPass;
use glaze_rhi::swapchain::Swapchain;
use glaze_rhi::{RhiError, RhiResult};

use crate::depth_buffer::DepthBuffer;

/// Swapchain plus all of its extent-dependent attachments.
///
/// Invariants: `framebuffers.len() == image_count`, and the depth buffer's
/// extent equals the swap extent.
pub struct SwapTargets {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// One framebuffer per swapchain image; destroyed first, explicitly.
    framebuffers: Vec<vk::Framebuffer>,
    /// Shared depth attachment; drops before the swapchain below.
    depth: DepthBuffer,
    /// Swapchain and color image views; drops last.
    swapchain: Swapchain,
}

impl SwapTargets {
    /// Builds the full swap target set for the current surface state.
    ///
    /// # Errors
    ///
    /// Returns an error if swapchain, depth, or framebuffer creation fails.
    /// Resources created before the failure are released through their Drop
    /// impls.
    pub fn new(
        device: Arc<Device>,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        render_pass: &RenderPass,
        depth_format: vk::Format,
        width: u32,
        height: u32,
    ) -> RhiResult<Self> {
        let swapchain = Swapchain::new(instance, device.clone(), surface, width, height)?;
        let extent = swapchain.extent();

        let depth = DepthBuffer::new(device.clone(), extent, depth_format)?;

        let framebuffers =
            create_framebuffers(&device, &swapchain, &depth, render_pass, extent)?;

        debug_assert_eq!(framebuffers.len(), swapchain.image_count() as usize);
        debug_assert_eq!(framebuffers.len(), swapchain.image_views().len());

        debug!(
            "Swap targets ready: {} framebuffers at {}x{}",
            framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(Self {
            device,
            framebuffers,
            depth,
            swapchain,
        })
    }

    /// Returns the swapchain.
    #[inline]
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Returns the current extent.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the number of presentable images.
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.swapchain.image_count()
    }

    /// Returns the depth buffer.
    #[inline]
    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    /// Returns the framebuffer for a swap image index.
    ///
    /// # Panics
    ///
    /// Panics if `image_index` is out of range.
    #[inline]
    pub fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        self.framebuffers[image_index as usize]
    }
}

impl Drop for SwapTargets {
    fn drop(&mut self) {
        for &framebuffer in &self.framebuffers {
            unsafe {
                self.device.handle().destroy_framebuffer(framebuffer, None);
            }
        }
        self.framebuffers.clear();
        // depth, then swapchain, drop in field order
        debug!("Swap target framebuffers destroyed");
    }
}

/// One framebuffer per color view, each pairing the color view with the
/// shared depth view.
fn create_framebuffers(
    device: &Arc<Device>,
    swapchain: &Swapchain,
    depth: &DepthBuffer,
    render_pass: &RenderPass,
    extent: vk::Extent2D,
) -> RhiResult<Vec<vk::Framebuffer>> {
    let mut framebuffers: Vec<vk::Framebuffer> =
        Vec::with_capacity(swapchain.image_views().len());

    for &color_view in swapchain.image_views() {
        let attachments = [color_view, depth.image_view()];

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.handle())
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = match unsafe { device.handle().create_framebuffer(&create_info, None) }
        {
            Ok(framebuffer) => framebuffer,
            Err(e) => {
                for &created in &framebuffers {
                    unsafe { device.handle().destroy_framebuffer(created, None) };
                }
                return Err(RhiError::from(e));
            }
        };
        framebuffers.push(framebuffer);
    }

    Ok(framebuffers)
}
