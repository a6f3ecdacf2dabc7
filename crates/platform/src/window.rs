//! Window management and Vulkan surface creation.

use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use glaze_core::{Error, Result};

/// RAII wrapper for a Vulkan surface.
///
/// The surface loader is stored so the handle can be destroyed without
/// reaching back into the instance. The instance must outlive this struct.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    /// Get the raw Vulkan surface handle.
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// Get the surface extension loader for capability queries.
    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

/// Window wrapper tracking the current framebuffer size.
///
/// The stored size is updated by the event loop on resize events and read
/// by the renderer when it rebuilds swap targets; this is the explicit
/// replacement for reaching window state through a user-data pointer.
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
}

impl Window {
    /// Create a window with the given dimensions and title.
    pub fn new(event_loop: &ActiveEventLoop, width: u32, height: u32, title: &str) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height))
            .with_resizable(true);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        tracing::info!("Window created: {}x{}", width, height);

        Ok(Self {
            window: Arc::new(window),
            width,
            height,
        })
    }

    /// Current framebuffer width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Current framebuffer height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the window is currently minimized (zero-sized framebuffer).
    #[inline]
    pub fn is_minimized(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Record a new framebuffer size from a resize event.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        tracing::debug!("Window resized: {}x{}", width, height);
    }

    /// Update the window title.
    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    /// Request a redraw.
    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Create a Vulkan surface for this window.
    ///
    /// # Errors
    ///
    /// Returns an error if the raw handles cannot be obtained or surface
    /// creation fails.
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("failed to get display handle: {e}")))?;
        let window_handle = self
            .window
            .window_handle()
            .map_err(|e| Error::Window(format!("failed to get window handle: {e}")))?;

        let handle = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| Error::Vulkan(format!("failed to create surface: {e}")))?
        };

        let surface_loader = ash::khr::surface::Instance::new(entry, instance);

        tracing::info!("Vulkan surface created");

        Ok(Surface {
            handle,
            surface_loader,
        })
    }

    /// Instance extensions required to create a surface for this window's
    /// display.
    pub fn required_extensions(&self) -> Result<Vec<*const i8>> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("failed to get display handle: {e}")))?;
        required_surface_extensions(display_handle.as_raw())
    }
}

/// Instance extensions required for surface creation on a display.
pub fn required_surface_extensions(
    display_handle: raw_window_handle::RawDisplayHandle,
) -> Result<Vec<*const i8>> {
    let extensions = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| Error::Vulkan(format!("failed to enumerate surface extensions: {e}")))?;

    Ok(extensions.to_vec())
}
