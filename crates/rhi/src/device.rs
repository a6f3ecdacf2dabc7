//! Vulkan logical device and queue management.
//!
//! Creates the VkDevice with the extensions and descriptor-indexing features
//! validated during physical device selection, retrieves the graphics and
//! present queues, and initializes the gpu-allocator instance every buffer
//! and image allocation goes through.

use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, info};

use crate::error::RhiError;
use crate::instance::Instance;
use crate::physical_device::{DEVICE_EXTENSIONS, QueueFamilyIndices, SelectedGpu};

/// Vulkan logical device wrapper.
///
/// Shared across the renderer as `Arc<Device>`; every RAII resource wrapper
/// holds a clone, so the device outlives all of them regardless of drop
/// order. The allocator sits behind a `Mutex` because gpu-allocator requires
/// exclusive access for allocate/free.
pub struct Device {
    /// Vulkan logical device handle.
    device: ash::Device,
    /// Physical device handle.
    physical_device: vk::PhysicalDevice,
    /// GPU memory allocator.
    allocator: Mutex<Allocator>,
    /// Graphics queue handle.
    graphics_queue: vk::Queue,
    /// Presentation queue handle (may equal the graphics queue).
    present_queue: vk::Queue,
    /// Queue family indices.
    queue_families: QueueFamilyIndices,
    /// Maximum sampler anisotropy of the physical device.
    max_sampler_anisotropy: f32,
}

impl Device {
    /// Creates the logical device for a selected GPU.
    ///
    /// One queue is created per DISTINCT queue family from
    /// [`QueueFamilyIndices::unique_families`]. Enabled features are exactly
    /// the set selection verified: sampler anisotropy, dynamic and
    /// non-uniform sampled-image indexing, runtime descriptor arrays, and
    /// variable descriptor counts.
    ///
    /// # Errors
    ///
    /// Returns an error if device creation or allocator initialization fails.
    pub fn new(instance: &Instance, gpu: &SelectedGpu) -> Result<Arc<Self>, RhiError> {
        let queue_families = gpu.queue_families;

        let unique_families = queue_families.unique_families();
        let queue_priorities = [1.0f32];

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families: {:?}",
            queue_create_infos.len(),
            unique_families
        );

        let features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(true)
            .shader_sampled_image_array_dynamic_indexing(true);

        let mut indexing_features = vk::PhysicalDeviceDescriptorIndexingFeatures::default()
            .shader_sampled_image_array_non_uniform_indexing(true)
            .runtime_descriptor_array(true)
            .descriptor_binding_variable_descriptor_count(true);

        let extension_names: Vec<*const i8> =
            DEVICE_EXTENSIONS.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_names)
            .enabled_features(&features)
            .push_next(&mut indexing_features);

        let device = unsafe {
            instance
                .handle()
                .create_device(gpu.device, &create_info, None)?
        };

        info!(
            "Logical device created with {} extension(s)",
            DEVICE_EXTENSIONS.len()
        );

        let graphics_family = queue_families
            .graphics_family
            .ok_or(RhiError::NoSuitableDevice)?;
        let present_family = queue_families
            .present_family
            .ok_or(RhiError::NoSuitableDevice)?;

        let graphics_queue = unsafe { device.get_device_queue(graphics_family, 0) };
        let present_queue = unsafe { device.get_device_queue(present_family, 0) };
        debug!(
            "Queues retrieved (graphics family {}, present family {})",
            graphics_family, present_family
        );

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.handle().clone(),
            device: device.clone(),
            physical_device: gpu.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })?;

        info!("GPU memory allocator initialized");

        Ok(Arc::new(Self {
            device,
            physical_device: gpu.device,
            allocator: Mutex::new(allocator),
            graphics_queue,
            present_queue,
            queue_families,
            max_sampler_anisotropy: gpu.max_sampler_anisotropy(),
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Returns the graphics queue handle.
    #[inline]
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Returns the presentation queue handle.
    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Returns the queue family indices.
    #[inline]
    pub fn queue_families(&self) -> &QueueFamilyIndices {
        &self.queue_families
    }

    /// Returns a reference to the GPU memory allocator.
    #[inline]
    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.allocator
    }

    /// Maximum sampler anisotropy of the underlying physical device.
    #[inline]
    pub fn max_sampler_anisotropy(&self) -> f32 {
        self.max_sampler_anisotropy
    }

    /// Blocks until all queues are idle.
    ///
    /// Used before destroying swap-dependent resources and at shutdown;
    /// never on the per-frame hot path.
    pub fn wait_idle(&self) -> Result<(), RhiError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::error!("Failed to wait for device idle during drop: {:?}", e);
            }

            // The allocator drops with the Mutex; all allocations must have
            // been returned by the resource wrappers before this point.

            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

unsafe impl Send for Device {}
unsafe impl Sync for Device {}
