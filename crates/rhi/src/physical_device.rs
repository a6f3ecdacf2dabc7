//! Physical device (GPU) selection.
//!
//! Selection walks the enumerated GPUs in order and picks the first one that
//! satisfies every renderer requirement:
//! 1. Graphics and present queue families for the given surface
//! 2. The required device extensions
//! 3. At least one surface format and one present mode
//! 4. Sampler anisotropy
//! 5. The descriptor indexing features backing the bindless texture array

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;
use crate::swapchain::SwapchainSupportDetails;

/// Device extensions every selected GPU must expose.
pub const DEVICE_EXTENSIONS: &[&CStr] = &[
    ash::khr::swapchain::NAME,
    ash::khr::maintenance1::NAME,
    ash::khr::maintenance3::NAME,
    ash::ext::descriptor_indexing::NAME,
];

/// Queue family indices for the two queues the renderer drives.
///
/// The graphics and present families may resolve to the same index; device
/// creation deduplicates them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Index of the queue family that supports graphics operations.
    pub graphics_family: Option<u32>,
    /// Index of the queue family that can present to the surface.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Both required families were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Returns the distinct queue family indices.
    ///
    /// Logical device creation must request one queue per DISTINCT family,
    /// never one per logical role.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);

        if let Some(graphics) = self.graphics_family {
            families.push(graphics);
        }
        if let Some(present) = self.present_family
            && !families.contains(&present)
        {
            families.push(present);
        }

        families
    }
}

/// The physical device chosen for rendering plus everything device creation
/// needs to know about it.
#[derive(Clone)]
pub struct SelectedGpu {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version).
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue family indices for graphics and present.
    pub queue_families: QueueFamilyIndices,
}

impl SelectedGpu {
    /// Returns the device name as a string.
    pub fn name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    /// Maximum sampler anisotropy supported by the device.
    #[inline]
    pub fn max_sampler_anisotropy(&self) -> f32 {
        self.properties.limits.max_sampler_anisotropy
    }
}

/// Selects the first physical device satisfying the renderer requirements.
///
/// The chosen device name is logged; this is diagnostic only.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableDevice`] if no GPU qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<SelectedGpu, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableDevice);
    }

    debug!("Found {} GPU(s)", devices.len());

    for device in devices {
        if let Some(selected) = check_suitability(instance, device, surface, surface_loader) {
            info!("GPU picked: {}", selected.name());
            return Ok(selected);
        }
    }

    warn!("No GPU satisfies the renderer requirements");
    Err(RhiError::NoSuitableDevice)
}

/// Returns `Some(SelectedGpu)` when the device meets every requirement.
fn check_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<SelectedGpu> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let name = unsafe {
        CStr::from_ptr(properties.device_name.as_ptr())
            .to_str()
            .unwrap_or("Unknown")
    };

    let queue_families = find_queue_families(instance, device, surface, surface_loader);
    if !queue_families.is_complete() {
        debug!("GPU '{}' skipped: missing graphics or present queue family", name);
        return None;
    }

    if !supports_extensions(instance, device) {
        debug!("GPU '{}' skipped: missing required device extensions", name);
        return None;
    }

    // Extension support does not imply a usable surface pairing
    let adequate = SwapchainSupportDetails::query(device, surface, surface_loader)
        .map(|support| support.is_adequate())
        .unwrap_or(false);
    if !adequate {
        debug!("GPU '{}' skipped: no surface formats or present modes", name);
        return None;
    }

    if !supports_required_features(instance, device) {
        debug!(
            "GPU '{}' skipped: missing anisotropy or descriptor indexing features",
            name
        );
        return None;
    }

    Some(SelectedGpu {
        device,
        properties,
        queue_families,
    })
}

/// Checks that every entry of [`DEVICE_EXTENSIONS`] is available.
fn supports_extensions(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    let available = match unsafe { instance.enumerate_device_extension_properties(device) } {
        Ok(extensions) => extensions,
        Err(_) => return false,
    };

    DEVICE_EXTENSIONS.iter().all(|required| {
        available.iter().any(|ext| {
            let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
            name == *required
        })
    })
}

/// Checks sampler anisotropy and the descriptor indexing feature set needed
/// for the variable-count sampled-image binding.
fn supports_required_features(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    let mut indexing = vk::PhysicalDeviceDescriptorIndexingFeatures::default();

    let base_features_ok = {
        let mut features = vk::PhysicalDeviceFeatures2::default().push_next(&mut indexing);
        unsafe { instance.get_physical_device_features2(device, &mut features) };

        features.features.sampler_anisotropy == vk::TRUE
            && features.features.shader_sampled_image_array_dynamic_indexing == vk::TRUE
    };

    base_features_ok
        && indexing.shader_sampled_image_array_non_uniform_indexing == vk::TRUE
        && indexing.runtime_descriptor_array == vk::TRUE
        && indexing.descriptor_binding_variable_descriptor_count == vk::TRUE
}

/// Finds graphics and present queue family indices for the surface.
fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> QueueFamilyIndices {
    let queue_families =
        unsafe { instance.get_physical_device_queue_family_properties(device) };

    let mut indices = QueueFamilyIndices::default();

    for (i, family) in queue_families.iter().enumerate() {
        let i = i as u32;

        if family.queue_count == 0 {
            continue;
        }

        if indices.graphics_family.is_none()
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            indices.graphics_family = Some(i);
        }

        if indices.present_family.is_none() {
            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, i, surface)
                    .unwrap_or(false)
            };
            if present_support {
                indices.present_family = Some(i);
            }
        }

        if indices.is_complete() {
            break;
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_extensions_include_swapchain_and_indexing() {
        assert!(DEVICE_EXTENSIONS.contains(&ash::khr::swapchain::NAME));
        assert!(DEVICE_EXTENSIONS.contains(&ash::ext::descriptor_indexing::NAME));
    }

    #[test]
    fn queue_family_indices_completeness() {
        let mut indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());

        indices.graphics_family = Some(0);
        assert!(!indices.is_complete());

        indices.present_family = Some(1);
        assert!(indices.is_complete());
    }

    #[test]
    fn unique_families_deduplicates_shared_family() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        assert_eq!(indices.unique_families(), vec![0]);
    }

    #[test]
    fn unique_families_keeps_distinct_families() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert_eq!(indices.unique_families(), vec![0, 2]);
    }
}
