//! Descriptor layout, pool and set management.
//!
//! Supports plain layouts and layouts whose last binding carries the
//! VARIABLE_DESCRIPTOR_COUNT flag, which the renderer uses for its bindless
//! texture array.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Descriptor set layout wrapper.
pub struct DescriptorSetLayout {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor set layout handle.
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a layout from bindings with per-binding flags.
    ///
    /// `binding_flags` must be the same length as `bindings`; pass
    /// `vk::DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT` on the final
    /// binding to make its descriptor count an allocation-time parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn with_binding_flags(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
        binding_flags: &[vk::DescriptorBindingFlags],
    ) -> RhiResult<Self> {
        debug_assert_eq!(bindings.len(), binding_flags.len());

        let mut flags_info =
            vk::DescriptorSetLayoutBindingFlagsCreateInfo::default().binding_flags(binding_flags);

        let create_info = vk::DescriptorSetLayoutCreateInfo::default()
            .bindings(bindings)
            .push_next(&mut flags_info);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!("Created descriptor set layout with {} binding(s)", bindings.len());

        Ok(Self { device, layout })
    }

    /// Creates a layout from bindings without any binding flags.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let flags = vec![vk::DescriptorBindingFlags::empty(); bindings.len()];
        Self::with_binding_flags(device, bindings, &flags)
    }

    /// Returns the Vulkan descriptor set layout handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool wrapper.
///
/// Sets allocated from the pool are returned when the pool is destroyed;
/// this renderer never frees sets individually.
pub struct DescriptorPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan descriptor pool handle.
    pool: vk::DescriptorPool,
    /// Maximum number of sets the pool can hold.
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a descriptor pool.
    ///
    /// # Arguments
    ///
    /// * `max_sets` - Maximum number of sets allocatable from the pool
    /// * `pool_sizes` - Capacity per descriptor type
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, {} pool size(s)",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self {
            device,
            pool,
            max_sets,
        })
    }

    /// Allocates one set per layout, each with a variable descriptor count
    /// for its VARIABLE_DESCRIPTOR_COUNT binding.
    ///
    /// `variable_counts[i]` is the runtime size of the variable binding in
    /// set `i`.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails (for example pool exhaustion).
    pub fn allocate_variable(
        &self,
        layouts: &[vk::DescriptorSetLayout],
        variable_counts: &[u32],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        debug_assert_eq!(layouts.len(), variable_counts.len());

        let mut count_info = vk::DescriptorSetVariableDescriptorCountAllocateInfo::default()
            .descriptor_counts(variable_counts);

        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts)
            .push_next(&mut count_info);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    /// Returns the Vulkan descriptor pool handle.
    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    /// Returns the maximum number of sets allocatable from this pool.
    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool");
    }
}

/// Applies descriptor writes.
pub fn update_descriptor_sets(device: &Device, writes: &[vk::WriteDescriptorSet]) {
    if writes.is_empty() {
        return;
    }

    unsafe {
        device.handle().update_descriptor_sets(writes, &[]);
    }
}
