//! Command pool management and one-shot transfer submissions.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan command pool wrapper.
///
/// Created with the `RESET_COMMAND_BUFFER` flag so the per-frame buffers can
/// be reset individually every iteration.
pub struct CommandPool {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan command pool handle.
    pool: vk::CommandPool,
    /// Queue family this pool allocates for.
    queue_family_index: u32,
}

impl CommandPool {
    /// Creates a command pool for the given queue family.
    ///
    /// # Errors
    ///
    /// Returns an error if command pool creation fails.
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };

        debug!("Command pool created for queue family {}", queue_family_index);

        Ok(Self {
            device,
            pool,
            queue_family_index,
        })
    }

    /// Returns the Vulkan command pool handle.
    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    /// Returns the queue family this pool belongs to.
    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Allocates `count` primary command buffers.
    ///
    /// The buffers are returned to the pool when it is destroyed; callers
    /// that recycle buffers early use [`free_command_buffers`](Self::free_command_buffers).
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffers(&self, count: u32) -> RhiResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        let buffers = unsafe { self.device.handle().allocate_command_buffers(&alloc_info)? };

        debug!("Allocated {} command buffer(s)", count);

        Ok(buffers)
    }

    /// Returns command buffers to the pool.
    pub fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        if buffers.is_empty() {
            return;
        }
        unsafe {
            self.device.handle().free_command_buffers(self.pool, buffers);
        }
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        debug!("Command pool destroyed");
    }
}

/// Records and synchronously executes a one-shot command buffer on the
/// graphics queue.
///
/// Used for startup transfers only (staging copies, image layout
/// transitions, mipmap generation): the submission is followed by a blocking
/// queue wait, which is unacceptable per frame but fine once at
/// initialization.
///
/// # Errors
///
/// Returns an error if allocation, recording, or submission fail. The
/// transient buffer is freed on every path.
pub fn submit_one_shot<F>(device: &Device, pool: &CommandPool, record: F) -> RhiResult<()>
where
    F: FnOnce(vk::CommandBuffer),
{
    let alloc_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool.handle())
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);

    let buffers = unsafe { device.handle().allocate_command_buffers(&alloc_info)? };
    let cmd = buffers[0];

    let result = (|| -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            device.handle().begin_command_buffer(cmd, &begin_info)?;
        }

        record(cmd);

        let command_buffers = [cmd];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        unsafe {
            device.handle().end_command_buffer(cmd)?;
            device
                .handle()
                .queue_submit(device.graphics_queue(), &[submit_info], vk::Fence::null())?;
            device.handle().queue_wait_idle(device.graphics_queue())?;
        }

        Ok(())
    })();

    unsafe {
        device.handle().free_command_buffers(pool.handle(), &buffers);
    }

    result
}
