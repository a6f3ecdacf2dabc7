//! Per-frame-slot synchronization state.
//!
//! A frame slot owns the primitives pacing one CPU-recorded frame through
//! the GPU: the semaphore acquire signals and the fence the GPU signals on
//! completion. Render-finished semaphores deliberately live outside the
//! slots and are indexed by swap image, because the number of swap images
//! and the number of frame slots differ and presentation order need not
//! match submission order.

use std::sync::Arc;

use glaze_rhi::vk;
use tracing::debug;

use glaze_rhi::device::Device;
use glaze_rhi::sync::{Fence, Semaphore};
use glaze_rhi::RhiResult;

/// Synchronization primitives for one frame slot.
///
/// Lifecycle per slot: wait the fence (previous use complete), acquire with
/// the image-available semaphore, record, reset the fence, submit signaling
/// it. The fence starts signaled so the first wait falls through.
pub struct FrameSlot {
    /// Signaled when the acquired swap image is ready to be rendered to.
    image_available: Semaphore,
    /// Signaled by the GPU when this slot's submission completes.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>) -> RhiResult<Self> {
        let image_available = Semaphore::new(device.clone())?;
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            image_available,
            in_flight,
        })
    }

    /// Returns the image-available semaphore.
    #[inline]
    pub fn image_available(&self) -> &Semaphore {
        &self.image_available
    }

    /// Returns the in-flight fence.
    #[inline]
    pub fn in_flight(&self) -> &Fence {
        &self.in_flight
    }
}

/// All synchronization objects of the draw loop plus the current-slot
/// cursor.
///
/// Rebuilt wholesale on resize: semaphore counts are tied to the swap image
/// count, so recreation with a fresh `FrameSync` (slot cursor back at 0) is
/// the only supported update path.
pub struct FrameSync {
    /// Frame slots, length = frames in flight.
    slots: Vec<FrameSlot>,
    /// Render-finished semaphores, length = swap image count.
    render_finished: Vec<Semaphore>,
    /// Index of the slot the CPU records into next.
    current: usize,
}

impl FrameSync {
    /// Creates sync objects for `frame_count` slots and `image_count` swap
    /// images.
    ///
    /// # Errors
    ///
    /// Returns an error if any primitive creation fails; primitives created
    /// before the failure are released.
    pub fn new(device: &Arc<Device>, frame_count: usize, image_count: usize) -> RhiResult<Self> {
        let mut slots = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            slots.push(FrameSlot::new(device.clone())?);
        }

        let mut render_finished = Vec::with_capacity(image_count);
        for _ in 0..image_count {
            render_finished.push(Semaphore::new(device.clone())?);
        }

        debug!(
            "Frame sync created: {} slot(s), {} render-finished semaphore(s)",
            frame_count, image_count
        );

        Ok(Self {
            slots,
            render_finished,
            current: 0,
        })
    }

    /// Returns the current frame slot.
    #[inline]
    pub fn current_slot(&self) -> &FrameSlot {
        &self.slots[self.current]
    }

    /// Returns the current slot index.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Returns the render-finished semaphore for a swap image.
    ///
    /// # Panics
    ///
    /// Panics if `image_index` is out of range.
    #[inline]
    pub fn render_finished(&self, image_index: u32) -> vk::Semaphore {
        self.render_finished[image_index as usize].handle()
    }

    /// Advances the slot cursor round-robin.
    #[inline]
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slots.len();
    }

    /// Number of frame slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::MAX_FRAMES_IN_FLIGHT;

    #[test]
    fn frames_in_flight_is_small() {
        assert!(MAX_FRAMES_IN_FLIGHT >= 1);
        assert!(MAX_FRAMES_IN_FLIGHT <= 4);
    }

    #[test]
    fn slot_cursor_wraps_round_robin() {
        // Mirror of FrameSync::advance over plain indices: after three
        // advances from zero the cursor reads 3 mod F.
        let mut current = 0usize;
        for _ in 0..3 {
            current = (current + 1) % MAX_FRAMES_IN_FLIGHT;
        }
        assert_eq!(current, 3 % MAX_FRAMES_IN_FLIGHT);
    }
}
