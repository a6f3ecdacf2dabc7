//! Frame timing.

use std::time::Instant;

/// Tracks per-frame delta time and a once-per-second FPS figure.
#[derive(Debug)]
pub struct FrameTimer {
    last_frame: Instant,
    window_start: Instant,
    frames_in_window: u32,
    fps: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            window_start: now,
            frames_in_window: 0,
            fps: 0.0,
        }
    }

    /// Advance to the next frame and return the elapsed time in seconds
    /// since the previous call.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.frames_in_window += 1;
        let window = now.duration_since(self.window_start).as_secs_f32();
        if window >= 1.0 {
            self.fps = self.frames_in_window as f32 / window;
            self.frames_in_window = 0;
            self.window_start = now;
        }

        delta
    }

    /// Frames per second, averaged over the last completed one-second window.
    /// Zero until the first window elapses.
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_returns_nonnegative_delta() {
        let mut timer = FrameTimer::new();
        assert!(timer.tick() >= 0.0);
        assert!(timer.tick() >= 0.0);
    }

    #[test]
    fn fps_starts_at_zero() {
        let timer = FrameTimer::new();
        assert_eq!(timer.fps(), 0.0);
    }
}
