//! Time management utilities

use std::time::{Duration, Instant};

/// Timing information handed to every component once per tick
///
/// The collision core never reads it; it only passes it through to
/// components that need it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Time since the previous tick
    pub delta: Duration,
    /// Accumulated simulated time, including this tick
    pub total: Duration,
    /// Zero-based index of this tick
    pub frame: u64,
}

impl FrameTime {
    /// Delta time in seconds
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// High-precision timer for frame timing
#[derive(Debug)]
pub struct Timer {
    last_frame: Instant,
    delta: Duration,
    total: Duration,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta: Duration::ZERO,
            total: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Update the timer from the wall clock (should be called once per frame)
    pub fn update(&mut self) -> FrameTime {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;
        self.advance(elapsed)
    }

    /// Advance the timer by a fixed step instead of the wall clock
    pub fn advance(&mut self, delta: Duration) -> FrameTime {
        let frame = FrameTime {
            delta,
            total: self.total + delta,
            frame: self.frame_count,
        };
        self.delta = delta;
        self.total = frame.total;
        self.frame_count += 1;
        frame
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total.as_secs_f32()
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the average FPS since timer creation
    pub fn average_fps(&self) -> f32 {
        let total = self.total_time();
        if total > 0.0 {
            self.frame_count as f32 / total
        } else {
            0.0
        }
    }
}
