//! Frame timing.
//!
//! [`FrameClock`] measures wall-clock time between frames and keeps an
//! exponentially smoothed frame rate. Every call to [`FrameClock::tick`]
//! yields a [`FrameSample`] that the engine consumes for one frame.
//!
//! # Example
//!
//! ```ignore
//! use mandala::time::FrameClock;
//!
//! let mut clock = FrameClock::new();
//!
//! // In your frame loop:
//! let sample = clock.tick();
//! scene.step(sample.clamped_dt());
//!
//! println!("FPS: {:.1}", sample.smoothed_fps);
//! ```

use std::time::Instant;

/// Largest time step fed to the simulation, in seconds.
pub const MAX_DT: f32 = 0.05;

/// Weight of the newest sample in the smoothed frame rate.
pub const FPS_SMOOTHING: f64 = 0.1;

/// Timing information for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    /// Raw seconds since the previous frame.
    pub dt: f32,
    /// `1 / dt`, or 0 when `dt` is zero.
    pub fps_instant: f64,
    /// Exponentially smoothed frame rate.
    pub smoothed_fps: f64,
    /// Seconds since the clock started.
    pub elapsed: f64,
    /// Index of this frame, starting at 1.
    pub frame: u64,
}

impl FrameSample {
    /// `dt` clamped to `[0, MAX_DT]`.
    #[inline]
    pub fn clamped_dt(&self) -> f32 {
        clamp_dt(self.dt)
    }
}

/// Clamp a raw frame time so scheduling hiccups cannot destabilise integration.
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_DT)
    } else {
        0.0
    }
}

/// Wall-clock frame timer with a smoothed FPS estimate.
#[derive(Debug)]
pub struct FrameClock {
    /// When the clock was created.
    start: Instant,
    /// When the last frame occurred.
    last_frame: Instant,
    /// Accumulated seconds for manually fed samples.
    manual_elapsed: f64,
    /// Total frames since start.
    frame_count: u64,
    smoothed_fps: f64,
    seeded: bool,
}

impl FrameClock {
    /// Create a clock whose first `tick` measures from now.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            manual_elapsed: 0.0,
            frame_count: 0,
            smoothed_fps: 0.0,
            seeded: false,
        }
    }

    /// Measure the time since the previous tick. Call once per frame.
    pub fn tick(&mut self) -> FrameSample {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f64();
        self.last_frame = now;
        let elapsed = now.duration_since(self.start).as_secs_f64();
        self.sample(dt, elapsed)
    }

    /// Feed a frame time instead of measuring one.
    ///
    /// Elapsed time then advances by exactly `dt`, which makes runs
    /// reproducible.
    pub fn record(&mut self, dt: f32) -> FrameSample {
        let dt = f64::from(dt.max(0.0));
        self.manual_elapsed += dt;
        self.sample(dt, self.manual_elapsed)
    }

    fn sample(&mut self, dt: f64, elapsed: f64) -> FrameSample {
        let fps_instant = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        if self.seeded {
            self.smoothed_fps =
                FPS_SMOOTHING * fps_instant + (1.0 - FPS_SMOOTHING) * self.smoothed_fps;
        } else if fps_instant > 0.0 {
            self.smoothed_fps = fps_instant;
            self.seeded = true;
        }
        self.frame_count += 1;

        FrameSample {
            dt: dt as f32,
            fps_instant,
            smoothed_fps: self.smoothed_fps,
            elapsed,
            frame: self.frame_count,
        }
    }

    /// Seconds since the clock was created.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Current smoothed frame rate, 0 before the first non-zero sample.
    #[inline]
    pub fn smoothed_fps(&self) -> f64 {
        self.smoothed_fps
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
