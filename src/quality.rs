//! Closed-loop quality adaptation.
//!
//! The controller watches the smoothed frame rate and nudges four knobs
//! by fixed steps, at most once per [`ADAPT_INTERVAL`] seconds of simulated
//! time:
//!
//! | FPS | action, first applicable wins |
//! |-----|-------------------------------|
//! | below `target - 1` | supersampling -1 (floor 1), render fraction -0.1 (floor 0.6), glow off, symmetry -1 (floor 4) |
//! | above `target + 8` | symmetry +1 (up to configured), render fraction +0.1 (up to 1.0) |
//!
//! Supersampling and glow only ever go down within a run.

use std::fmt;

/// Minimum simulated time between two evaluations.
pub const ADAPT_INTERVAL: f32 = 0.7;

/// Render fraction is never lowered below this.
pub const RENDER_FRACTION_FLOOR: f32 = 0.6;

/// Symmetry is never lowered below this.
pub const SYMMETRY_FLOOR: u32 = 4;

const RENDER_FRACTION_STEP: f32 = 0.1;
const EPSILON: f32 = 1e-4;

/// The knobs adjusted at runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveState {
    /// Supersampling factor, 1-4.
    pub supersampling: u32,
    /// Fraction of particles drawn, `(0, 1]`.
    pub render_fraction: f32,
    pub glow: bool,
    /// Rotational copies actually drawn.
    pub symmetry: u32,
}

/// A single step taken by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    ReduceSupersampling(u32),
    ReduceRenderFraction(f32),
    DisableGlow,
    ReduceSymmetry(u32),
    IncreaseSymmetry(u32),
    IncreaseRenderFraction(f32),
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::ReduceSupersampling(k) => write!(f, "ssaa -> {}", k),
            Adjustment::ReduceRenderFraction(r) => write!(f, "render fraction -> {:.2}", r),
            Adjustment::DisableGlow => write!(f, "glow -> off"),
            Adjustment::ReduceSymmetry(s) => write!(f, "symmetry -> {}", s),
            Adjustment::IncreaseSymmetry(s) => write!(f, "symmetry -> {}", s),
            Adjustment::IncreaseRenderFraction(r) => write!(f, "render fraction -> {:.2}", r),
        }
    }
}

/// Fixed-step controller trading fidelity for frame rate.
#[derive(Debug, Clone)]
pub struct QualityController {
    enabled: bool,
    target_fps: f32,
    max_symmetry: u32,
    last_eval: f32,
    state: AdaptiveState,
}

impl QualityController {
    /// Controller starting from `initial`; `initial.symmetry` is also the
    /// ceiling symmetry recovers to.
    pub fn new(enabled: bool, target_fps: f32, initial: AdaptiveState) -> Self {
        Self {
            enabled,
            target_fps,
            max_symmetry: initial.symmetry,
            last_eval: 0.0,
            state: initial,
        }
    }

    #[inline]
    pub fn state(&self) -> &AdaptiveState {
        &self.state
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record the supersampling factor actually in effect, e.g. after an
    /// allocation failure forced it down.
    pub fn sync_supersampling(&mut self, factor: u32) {
        self.state.supersampling = factor;
    }

    /// Evaluate at simulated time `now` against the smoothed frame rate.
    ///
    /// Returns the step taken, if any.
    pub fn maybe_adjust(&mut self, smoothed_fps: f64, now: f32) -> Option<Adjustment> {
        if !self.enabled || now - self.last_eval <= ADAPT_INTERVAL {
            return None;
        }
        self.last_eval = now;
        if smoothed_fps <= 0.0 {
            return None;
        }

        let fps = smoothed_fps as f32;
        if fps < self.target_fps - 1.0 {
            self.degrade()
        } else if fps > self.target_fps + 8.0 {
            self.upgrade()
        } else {
            None
        }
    }

    fn degrade(&mut self) -> Option<Adjustment> {
        let s = &mut self.state;
        if s.supersampling > 1 {
            s.supersampling -= 1;
            Some(Adjustment::ReduceSupersampling(s.supersampling))
        } else if s.render_fraction > RENDER_FRACTION_FLOOR + EPSILON {
            s.render_fraction =
                (s.render_fraction - RENDER_FRACTION_STEP).max(RENDER_FRACTION_FLOOR);
            Some(Adjustment::ReduceRenderFraction(s.render_fraction))
        } else if s.glow {
            s.glow = false;
            Some(Adjustment::DisableGlow)
        } else if s.symmetry > SYMMETRY_FLOOR {
            s.symmetry -= 1;
            Some(Adjustment::ReduceSymmetry(s.symmetry))
        } else {
            None
        }
    }

    fn upgrade(&mut self) -> Option<Adjustment> {
        let s = &mut self.state;
        if s.symmetry < self.max_symmetry {
            s.symmetry += 1;
            Some(Adjustment::IncreaseSymmetry(s.symmetry))
        } else if s.render_fraction < 1.0 - EPSILON {
            s.render_fraction = (s.render_fraction + RENDER_FRACTION_STEP).min(1.0);
            Some(Adjustment::IncreaseRenderFraction(s.render_fraction))
        } else {
            None
        }
    }
}
