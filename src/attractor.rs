//! Moving attractor targets.
//!
//! Three attractors drift around the scene centre on independent sine
//! waves per axis. Their position is a pure function of elapsed time, so
//! no integration error accumulates no matter how long the run lasts.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::rng::RandomSource;

/// Number of attractors in a scene. The guide triangle assumes exactly three.
pub const NUM_ATTRACTORS: usize = 3;

/// A single oscillating target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attractor {
    /// Current position, recomputed by [`AttractorField::update`].
    pub position: Vec2,
    /// Oscillation amplitude per axis, in pixels.
    pub amplitude: Vec2,
    /// Angular frequency per axis, in rad/s.
    pub frequency: Vec2,
    /// Phase offset per axis, in radians.
    pub phase: Vec2,
}

impl Attractor {
    /// Position at time `t` for an attractor oscillating around `center`.
    #[inline]
    pub fn position_at(&self, center: Vec2, t: f32) -> Vec2 {
        Vec2::new(
            center.x + self.amplitude.x * (self.frequency.x * t + self.phase.x).sin(),
            center.y + self.amplitude.y * (self.frequency.y * t + self.phase.y).sin(),
        )
    }
}

/// The fixed set of attractors orbiters track.
#[derive(Debug, Clone)]
pub struct AttractorField {
    attractors: [Attractor; NUM_ATTRACTORS],
    center: Vec2,
}

impl AttractorField {
    /// Place all attractors at the scene centre with random motion parameters.
    ///
    /// Amplitudes are 20%-35% of the scene dimension on each axis, frequencies
    /// 0.05-0.15 Hz and phases uniform in `[0, 2pi)`.
    pub fn new(width: f32, height: f32, rng: &mut RandomSource) -> Self {
        let center = Vec2::new(width * 0.5, height * 0.5);
        let attractors = std::array::from_fn(|_| {
            let amplitude = Vec2::new(
                rng.range(width * 0.20, width * 0.35),
                rng.range(height * 0.20, height * 0.35),
            );
            let fx_hz = rng.range(0.05, 0.15);
            let fy_hz = rng.range(0.05, 0.15);
            let phase = Vec2::new(rng.range(0.0, TAU), rng.range(0.0, TAU));
            Attractor {
                position: center,
                amplitude,
                frequency: Vec2::new(TAU * fx_hz, TAU * fy_hz),
                phase,
            }
        });
        Self { attractors, center }
    }

    /// Build a field from explicit attractors. Positions are taken as given
    /// until the next [`update`](Self::update).
    pub fn from_attractors(attractors: [Attractor; NUM_ATTRACTORS], center: Vec2) -> Self {
        Self { attractors, center }
    }

    /// Recompute every attractor position for elapsed time `t` (seconds).
    pub fn update(&mut self, t: f32) {
        let center = self.center;
        for a in &mut self.attractors {
            a.position = a.position_at(center, t);
        }
    }

    /// The attractors, read-only.
    #[inline]
    pub fn attractors(&self) -> &[Attractor; NUM_ATTRACTORS] {
        &self.attractors
    }

    /// Current positions of all attractors.
    pub fn positions(&self) -> [Vec2; NUM_ATTRACTORS] {
        self.attractors.map(|a| a.position)
    }

    /// Centre the attractors oscillate around.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }
}
