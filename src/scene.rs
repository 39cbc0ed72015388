//! The simulated scene: attractors, orbiters and the symmetry renderer.
//!
//! A [`Scene`] advances in fixed order each frame. Attractors are
//! re-evaluated for the new time, orbiters integrate towards them, then the
//! per-particle draw data is rebuilt from the updated positions. The two
//! parallel passes never overlap.

use glam::Vec2;

use crate::attractor::{AttractorField, NUM_ATTRACTORS};
use crate::config::StaticConfig;
use crate::error::SceneError;
use crate::orbiter::{Orbiter, OrbiterSystem};
use crate::parallel::Workers;
use crate::render::Renderer;
use crate::rng::RandomSource;
use crate::symmetry::{FrameParams, ParticleStyle, PrecomputedParticle, SymmetryRenderer};

/// Simulation state plus the per-frame draw data derived from it.
#[derive(Debug)]
pub struct Scene {
    attractors: AttractorField,
    orbiters: OrbiterSystem,
    symmetry: SymmetryRenderer,
    workers: Workers,
    style: ParticleStyle,
    time: f32,
}

impl Scene {
    /// Build a seeded scene for `config`.
    pub fn new(config: &StaticConfig) -> Result<Self, SceneError> {
        let (width, height) = (config.width as f32, config.height as f32);
        let mut rng = RandomSource::new(config.seed);

        // Attractors start at the centre, so the first frames bloom outwards.
        let attractors = AttractorField::new(width, height, &mut rng);
        let orbiters =
            OrbiterSystem::new(config.n, &attractors.positions(), width, height, &mut rng)?;
        let workers = Workers::new(config.threads)?;
        let style = ParticleStyle {
            palette: config.palette,
            saturation: config.saturation,
            point_scale: config.point_scale,
        };

        Self::from_parts(attractors, orbiters, style, workers, width, height)
    }

    /// Assemble a scene from explicit parts.
    pub fn from_parts(
        attractors: AttractorField,
        orbiters: OrbiterSystem,
        style: ParticleStyle,
        workers: Workers,
        width: f32,
        height: f32,
    ) -> Result<Self, SceneError> {
        let mut symmetry = SymmetryRenderer::new(width, height, orbiters.len())?;
        symmetry.precompute(orbiters.orbiters(), &style, 0.0, &workers);
        Ok(Self {
            attractors,
            orbiters,
            symmetry,
            workers,
            style,
            time: 0.0,
        })
    }

    /// Advance simulated time by `dt` seconds.
    ///
    /// `dt` should already be clamped, see [`clamp_dt`](crate::time::clamp_dt).
    pub fn step(&mut self, dt: f32) {
        self.time += dt;
        self.attractors.update(self.time);
        let targets = self.attractors.positions();
        self.orbiters.integrate(dt, &targets, &self.workers);
        self.symmetry
            .precompute(self.orbiters.orbiters(), &self.style, self.time, &self.workers);
    }

    /// Draw the current state.
    pub fn draw<R: Renderer>(&self, renderer: &mut R, params: &FrameParams) {
        self.symmetry
            .draw_frame(renderer, params, &self.attractors.positions(), self.time);
    }

    /// Simulated seconds since the scene was built.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.symmetry.center()
    }

    #[inline]
    pub fn attractor_positions(&self) -> [Vec2; NUM_ATTRACTORS] {
        self.attractors.positions()
    }

    #[inline]
    pub fn orbiters(&self) -> &[Orbiter] {
        self.orbiters.orbiters()
    }

    #[inline]
    pub fn particles(&self) -> &[PrecomputedParticle] {
        self.symmetry.particles()
    }

    /// Number of worker threads in use.
    #[inline]
    pub fn threads(&self) -> usize {
        self.workers.threads()
    }
}
