//! Spring-driven orbiter particles.
//!
//! Each orbiter chases a target point that circles one attractor. The
//! chase is a damped spring integrated with forward Euler:
//!
//! ```text
//! angle += omega * dt
//! target = attractor + radius * (cos angle, sin angle)
//! accel  = k * (target - position) - damping * velocity
//! velocity += accel * dt
//! position += velocity * dt
//! ```
//!
//! The caller clamps `dt`; nothing here does.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::attractor::NUM_ATTRACTORS;
use crate::error::SceneError;
use crate::parallel::Workers;
use crate::rng::RandomSource;

/// Sinusoidal size modulation ("breathing") of a rendered point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breathing {
    /// Base radius in pixels.
    pub base: f32,
    /// Extra radius at the top of a breath.
    pub amplitude: f32,
    /// Angular speed in rad/s.
    pub speed: f32,
    /// Phase offset in radians.
    pub phase: f32,
}

impl Breathing {
    /// Breath factor in `[0, 1]` at time `t`.
    #[inline]
    pub fn factor(&self, t: f32) -> f32 {
        0.5 + 0.5 * (self.speed * t + self.phase).sin()
    }
}

/// A single simulated particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbiter {
    pub position: Vec2,
    /// Position before the last integration step, for trails.
    pub previous: Vec2,
    pub velocity: Vec2,
    /// Index of the attractor this orbiter circles.
    pub attractor: usize,
    /// Current orbital angle in radians.
    pub angle: f32,
    /// Orbit radius in pixels.
    pub radius: f32,
    /// Orbital angular speed in rad/s.
    pub omega: f32,
    /// Spring constant.
    pub k: f32,
    pub damping: f32,
    pub breathing: Breathing,
}

impl Orbiter {
    /// Point on the orbit around `center` for the current angle.
    #[inline]
    pub fn target(&self, center: Vec2) -> Vec2 {
        center + self.radius * Vec2::new(self.angle.cos(), self.angle.sin())
    }

    /// Advance one explicit Euler step towards the orbit around `center`.
    #[inline]
    pub fn step(&mut self, center: Vec2, dt: f32) {
        self.previous = self.position;
        self.angle += self.omega * dt;
        let target = self.target(center);
        let accel = self.k * (target - self.position) - self.damping * self.velocity;
        self.velocity += accel * dt;
        self.position += self.velocity * dt;
    }

    /// Speed in pixels per second.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// The full particle array and its integrator.
#[derive(Debug, Clone)]
pub struct OrbiterSystem {
    orbiters: Vec<Orbiter>,
}

impl OrbiterSystem {
    /// Create `n` orbiters spread round-robin over the attractors.
    ///
    /// Every orbiter starts exactly on its orbit with zero velocity, so the
    /// spring starts at rest.
    pub fn new(
        n: usize,
        attractors: &[Vec2; NUM_ATTRACTORS],
        width: f32,
        height: f32,
        rng: &mut RandomSource,
    ) -> Result<Self, SceneError> {
        let mut orbiters = Vec::new();
        orbiters
            .try_reserve_exact(n)
            .map_err(|_| SceneError::OutOfMemory { what: "orbiters", count: n })?;

        let min_dim = width.min(height);
        let (min_r, max_r) = (min_dim * 0.08, min_dim * 0.38);
        for i in 0..n {
            let attractor = i % NUM_ATTRACTORS;
            let radius = rng.range(min_r, max_r);
            let angle = rng.range(0.0, TAU);
            let omega = TAU * rng.range(0.04, 0.35);
            let k = rng.range(4.0, 10.0);
            let damping = rng.range(1.4, 3.2);
            let breathing = Breathing {
                base: rng.range(2.0, 3.5),
                amplitude: rng.range(1.2, 2.8),
                speed: rng.range(0.6, 1.6) * TAU,
                phase: rng.range(0.0, TAU),
            };
            let mut orbiter = Orbiter {
                position: Vec2::ZERO,
                previous: Vec2::ZERO,
                velocity: Vec2::ZERO,
                attractor,
                angle,
                radius,
                omega,
                k,
                damping,
                breathing,
            };
            orbiter.position = orbiter.target(attractors[attractor]);
            orbiter.previous = orbiter.position;
            orbiters.push(orbiter);
        }
        Ok(Self { orbiters })
    }

    /// Wrap an explicit set of orbiters.
    pub fn from_orbiters(orbiters: Vec<Orbiter>) -> Self {
        Self { orbiters }
    }

    /// Advance every orbiter by `dt` seconds against the current attractor
    /// positions. Elements are independent, so the pass is split across
    /// `workers`.
    pub fn integrate(&mut self, dt: f32, attractors: &[Vec2; NUM_ATTRACTORS], workers: &Workers) {
        workers.for_each_mut(&mut self.orbiters, |o| o.step(attractors[o.attractor], dt));
    }

    #[inline]
    pub fn orbiters(&self) -> &[Orbiter] {
        &self.orbiters
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orbiters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orbiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_orbiter(k: f32, damping: f32) -> Orbiter {
        Orbiter {
            position: Vec2::new(100.0, 40.0),
            previous: Vec2::new(100.0, 40.0),
            velocity: Vec2::ZERO,
            attractor: 0,
            angle: 0.0,
            radius: 50.0,
            omega: 0.0,
            k,
            damping,
            breathing: Breathing {
                base: 2.0,
                amplitude: 1.0,
                speed: 1.0,
                phase: 0.0,
            },
        }
    }

    #[test]
    fn test_round_robin_assignment() {
        let mut rng = RandomSource::new(5);
        let centers = [Vec2::new(400.0, 300.0); NUM_ATTRACTORS];
        let system = OrbiterSystem::new(10, &centers, 800.0, 600.0, &mut rng).unwrap();
        for (i, o) in system.orbiters().iter().enumerate() {
            assert_eq!(o.attractor, i % NUM_ATTRACTORS);
        }
    }

    #[test]
    fn test_starts_on_orbit_at_rest() {
        let mut rng = RandomSource::new(6);
        let centers = [
            Vec2::new(400.0, 300.0),
            Vec2::new(200.0, 100.0),
            Vec2::new(500.0, 450.0),
        ];
        let system = OrbiterSystem::new(64, &centers, 800.0, 600.0, &mut rng).unwrap();
        for o in system.orbiters() {
            assert_eq!(o.velocity, Vec2::ZERO);
            assert_eq!(o.previous, o.position);
            assert!((o.position - o.target(centers[o.attractor])).length() < 1e-3);
            assert!(o.radius >= 48.0 && o.radius <= 228.0);
            assert!(o.k >= 4.0 && o.k <= 10.0);
            assert!(o.damping >= 1.4 && o.damping <= 3.2);
        }
    }

    #[test]
    fn test_step_records_previous() {
        let mut o = still_orbiter(5.0, 2.0);
        let before = o.position;
        o.step(Vec2::ZERO, 0.01);
        assert_eq!(o.previous, before);
        assert_ne!(o.position, before);
    }

    #[test]
    fn test_converges_to_still_target() {
        let mut o = still_orbiter(5.0, 2.0);
        let center = Vec2::new(300.0, 200.0);
        let start = (o.position - o.target(center)).length();
        for _ in 0..10_000 {
            o.step(center, 0.01);
        }
        let end = (o.position - o.target(center)).length();
        assert!(end < start);
        assert!(end < 1.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let centers = [
            Vec2::new(420.0, 310.0),
            Vec2::new(380.0, 280.0),
            Vec2::new(405.0, 330.0),
        ];
        let mut rng = RandomSource::new(11);
        let mut seq = OrbiterSystem::new(500, &centers, 800.0, 600.0, &mut rng).unwrap();
        let mut par = seq.clone();

        let one = Workers::new(1).unwrap();
        let four = Workers::new(4).unwrap();
        for _ in 0..200 {
            seq.integrate(1.0 / 60.0, &centers, &one);
            par.integrate(1.0 / 60.0, &centers, &four);
        }
        assert_eq!(seq.orbiters(), par.orbiters());
    }
}
