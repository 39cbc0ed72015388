//! Radial-symmetry ("mandala") rendering.
//!
//! Every frame runs in two phases:
//!
//! 1. [`SymmetryRenderer::precompute`] turns each orbiter into a
//!    [`PrecomputedParticle`]: offsets from the scene centre, a breathing
//!    point radius and a palette colour. Elements are independent, so this
//!    runs on the worker pool.
//! 2. [`SymmetryRenderer::draw_frame`] issues draw calls on one thread: a
//!    translucent background fill (which is what fades old trails), then
//!    every sampled particle replicated `symmetry` times around the centre
//!    and optionally mirrored, then optional attractor guides.
//!
//! Rotation and mirroring act on the offset from the centre, never on world
//! position, so the pattern is always symmetric about the surface centre.
//! Per-copy alphas are divided by the number of copies so the overall
//! brightness stays roughly the same whatever the copy count.

use std::f32::consts::TAU;

use glam::Vec2;

use crate::attractor::NUM_ATTRACTORS;
use crate::color::Rgb;
use crate::error::SceneError;
use crate::orbiter::Orbiter;
use crate::parallel::Workers;
use crate::render::Renderer;
use crate::visuals::{BlendMode, Palette};

/// Maximum number of rotational copies.
pub const MAX_SYMMETRY: u32 = 8;

/// Smallest and largest rendered point radius, in pixels.
pub const MIN_POINT_RADIUS: u8 = 1;
pub const MAX_POINT_RADIUS: u8 = 3;

/// Extra radius from speed is `speed * SPEED_BOOST`, capped at `MAX_SPEED_BOOST`.
const SPEED_BOOST: f32 = 0.015;
const MAX_SPEED_BOOST: f32 = 2.0;

/// Number of small trailing discs behind each particle copy.
const TAIL_DISCS: u8 = 2;

/// Per-particle data for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PrecomputedParticle {
    /// Current position relative to the scene centre.
    pub offset: Vec2,
    /// Previous position relative to the scene centre.
    pub previous_offset: Vec2,
    /// Point radius in `[1, 3]`.
    pub radius: u8,
    pub color: Rgb,
}

/// Inputs to the per-particle precompute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    pub palette: Palette,
    pub saturation: f32,
    pub point_scale: f32,
}

/// Per-frame drawing knobs, combining fixed config and the adaptive state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub palette: Palette,
    pub background_alpha: u8,
    pub symmetry: u32,
    pub mirror: bool,
    pub glow: bool,
    pub trail: bool,
    pub render_fraction: f32,
    pub show_attractors: bool,
}

/// Alpha of each element of one particle copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyAlphas {
    pub trail: u8,
    /// Alpha of the first tail disc; disc `c` uses `tail / c`.
    pub tail: u8,
    /// Zero when glow is off.
    pub halo: u8,
    pub core: u8,
}

impl CopyAlphas {
    /// Alphas for `copies` copies of each particle.
    ///
    /// Every value is divided by the copy count and then raised to a floor,
    /// so faint elements never vanish completely.
    pub fn new(copies: u32, glow: bool) -> Self {
        let div = copies.max(1) as f32;
        let scale = if glow { 1.0 } else { 0.6 };
        Self {
            trail: (90.0 * scale / div).max(4.0) as u8,
            tail: (34.0 * scale / div).max(3.0) as u8,
            halo: if glow { (50.0 / div).max(8.0) as u8 } else { 0 },
            core: (210.0 / div).max(70.0) as u8,
        }
    }

    /// Alpha of tail disc `c` (1-based).
    #[inline]
    pub fn tail_disc(&self, c: u8) -> u8 {
        (self.tail as f32 / c as f32).max(3.0) as u8
    }
}

/// Draw every `stride`-th particle for a given render fraction.
pub fn render_stride(fraction: f32) -> usize {
    if fraction >= 0.999 {
        return 1;
    }
    ((1.0 / fraction.max(f32::EPSILON)).round() as usize).max(1)
}

/// Rotation table for up to [`MAX_SYMMETRY`] evenly spaced copies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotations {
    count: usize,
    table: [Vec2; MAX_SYMMETRY as usize],
}

impl Rotations {
    /// Copy `m` is rotated by `2 pi m / symmetry`. `symmetry` is clamped to `[1, 8]`.
    pub fn new(symmetry: u32) -> Self {
        let count = symmetry.clamp(1, MAX_SYMMETRY) as usize;
        let mut table = [Vec2::X; MAX_SYMMETRY as usize];
        for (m, slot) in table.iter_mut().enumerate().take(count) {
            *slot = Vec2::from_angle(TAU * m as f32 / count as f32);
        }
        Self { count, table }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Offset `v` rotated for copy `m`.
    #[inline]
    pub fn rotate(&self, m: usize, v: Vec2) -> Vec2 {
        self.table[m].rotate(v)
    }
}

/// Every on-screen copy of an offset, in draw order.
///
/// Copies are grouped by rotation; with `mirror` each rotation is followed
/// by its reflection about the vertical axis through `center`.
pub fn copy_positions(offset: Vec2, center: Vec2, symmetry: u32, mirror: bool) -> Vec<Vec2> {
    let rotations = Rotations::new(symmetry);
    let passes = if mirror { 2 } else { 1 };
    let mut out = Vec::with_capacity(rotations.len() * passes);
    for m in 0..rotations.len() {
        let p = center + rotations.rotate(m, offset);
        out.push(p);
        if mirror {
            out.push(mirror_x(p, center));
        }
    }
    out
}

#[inline]
fn mirror_x(p: Vec2, center: Vec2) -> Vec2 {
    Vec2::new(2.0 * center.x - p.x, p.y)
}

/// Breathing radius of an orbiter at time `t`, clamped to `[1, 3]`.
pub fn point_radius(orbiter: &Orbiter, point_scale: f32, t: f32) -> u8 {
    let breath = orbiter.breathing.factor(t);
    let base = orbiter.breathing.base * point_scale;
    let amp = orbiter.breathing.amplitude * point_scale;
    let boost = (orbiter.speed() * SPEED_BOOST).min(MAX_SPEED_BOOST);
    let r = (base + amp * breath + boost).round();
    r.clamp(MIN_POINT_RADIUS as f32, MAX_POINT_RADIUS as f32) as u8
}

/// Tracks the active blend mode so redundant switches are skipped.
struct BlendTracker(Option<BlendMode>);

impl BlendTracker {
    #[inline]
    fn set<R: Renderer>(&mut self, renderer: &mut R, mode: BlendMode) {
        if self.0 != Some(mode) {
            renderer.set_blend_mode(mode);
            self.0 = Some(mode);
        }
    }
}

/// Precomputes particles and draws the symmetric frame.
#[derive(Debug, Clone)]
pub struct SymmetryRenderer {
    center: Vec2,
    particles: Vec<PrecomputedParticle>,
}

impl SymmetryRenderer {
    /// Renderer for a `width x height` scene with room for `n` particles.
    pub fn new(width: f32, height: f32, n: usize) -> Result<Self, SceneError> {
        let mut particles = Vec::new();
        particles
            .try_reserve_exact(n)
            .map_err(|_| SceneError::OutOfMemory { what: "precomputed particles", count: n })?;
        particles.resize(n, PrecomputedParticle::default());
        Ok(Self {
            center: Vec2::new(width * 0.5, height * 0.5),
            particles,
        })
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    #[inline]
    pub fn particles(&self) -> &[PrecomputedParticle] {
        &self.particles
    }

    /// Rebuild the per-particle data from the current orbiter state.
    ///
    /// Must run after integration has finished for the frame.
    pub fn precompute(&mut self, orbiters: &[Orbiter], style: &ParticleStyle, t: f32, workers: &Workers) {
        if self.particles.len() != orbiters.len() {
            self.particles.resize(orbiters.len(), PrecomputedParticle::default());
        }
        let center = self.center;
        let style = *style;
        workers.map_into(orbiters, &mut self.particles, |i, o| PrecomputedParticle {
            offset: o.position - center,
            previous_offset: o.previous - center,
            radius: point_radius(o, style.point_scale, t),
            color: style.palette.particle_color(i, t, style.saturation),
        });
    }

    /// Draw one whole frame: background fade, particle copies, guides.
    pub fn draw_frame<R: Renderer>(
        &self,
        renderer: &mut R,
        params: &FrameParams,
        attractors: &[Vec2; NUM_ATTRACTORS],
        t: f32,
    ) {
        let mut blend = BlendTracker(None);
        blend.set(renderer, BlendMode::Alpha);
        renderer.fill_surface(params.palette.background_tint(t), params.background_alpha);

        self.draw_particles(renderer, &mut blend, params);

        if params.show_attractors {
            draw_guides(renderer, &mut blend, params.palette, attractors, t);
        }
    }

    fn draw_particles<R: Renderer>(&self, renderer: &mut R, blend: &mut BlendTracker, params: &FrameParams) {
        let rotations = Rotations::new(params.symmetry);
        let passes = if params.mirror { 2 } else { 1 };
        let alphas = CopyAlphas::new(rotations.len() as u32 * passes, params.glow);
        let stride = render_stride(params.render_fraction);
        let center = self.center;

        for p in self.particles.iter().step_by(stride) {
            let pr = p.radius.clamp(MIN_POINT_RADIUS, MAX_POINT_RADIUS);
            for m in 0..rotations.len() {
                let current = center + rotations.rotate(m, p.offset);
                let previous = center + rotations.rotate(m, p.previous_offset);
                for pass in 0..passes {
                    let (x, xp) = if pass == 1 {
                        (mirror_x(current, center), mirror_x(previous, center))
                    } else {
                        (current, previous)
                    };
                    self.draw_copy(renderer, blend, params, &alphas, p.color, pr, x, xp);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_copy<R: Renderer>(
        &self,
        renderer: &mut R,
        blend: &mut BlendTracker,
        params: &FrameParams,
        alphas: &CopyAlphas,
        color: Rgb,
        pr: u8,
        pos: Vec2,
        prev: Vec2,
    ) {
        if params.trail {
            let mode = if params.glow { BlendMode::Additive } else { BlendMode::Alpha };
            blend.set(renderer, mode);
            renderer.draw_line(prev, pos, color, alphas.trail);
        }

        blend.set(renderer, BlendMode::Alpha);
        let step = pos - prev;
        for c in 1..=TAIL_DISCS {
            let at = pos - step * (c as f32 / 4.0);
            let radius = pr.saturating_sub(c).max(1);
            renderer.fill_disc(at, radius as f32, color, alphas.tail_disc(c));
        }

        if alphas.halo > 0 {
            blend.set(renderer, BlendMode::Additive);
            renderer.fill_disc(pos, (pr + 2) as f32, color, alphas.halo);
        }

        blend.set(renderer, BlendMode::Alpha);
        renderer.fill_disc(pos, pr as f32, color, alphas.core);
    }
}

/// Glowing markers on each attractor and faint lines joining them.
fn draw_guides<R: Renderer>(
    renderer: &mut R,
    blend: &mut BlendTracker,
    palette: Palette,
    attractors: &[Vec2; NUM_ATTRACTORS],
    t: f32,
) {
    for (k, &pos) in attractors.iter().enumerate() {
        let color = palette.attractor_color(k, t);
        blend.set(renderer, BlendMode::Additive);
        for ring in (1..=6u8).rev() {
            let radius = 10.0 + ring as f32 * 6.0;
            renderer.fill_disc(pos, radius, color, 8 + ring * 10);
        }
        blend.set(renderer, BlendMode::Alpha);
        renderer.fill_disc(pos, 3.0, color, 210);
    }

    blend.set(renderer, BlendMode::Additive);
    for i in 0..NUM_ATTRACTORS {
        let j = (i + 1) % NUM_ATTRACTORS;
        renderer.draw_line(attractors[i], attractors[j], Rgb::WHITE, 18);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbiter::Breathing;
    use crate::render::{DrawCommand, Recorder};

    fn params(symmetry: u32, mirror: bool) -> FrameParams {
        FrameParams {
            palette: Palette::Neon,
            background_alpha: 10,
            symmetry,
            mirror,
            glow: false,
            trail: false,
            render_fraction: 1.0,
            show_attractors: false,
        }
    }

    fn orbiter_at(position: Vec2, velocity: Vec2) -> Orbiter {
        Orbiter {
            position,
            previous: position,
            velocity,
            attractor: 0,
            angle: 0.0,
            radius: 10.0,
            omega: 0.0,
            k: 5.0,
            damping: 2.0,
            breathing: Breathing {
                base: 0.5,
                amplitude: 1.0,
                speed: 0.0,
                phase: 0.0,
            },
        }
    }

    #[test]
    fn test_four_fold_copies() {
        let center = Vec2::new(400.0, 300.0);
        let r = 50.0;
        let copies = copy_positions(Vec2::new(r, 0.0), center, 4, false);
        let expected = [
            Vec2::new(r, 0.0),
            Vec2::new(0.0, r),
            Vec2::new(-r, 0.0),
            Vec2::new(0.0, -r),
        ];
        assert_eq!(copies.len(), 4);
        for (got, want) in copies.iter().zip(expected) {
            assert!((*got - center - want).length() < 1e-3, "{got:?} vs {want:?}");
        }
    }

    #[test]
    fn test_mirror_reflects_about_center() {
        let center = Vec2::new(400.0, 300.0);
        let copies = copy_positions(Vec2::new(30.0, 20.0), center, 1, true);
        assert_eq!(copies.len(), 2);
        assert!((copies[0] - Vec2::new(430.0, 320.0)).length() < 1e-4);
        assert!((copies[1] - Vec2::new(370.0, 320.0)).length() < 1e-4);
    }

    #[test]
    fn test_rotation_clamps_count() {
        assert_eq!(Rotations::new(0).len(), 1);
        assert_eq!(Rotations::new(20).len(), 8);
    }

    #[test]
    fn test_alpha_divides_by_copy_count() {
        let one = CopyAlphas::new(1, true);
        let two = CopyAlphas::new(2, true);
        let eight = CopyAlphas::new(8, true);
        assert_eq!(one.trail, 90);
        assert_eq!(two.trail, 45);
        assert_eq!(eight.trail, 11);
        assert_eq!(one.core, 210);
        assert_eq!(two.core, 105);
        assert_eq!(eight.core, 70);
        assert_eq!(CopyAlphas::new(16, true).trail, 5);
        assert_eq!(CopyAlphas::new(64, true).trail, 4);
        assert_eq!(CopyAlphas::new(8, false).halo, 0);
    }

    #[test]
    fn test_render_stride() {
        assert_eq!(render_stride(1.0), 1);
        assert_eq!(render_stride(0.9995), 1);
        assert_eq!(render_stride(0.9), 1);
        assert_eq!(render_stride(0.6), 2);
        assert_eq!(render_stride(0.25), 4);
        assert_eq!(render_stride(0.05), 20);
    }

    #[test]
    fn test_point_radius_clamped() {
        let slow = orbiter_at(Vec2::ZERO, Vec2::ZERO);
        assert_eq!(point_radius(&slow, 0.1, 0.0), 1);
        let fast = orbiter_at(Vec2::ZERO, Vec2::new(1000.0, 0.0));
        assert_eq!(point_radius(&fast, 10.0, 0.0), 3);
    }

    #[test]
    fn test_point_radius_speed_boost() {
        let mut o = orbiter_at(Vec2::ZERO, Vec2::ZERO);
        o.breathing.base = 1.0;
        o.breathing.amplitude = 0.0;
        assert_eq!(point_radius(&o, 1.0, 0.0), 1);

        o.velocity = Vec2::new(40.0, 0.0);
        assert_eq!(point_radius(&o, 1.0, 0.0), 2);
        o.velocity = Vec2::new(0.0, 100.0);
        assert_eq!(point_radius(&o, 1.0, 0.0), 3);

        // boost saturates at 2 px
        o.velocity = Vec2::new(1000.0, 0.0);
        assert_eq!(point_radius(&o, 0.1, 0.0), 2);
    }

    /// `(is_line, blend in effect, alpha)` for every line and disc drawn.
    fn blended_elements(rec: &Recorder) -> Vec<(bool, BlendMode, u8)> {
        let mut mode = BlendMode::Alpha;
        let mut out = Vec::new();
        for cmd in &rec.commands {
            match *cmd {
                DrawCommand::Blend(m) => mode = m,
                DrawCommand::Line { alpha, .. } => out.push((true, mode, alpha)),
                DrawCommand::Disc { alpha, .. } => out.push((false, mode, alpha)),
                _ => {}
            }
        }
        out
    }

    fn single_copy_frame(glow: bool) -> Recorder {
        let workers = Workers::new(1).unwrap();
        let mut renderer = SymmetryRenderer::new(800.0, 600.0, 1).unwrap();
        let style = ParticleStyle {
            palette: Palette::Neon,
            saturation: 1.0,
            point_scale: 1.0,
        };
        renderer.precompute(&[orbiter_at(Vec2::new(500.0, 300.0), Vec2::ZERO)], &style, 0.0, &workers);

        let mut p = params(1, false);
        p.glow = glow;
        p.trail = true;
        let mut rec = Recorder::new(800, 600);
        renderer.draw_frame(&mut rec, &p, &[Vec2::ZERO; NUM_ATTRACTORS], 0.0);
        rec
    }

    #[test]
    fn test_blend_mode_per_element_with_glow() {
        let rec = single_copy_frame(true);
        assert_eq!(
            blended_elements(&rec),
            vec![
                (true, BlendMode::Additive, 90),
                (false, BlendMode::Alpha, 34),
                (false, BlendMode::Alpha, 17),
                (false, BlendMode::Additive, 50),
                (false, BlendMode::Alpha, 210),
            ]
        );
    }

    #[test]
    fn test_blend_mode_per_element_without_glow() {
        let rec = single_copy_frame(false);
        assert_eq!(
            blended_elements(&rec),
            vec![
                (true, BlendMode::Alpha, 54),
                (false, BlendMode::Alpha, 20),
                (false, BlendMode::Alpha, 10),
                (false, BlendMode::Alpha, 210),
            ]
        );
    }

    #[test]
    fn test_precompute_offsets_from_center() {
        let workers = Workers::new(2).unwrap();
        let mut renderer = SymmetryRenderer::new(800.0, 600.0, 2).unwrap();
        let mut a = orbiter_at(Vec2::new(450.0, 300.0), Vec2::ZERO);
        a.previous = Vec2::new(440.0, 310.0);
        let b = orbiter_at(Vec2::new(400.0, 200.0), Vec2::ZERO);
        let style = ParticleStyle {
            palette: Palette::Ocean,
            saturation: 0.65,
            point_scale: 1.0,
        };
        renderer.precompute(&[a, b], &style, 1.0, &workers);

        let p = renderer.particles();
        assert_eq!(p[0].offset, Vec2::new(50.0, 0.0));
        assert_eq!(p[0].previous_offset, Vec2::new(40.0, 10.0));
        assert_eq!(p[1].offset, Vec2::new(0.0, -100.0));
        assert_eq!(p[1].color, Palette::Ocean.particle_color(1, 1.0, 0.65));
    }

    #[test]
    fn test_draw_issues_background_first_and_one_core_per_copy() {
        let workers = Workers::new(1).unwrap();
        let mut renderer = SymmetryRenderer::new(800.0, 600.0, 1).unwrap();
        let style = ParticleStyle {
            palette: Palette::Neon,
            saturation: 1.0,
            point_scale: 1.0,
        };
        renderer.precompute(&[orbiter_at(Vec2::new(500.0, 300.0), Vec2::ZERO)], &style, 0.0, &workers);

        let mut rec = Recorder::new(800, 600);
        renderer.draw_frame(&mut rec, &params(6, true), &[Vec2::ZERO; NUM_ATTRACTORS], 0.0);

        assert!(matches!(rec.commands[0], DrawCommand::Blend(BlendMode::Alpha)));
        assert!(matches!(rec.commands[1], DrawCommand::FillSurface { alpha: 10, .. }));
        // 12 copies, each with two tail discs and one core, no halo without glow
        assert_eq!(rec.discs().len(), 12 * 3);
        assert_eq!(rec.line_count(), 0);
    }

    #[test]
    fn test_glow_and_trail_add_elements() {
        let workers = Workers::new(1).unwrap();
        let mut renderer = SymmetryRenderer::new(800.0, 600.0, 1).unwrap();
        let style = ParticleStyle {
            palette: Palette::Neon,
            saturation: 1.0,
            point_scale: 1.0,
        };
        renderer.precompute(&[orbiter_at(Vec2::new(500.0, 300.0), Vec2::ZERO)], &style, 0.0, &workers);

        let mut p = params(4, false);
        p.glow = true;
        p.trail = true;
        let mut rec = Recorder::new(800, 600);
        renderer.draw_frame(&mut rec, &p, &[Vec2::ZERO; NUM_ATTRACTORS], 0.0);
        assert_eq!(rec.discs().len(), 4 * 4);
        assert_eq!(rec.line_count(), 4);
    }

    #[test]
    fn test_guides_drawn_when_enabled() {
        let renderer = SymmetryRenderer::new(800.0, 600.0, 0).unwrap();
        let mut p = params(1, false);
        p.show_attractors = true;
        let mut rec = Recorder::new(800, 600);
        let attractors = [Vec2::new(100.0, 100.0), Vec2::new(200.0, 100.0), Vec2::new(150.0, 200.0)];
        renderer.draw_frame(&mut rec, &p, &attractors, 0.0);
        assert_eq!(rec.discs().len(), NUM_ATTRACTORS * 7);
        assert_eq!(rec.line_count(), NUM_ATTRACTORS);
    }

    #[test]
    fn test_render_fraction_samples_particles() {
        let workers = Workers::new(1).unwrap();
        let mut renderer = SymmetryRenderer::new(800.0, 600.0, 10).unwrap();
        let orbiters: Vec<Orbiter> = (0..10)
            .map(|i| orbiter_at(Vec2::new(400.0 + i as f32, 300.0), Vec2::ZERO))
            .collect();
        let style = ParticleStyle {
            palette: Palette::Neon,
            saturation: 1.0,
            point_scale: 1.0,
        };
        renderer.precompute(&orbiters, &style, 0.0, &workers);

        let mut p = params(1, false);
        p.render_fraction = 0.5;
        let mut rec = Recorder::new(800, 600);
        renderer.draw_frame(&mut rec, &p, &[Vec2::ZERO; NUM_ATTRACTORS], 0.0);
        assert_eq!(rec.discs().len(), 5 * 3);
    }
}
