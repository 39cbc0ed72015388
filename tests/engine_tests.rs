//! End-to-end tests for the simulation, renderer and controllers.
//!
//! These drive the public API the way the binary does, against the
//! recording renderer and the software canvas.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use clap::Parser;
use glam::Vec2;
use mandala::color::{hsv_to_rgb, rgb_to_hsv};
use mandala::config::Cli;
use mandala::metrics::CSV_HEADER;
use mandala::prelude::*;
use mandala::quality::{Adjustment, SYMMETRY_FLOOR};
use mandala::symmetry::{copy_positions, CopyAlphas};
use mandala::{
    AdaptiveState, AttractorField, CsvMetrics, MetricsRecorder, OrbiterSystem, QualityController,
    RandomSource, Scene, Workers,
};

fn small_config(seed: u64) -> StaticConfig {
    StaticConfig {
        n: 50,
        seed,
        threads: 2,
        seconds: 0.0,
        ..StaticConfig::default()
    }
}

// ============================================================================
// Simulation
// ============================================================================

#[test]
fn test_same_seed_same_trajectories() {
    let mut a = Scene::new(&small_config(1234)).unwrap();
    let mut b = Scene::new(&small_config(1234)).unwrap();
    for _ in 0..200 {
        a.step(0.016);
        b.step(0.016);
    }
    assert_eq!(a.orbiters(), b.orbiters());
}

#[test]
fn test_different_seed_different_scene() {
    let a = Scene::new(&small_config(1)).unwrap();
    let b = Scene::new(&small_config(2)).unwrap();
    assert_ne!(a.orbiters(), b.orbiters());
}

#[test]
fn test_attractors_stay_within_amplitude() {
    let mut rng = RandomSource::new(77);
    let mut field = AttractorField::new(800.0, 600.0, &mut rng);
    let center = field.center();
    for i in 0..2000 {
        let t = i as f32 * 0.137;
        field.update(t);
        for a in field.attractors() {
            let d = (a.position - center).abs();
            assert!(d.x <= a.amplitude.x + 1e-3);
            assert!(d.y <= a.amplitude.y + 1e-3);
        }
    }
}

#[test]
fn test_spring_converges_to_orbit_point() {
    let attractor = Vec2::new(400.0, 300.0);
    let targets = [attractor; 3];
    let mut rng = RandomSource::new(5);
    let mut system = OrbiterSystem::new(1, &targets, 800.0, 600.0, &mut rng).unwrap();

    let mut orbiter = system.orbiters()[0];
    orbiter.k = 5.0;
    orbiter.damping = 2.0;
    orbiter.radius = 50.0;
    orbiter.omega = 0.0;
    orbiter.angle = 0.0;
    orbiter.position = attractor + Vec2::new(-120.0, 80.0);
    orbiter.velocity = Vec2::ZERO;
    system = OrbiterSystem::from_orbiters(vec![orbiter]);

    let workers = Workers::new(1).unwrap();
    let goal = attractor + Vec2::new(50.0, 0.0);
    let initial = (orbiter.position - goal).length();
    for _ in 0..10_000 {
        system.integrate(0.01, &targets, &workers);
    }
    let end = (system.orbiters()[0].position - goal).length();
    assert!(end < initial);
    assert!(end < 1.0, "distance {end}");
}

// ============================================================================
// Colour and palettes
// ============================================================================

#[test]
fn test_hue_round_trip_at_boundaries() {
    for h in [0.0, 60.0, 120.0, 180.0, 240.0, 300.0, 359.9] {
        for s in [0.3, 0.65, 1.0] {
            for v in [0.4, 0.9] {
                let back = rgb_to_hsv(hsv_to_rgb(h, s, v));
                let diff = (back.x - h).abs();
                let diff = diff.min(360.0 - diff);
                assert!(diff < 0.05, "h={h} s={s} v={v} -> {back:?}");
            }
        }
    }
}

#[test]
fn test_palette_fallback() {
    for name in ["neon", "NEON", "Neon"] {
        assert_eq!(Palette::from_name(name), Palette::Neon);
    }
    for name in ["ocean", "OCEAN", "oCeAn"] {
        assert_eq!(Palette::from_name(name), Palette::Ocean);
    }
    for name in ["", "sunset", "oceans", "neon "] {
        assert_eq!(Palette::from_name(name), Palette::Neon);
    }

    let cli = Cli::try_parse_from(["mandala", "--palette", "lava", "--seed", "3"]).unwrap();
    assert_eq!(cli.into_config().palette, Palette::Neon);
}

// ============================================================================
// Symmetry
// ============================================================================

#[test]
fn test_four_fold_symmetry_positions() {
    let center = Vec2::new(400.0, 300.0);
    let r = 75.0;
    let copies = copy_positions(Vec2::new(r, 0.0), center, 4, false);
    let expected = [(r, 0.0), (0.0, r), (-r, 0.0), (0.0, -r)];
    assert_eq!(copies.len(), 4);
    for (got, (x, y)) in copies.iter().zip(expected) {
        assert!((*got - center - Vec2::new(x, y)).length() < 1e-3);
    }
}

#[test]
fn test_alpha_scales_with_copy_count() {
    for sym in 1..=8u32 {
        let a = CopyAlphas::new(sym, false);
        assert_eq!(a.trail, (90.0 * 0.6 / sym as f32).max(4.0) as u8);
        assert_eq!(a.core, (210.0 / sym as f32).max(70.0) as u8);

        let mirrored = CopyAlphas::new(sym * 2, false);
        assert!(mirrored.trail <= a.trail);
        assert_eq!(mirrored.trail, (90.0 * 0.6 / (2 * sym) as f32).max(4.0) as u8);
    }
    assert!(CopyAlphas::new(1, false).trail > CopyAlphas::new(8, false).trail);
}

#[test]
fn test_recorded_frame_has_one_core_per_copy() {
    let mut scene = Scene::new(&StaticConfig { n: 10, ..small_config(8) }).unwrap();
    scene.step(0.016);

    let params = mandala::FrameParams {
        palette: Palette::Neon,
        background_alpha: 10,
        symmetry: 5,
        mirror: true,
        glow: true,
        trail: true,
        render_fraction: 1.0,
        show_attractors: false,
    };
    let mut rec = Recorder::new(800, 600);
    scene.draw(&mut rec, &params);

    let core_alpha = CopyAlphas::new(10, true).core;
    let cores = rec.discs().iter().filter(|d| d.2 == core_alpha).count();
    assert_eq!(cores, 10 * 5 * 2);
    assert_eq!(rec.line_count(), 10 * 5 * 2);
}

// ============================================================================
// Adaptive quality
// ============================================================================

#[test]
fn test_degrade_ordering() {
    let mut q = QualityController::new(
        true,
        60.0,
        AdaptiveState {
            supersampling: 4,
            render_fraction: 1.0,
            glow: true,
            symmetry: 8,
        },
    );

    let mut t = 0.0;
    let mut next = || {
        t += 0.75;
        q.maybe_adjust(20.0, t)
    };

    assert_eq!(next(), Some(Adjustment::ReduceSupersampling(3)));
    assert_eq!(next(), Some(Adjustment::ReduceSupersampling(2)));
    assert_eq!(next(), Some(Adjustment::ReduceSupersampling(1)));
    for expected in [0.9, 0.8, 0.7, 0.6] {
        match next() {
            Some(Adjustment::ReduceRenderFraction(r)) => assert!((r - expected).abs() < 1e-4),
            other => panic!("expected render fraction step, got {other:?}"),
        }
    }
    assert_eq!(next(), Some(Adjustment::DisableGlow));
    for s in (SYMMETRY_FLOOR..8).rev() {
        assert_eq!(next(), Some(Adjustment::ReduceSymmetry(s)));
    }
    assert_eq!(next(), None);
    assert_eq!(next(), None);
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_headless_canvas_run() {
    let mut engine = Engine::new(small_config(21)).unwrap();
    let mut canvas = Canvas::new(800, 600);
    let mut clock = FrameClock::new();
    for _ in 0..5 {
        let status = engine.advance(&mut canvas, clock.record(1.0 / 60.0));
        assert_eq!(status.supersampling, 2);
    }
    assert_eq!(canvas.offscreen_size(), Some((1600, 1200)));
    assert_eq!(canvas.frames(), 5);
    assert!(canvas.pixels().chunks_exact(4).any(|p| p[0] > 30 || p[1] > 30 || p[2] > 30));
}

#[test]
fn test_metrics_rows_through_engine() {
    let buf = SharedBuf::default();
    let csv = CsvMetrics::new(buf.clone()).unwrap();
    let mut engine = Engine::new(small_config(4))
        .unwrap()
        .with_metrics(MetricsRecorder::new(Box::new(csv), 100));

    let mut rec = Recorder::new(800, 600);
    let mut clock = FrameClock::new();
    for _ in 0..30 {
        engine.advance(&mut rec, clock.record(0.02));
        rec.clear();
    }

    let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines.len() >= 5, "{text}");
    for line in &lines[1..] {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 12);
        assert_eq!(fields[3], "50");
        assert_eq!(fields[6], "neon");
        assert_eq!(fields[8], "2");
    }
}

#[test]
fn test_status_observer_receives_snapshots() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut engine = Engine::new(small_config(6))
        .unwrap()
        .with_observer(move |s: &FrameStatus| sink.borrow_mut().push((s.frame, s.symmetry)));

    let mut rec = Recorder::new(800, 600);
    let mut clock = FrameClock::new();
    for _ in 0..4 {
        engine.advance(&mut rec, clock.record(0.016));
    }
    assert_eq!(*seen.borrow(), vec![(1, 6), (2, 6), (3, 6), (4, 6)]);
}
