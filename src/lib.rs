//! # Mandala - radial-symmetry particle screensaver
//!
//! Damped-spring particles ("orbiters") chase rotating targets around three
//! slowly drifting attractors. Every frame each particle is replicated
//! around the screen centre with rotational symmetry and optional mirroring,
//! drawn with fading trails, additive glow and a breathing point size.
//!
//! An adaptive controller trades supersampling, drawn-particle fraction,
//! glow and symmetry for frame rate when asked to hold a target FPS.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mandala::prelude::*;
//!
//! let config = StaticConfig { n: 2_000, seed: 42, ..StaticConfig::default() };
//! let mut engine = Engine::new(config)?;
//! let mut canvas = Canvas::new(800, 600);
//!
//! while !engine.should_stop() {
//!     let status = engine.frame(&mut canvas);
//!     println!("{}", status);
//! }
//! ```
//!
//! ## Architecture
//!
//! | Layer | Types |
//! |-------|-------|
//! | Simulation | [`AttractorField`], [`OrbiterSystem`], [`Workers`] |
//! | Drawing | [`SymmetryRenderer`], [`SupersampleManager`], [`Renderer`] |
//! | Control | [`QualityController`], [`FrameClock`] |
//! | Host | [`Engine`], [`Canvas`], [`gpu::GpuCanvas`], [`MetricsRecorder`] |
//!
//! The core never touches pixels directly; it issues draw calls through the
//! [`Renderer`] trait. [`gpu::GpuCanvas`] draws them with wgpu in a window,
//! [`Canvas`] rasterises them in software for headless runs and
//! [`Recorder`] records them for inspection.

pub mod attractor;
pub mod canvas;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod headless;
pub mod metrics;
pub mod orbiter;
pub mod parallel;
pub mod quality;
pub mod render;
pub mod rng;
pub mod scene;
pub mod status;
pub mod supersample;
pub mod symmetry;
pub mod time;
pub mod visuals;
pub mod window;

pub use attractor::{Attractor, AttractorField};
pub use canvas::Canvas;
pub use config::{Cli, StaticConfig};
pub use engine::Engine;
pub use error::{AppError, GpuError, MetricsError, RenderError, SceneError};
pub use glam::Vec2;
pub use metrics::{CsvMetrics, MetricsRecorder, MetricsRow, MetricsSink};
pub use orbiter::{Orbiter, OrbiterSystem};
pub use parallel::Workers;
pub use quality::{AdaptiveState, Adjustment, QualityController};
pub use render::{DrawCommand, Recorder, Renderer};
pub use rng::RandomSource;
pub use scene::Scene;
pub use status::{FrameStatus, StatusObserver};
pub use supersample::SupersampleManager;
pub use symmetry::{FrameParams, ParticleStyle, SymmetryRenderer};
pub use time::{FrameClock, FrameSample};
pub use visuals::{BlendMode, Palette};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use mandala::prelude::*;
/// ```
pub mod prelude {
    pub use crate::canvas::Canvas;
    pub use crate::config::StaticConfig;
    pub use crate::engine::Engine;
    pub use crate::render::{Recorder, Renderer};
    pub use crate::status::{FrameStatus, StatusObserver};
    pub use crate::time::{FrameClock, FrameSample};
    pub use crate::visuals::{BlendMode, Palette};
    pub use crate::Vec2;
}
