//! Run configuration.
//!
//! [`Cli`] is the command line as parsed by clap. [`Cli::into_config`]
//! normalises it into the immutable [`StaticConfig`] the engine is built
//! from: out-of-range values are clamped, a zero seed is replaced by the
//! current time and unknown palette names fall back to `neon`.
//!
//! Values that change while running live in
//! [`AdaptiveState`](crate::quality::AdaptiveState), never here.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

use crate::quality::AdaptiveState;
use crate::supersample::{MAX_FACTOR, MIN_FACTOR};
use crate::symmetry::MAX_SYMMETRY;
use crate::visuals::Palette;

/// Smallest accepted output size.
pub const MIN_WIDTH: u32 = 640;
pub const MIN_HEIGHT: u32 = 480;

/// Headless frame limit used when neither `--frames` nor a duration is given.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 600;

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticConfig {
    /// Number of orbiters.
    pub n: usize,
    pub width: u32,
    pub height: u32,
    /// Seconds before stopping; `<= 0` runs until stopped.
    pub seconds: f64,
    /// RNG seed, used as-is.
    pub seed: u64,
    pub palette: Palette,
    pub vsync: bool,
    /// CSV metrics output.
    pub log_path: Option<PathBuf>,
    /// Minimum milliseconds between metrics rows.
    pub log_every_ms: u64,
    pub show_attractors: bool,
    /// Multiplier on the rendered point radius.
    pub point_scale: f32,
    /// Configured (maximum) symmetry, `[1, 8]`.
    pub symmetry: u32,
    pub mirror: bool,
    /// Initial supersampling factor, `[1, 4]`.
    pub supersampling: u32,
    /// Saturation multiplier, `[0, 1]`.
    pub saturation: f32,
    pub glow: bool,
    pub background_alpha: u8,
    /// Worker threads, 0 for one per logical CPU.
    pub threads: usize,
    pub trail: bool,
    /// Initial render fraction, `(0, 1]`.
    pub render_fraction: f32,
    pub adapt: bool,
    pub target_fps: f32,
    pub headless: bool,
    pub frames: Option<u64>,
    pub snapshot: Option<PathBuf>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            n: 100,
            width: 800,
            height: 600,
            seconds: 10.0,
            seed: 0,
            palette: Palette::Neon,
            vsync: true,
            log_path: None,
            log_every_ms: 500,
            show_attractors: false,
            point_scale: 1.0,
            symmetry: 6,
            mirror: true,
            supersampling: 2,
            saturation: 0.65,
            glow: false,
            background_alpha: 10,
            threads: 0,
            trail: false,
            render_fraction: 1.0,
            adapt: false,
            target_fps: 30.0,
            headless: false,
            frames: None,
            snapshot: None,
        }
    }
}

impl StaticConfig {
    /// Run duration, or `None` to run until stopped.
    pub fn duration(&self) -> Option<f64> {
        (self.seconds > 0.0).then_some(self.seconds)
    }

    /// Frame limit for headless runs.
    pub fn frame_limit(&self) -> Option<u64> {
        match (self.frames, self.duration()) {
            (Some(frames), _) => Some(frames),
            (None, None) => Some(DEFAULT_HEADLESS_FRAMES),
            (None, Some(_)) => None,
        }
    }

    /// Starting values for the adaptive knobs.
    pub fn initial_adaptive(&self) -> AdaptiveState {
        AdaptiveState {
            supersampling: self.supersampling,
            render_fraction: self.render_fraction,
            glow: self.glow,
            symmetry: self.symmetry,
        }
    }
}

/// Command-line options.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Radial-symmetry particle screensaver", long_about = None)]
#[command(allow_negative_numbers = true)]
pub struct Cli {
    /// Number of particles
    #[arg(long, default_value_t = 100)]
    pub n: i64,

    /// Window width (minimum 640)
    #[arg(long, default_value_t = 800)]
    pub width: i64,

    /// Window height (minimum 480)
    #[arg(long, default_value_t = 600)]
    pub height: i64,

    /// Seconds to run, <= 0 runs until closed
    #[arg(long, default_value_t = 10.0)]
    pub seconds: f64,

    /// RNG seed, wrapped to 32 bits; 0 picks one from the clock
    #[arg(long, default_value_t = 0)]
    pub seed: i64,

    /// Colour palette: neon or ocean
    #[arg(long, default_value = "neon")]
    pub palette: String,

    /// Synchronise presentation with the display
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub vsync: bool,

    /// Write CSV metrics to this file
    #[arg(long = "log")]
    pub log: Option<PathBuf>,

    /// Milliseconds between metrics rows
    #[arg(long, default_value_t = 500)]
    pub log_every_ms: i64,

    /// Draw attractor guides
    #[arg(long, default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub show_attractors: bool,

    /// Point radius multiplier (minimum 0.1)
    #[arg(long, default_value_t = 1.0)]
    pub point_scale: f32,

    /// Rotational symmetry, 1 to 8
    #[arg(long, default_value_t = 6)]
    pub sym: i64,

    /// Mirror every rotated copy
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub mirror: bool,

    /// Supersampling factor, 1 to 4
    #[arg(long, default_value_t = 2)]
    pub ssaa: i64,

    /// Saturation multiplier, 0 to 1
    #[arg(long, default_value_t = 0.65)]
    pub sat: f32,

    /// Additive glow halos
    #[arg(long, default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub glow: bool,

    /// Background fade alpha, 0 to 255
    #[arg(long, default_value_t = 10)]
    pub bg_alpha: i64,

    /// Worker threads, 0 for one per CPU
    #[arg(long, default_value_t = 0)]
    pub threads: i64,

    /// Draw the long trail line
    #[arg(long, default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub trail: bool,

    /// Fraction of particles drawn each frame
    #[arg(long, default_value_t = 1.0)]
    pub render_frac: f32,

    /// Adapt quality to hold the target frame rate
    #[arg(long, default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    pub adapt: bool,

    /// Frame rate the adaptive controller aims for, 10 to 144
    #[arg(long, default_value_t = 30.0)]
    pub target_fps: f32,

    /// Render without a window
    #[arg(long)]
    pub headless: bool,

    /// Headless frame limit
    #[arg(long)]
    pub frames: Option<u64>,

    /// Headless: save the last frame as PNG
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

impl Cli {
    /// Normalise into a [`StaticConfig`].
    pub fn into_config(self) -> StaticConfig {
        if !Palette::is_known(&self.palette) {
            log::warn!("Unknown palette '{}', using neon", self.palette);
        }

        StaticConfig {
            n: self.n.max(1) as usize,
            width: clamp_u32(self.width, MIN_WIDTH),
            height: clamp_u32(self.height, MIN_HEIGHT),
            seconds: self.seconds,
            seed: resolve_seed(self.seed),
            palette: Palette::from_name(&self.palette),
            vsync: self.vsync,
            log_path: self.log,
            log_every_ms: self.log_every_ms.max(1) as u64,
            show_attractors: self.show_attractors,
            point_scale: if self.point_scale.is_finite() { self.point_scale.max(0.1) } else { 1.0 },
            symmetry: self.sym.clamp(1, MAX_SYMMETRY as i64) as u32,
            mirror: self.mirror,
            supersampling: self.ssaa.clamp(MIN_FACTOR as i64, MAX_FACTOR as i64) as u32,
            saturation: self.sat.clamp(0.0, 1.0),
            glow: self.glow,
            background_alpha: self.bg_alpha.clamp(0, 255) as u8,
            threads: self.threads.max(0) as usize,
            trail: self.trail,
            render_fraction: normalize_render_fraction(self.render_frac),
            adapt: self.adapt,
            target_fps: self.target_fps.clamp(10.0, 144.0),
            headless: self.headless,
            frames: self.frames,
            snapshot: self.snapshot,
        }
    }
}

fn clamp_u32(value: i64, min: u32) -> u32 {
    value.clamp(i64::from(min), i64::from(u32::MAX)) as u32
}

/// `<= 0` becomes 0.05, anything above 1 becomes 1.
pub fn normalize_render_fraction(fraction: f32) -> f32 {
    if fraction.is_nan() || fraction <= 0.0 {
        0.05
    } else {
        fraction.min(1.0)
    }
}

/// Wrap `seed` to 32 bits. A zero result is replaced by the current UNIX
/// time in seconds.
pub fn resolve_seed(seed: i64) -> u64 {
    let wrapped = seed as u32;
    if wrapped != 0 {
        return u64::from(wrapped);
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(1)
        .max(1)
}
