//! Headless run mode.
//!
//! Runs the engine against a software [`Canvas`] with no window, until the
//! frame limit or the configured duration is reached. Useful for
//! benchmarking without a display and for rendering stills.

use std::path::Path;
use std::time::Instant;

use crate::canvas::Canvas;
use crate::engine::Engine;
use crate::error::AppError;
use crate::render::Renderer;

/// What a headless run did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    /// Wall-clock seconds spent.
    pub seconds: f64,
    pub mean_fps: f64,
    /// Supersampling factor in effect at the end.
    pub supersampling: u32,
    /// Symmetry in effect at the end.
    pub symmetry: u32,
}

/// Run `engine` to completion and return the canvas with the final frame.
pub fn run_frames(engine: &mut Engine, frame_limit: Option<u64>) -> (Canvas, RunSummary) {
    let config = engine.config();
    let mut canvas = Canvas::new(config.width, config.height);
    let started = Instant::now();

    let mut frames = 0;
    let mut last = None;
    while frame_limit.map_or(true, |limit| frames < limit) && !engine.should_stop() {
        last = Some(engine.frame(&mut canvas));
        frames += 1;
    }

    let seconds = started.elapsed().as_secs_f64();
    let summary = RunSummary {
        frames,
        seconds,
        mean_fps: if seconds > 0.0 { frames as f64 / seconds } else { 0.0 },
        supersampling: last.map_or(engine.supersample().factor(), |s| s.supersampling),
        symmetry: last.map_or(engine.quality().state().symmetry, |s| s.symmetry),
    };
    (canvas, summary)
}

/// Save the canvas output as a PNG.
pub fn save_snapshot(canvas: &Canvas, path: &Path) -> Result<(), AppError> {
    let (width, height) = canvas.output_size();
    let image = image::RgbaImage::from_raw(width, height, canvas.pixels().to_vec()).ok_or_else(|| {
        image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })?;
    image.save(path)?;
    Ok(())
}

/// Run `engine` headless using its configured limits.
pub fn run(mut engine: Engine) -> Result<RunSummary, AppError> {
    let limit = engine.config().frame_limit();
    let snapshot = engine.config().snapshot.clone();
    log::info!(
        "Headless run: {}",
        match limit {
            Some(frames) => format!("{} frames", frames),
            None => format!("{:.1}s", engine.config().seconds),
        }
    );

    let (canvas, summary) = run_frames(&mut engine, limit);
    log::info!(
        "Rendered {} frames in {:.2}s ({:.1} FPS), final ssaa={} sym={}",
        summary.frames,
        summary.seconds,
        summary.mean_fps,
        summary.supersampling,
        summary.symmetry
    );

    if let Some(path) = snapshot {
        save_snapshot(&canvas, &path)?;
        log::info!("Snapshot written to {}", path.display());
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticConfig;

    fn config() -> StaticConfig {
        StaticConfig {
            n: 20,
            seed: 9,
            threads: 2,
            supersampling: 1,
            seconds: 0.0,
            ..StaticConfig::default()
        }
    }

    #[test]
    fn test_frame_limit() {
        let mut engine = Engine::new(config()).unwrap();
        let (_, summary) = run_frames(&mut engine, Some(4));
        assert_eq!(summary.frames, 4);
        assert_eq!(summary.symmetry, 6);
    }

    #[test]
    fn test_draws_something() {
        let mut engine = Engine::new(config()).unwrap();
        let (canvas, _) = run_frames(&mut engine, Some(3));
        let lit = canvas
            .pixels()
            .chunks_exact(4)
            .filter(|p| p[0] > 40 || p[1] > 40 || p[2] > 40)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn test_snapshot_png() {
        let mut engine = Engine::new(config()).unwrap();
        let (canvas, _) = run_frames(&mut engine, Some(2));
        let path = std::env::temp_dir().join(format!("mandala-snapshot-{}.png", std::process::id()));
        save_snapshot(&canvas, &path).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (800, 600));
        let _ = std::fs::remove_file(&path);
    }
}
