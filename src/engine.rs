//! Frame orchestration.
//!
//! [`Engine`] ties the scene to the adaptive controllers and the outputs.
//! One frame runs, in order:
//!
//! 1. take a clock sample and clamp its `dt`
//! 2. step the scene (attractors, integration, precompute)
//! 3. let the quality controller adjust the knobs
//! 4. reconcile the supersample surface with the requested factor
//! 5. draw through the supersample manager
//! 6. emit metrics and the status snapshot
//!
//! The engine is generic over [`Renderer`] per call, so the same engine can
//! drive a window, a headless canvas or a recording renderer in tests.

use crate::config::StaticConfig;
use crate::error::SceneError;
use crate::metrics::{MetricsRecorder, MetricsRow};
use crate::quality::QualityController;
use crate::render::Renderer;
use crate::scene::Scene;
use crate::status::{FrameStatus, StatusObserver};
use crate::supersample::SupersampleManager;
use crate::symmetry::FrameParams;
use crate::time::{FrameClock, FrameSample};

/// Drives a [`Scene`] one frame at a time.
pub struct Engine {
    config: StaticConfig,
    scene: Scene,
    quality: QualityController,
    supersample: SupersampleManager,
    clock: FrameClock,
    metrics: Option<MetricsRecorder>,
    observer: Option<Box<dyn StatusObserver>>,
    elapsed: f64,
}

impl Engine {
    /// Build the scene for `config`.
    ///
    /// A metrics file named in the config is opened here; failing to open
    /// it only disables metrics.
    pub fn new(config: StaticConfig) -> Result<Self, SceneError> {
        let scene = Scene::new(&config)?;
        let metrics = config
            .log_path
            .as_deref()
            .and_then(|path| MetricsRecorder::open_csv(path, config.log_every_ms));
        Ok(Self::with_scene(config, scene).with_metrics_opt(metrics))
    }

    /// Wrap an already built scene.
    pub fn with_scene(config: StaticConfig, scene: Scene) -> Self {
        let quality = QualityController::new(config.adapt, config.target_fps, config.initial_adaptive());
        let supersample = SupersampleManager::new(config.width, config.height);
        Self {
            config,
            scene,
            quality,
            supersample,
            clock: FrameClock::new(),
            metrics: None,
            observer: None,
            elapsed: 0.0,
        }
    }

    /// Record metrics through `recorder`.
    pub fn with_metrics(self, recorder: MetricsRecorder) -> Self {
        self.with_metrics_opt(Some(recorder))
    }

    fn with_metrics_opt(mut self, recorder: Option<MetricsRecorder>) -> Self {
        self.metrics = recorder;
        self
    }

    /// Call `observer` with a status snapshot after every frame.
    pub fn with_observer(mut self, observer: impl StatusObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run one frame timed by the wall clock.
    pub fn frame<R: Renderer>(&mut self, renderer: &mut R) -> FrameStatus {
        let sample = self.clock.tick();
        self.advance(renderer, sample)
    }

    /// Run one frame with an externally supplied clock sample.
    pub fn advance<R: Renderer>(&mut self, renderer: &mut R, sample: FrameSample) -> FrameStatus {
        self.elapsed = sample.elapsed;
        self.scene.step(sample.clamped_dt());

        if let Some(adjustment) = self.quality.maybe_adjust(sample.smoothed_fps, self.scene.time()) {
            log::info!(
                "Adaptive quality: {} (fps {:.1}, target {:.0})",
                adjustment,
                sample.smoothed_fps,
                self.config.target_fps
            );
        }

        let factor = self.supersample.configure(renderer, self.quality.state().supersampling);
        self.quality.sync_supersampling(factor);

        let params = self.frame_params();
        self.supersample.begin_frame(renderer);
        self.scene.draw(renderer, &params);
        self.supersample.end_frame(renderer);

        let status = self.status(&sample);
        if let Some(metrics) = self.metrics.as_mut() {
            metrics.offer(sample.elapsed, || MetricsRow {
                time_s: sample.elapsed,
                smoothed_fps: sample.smoothed_fps,
                fps_inst: sample.fps_instant,
                n: status.particles,
                width: self.config.width,
                height: self.config.height,
                palette: self.config.palette,
                vsync: self.config.vsync,
                threads: status.threads,
                ssaa: status.supersampling,
                render_frac: status.render_fraction,
                sym: status.symmetry,
            });
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.observe(&status);
        }
        status
    }

    /// Whether the configured duration has elapsed.
    pub fn should_stop(&self) -> bool {
        self.config
            .duration()
            .is_some_and(|duration| self.elapsed >= duration)
    }

    fn frame_params(&self) -> FrameParams {
        let state = self.quality.state();
        FrameParams {
            palette: self.config.palette,
            background_alpha: self.config.background_alpha,
            symmetry: state.symmetry,
            mirror: self.config.mirror,
            glow: state.glow,
            trail: self.config.trail,
            render_fraction: state.render_fraction,
            show_attractors: self.config.show_attractors,
        }
    }

    fn status(&self, sample: &FrameSample) -> FrameStatus {
        let state = self.quality.state();
        FrameStatus {
            smoothed_fps: sample.smoothed_fps,
            fps_instant: sample.fps_instant,
            output_size: (self.config.width, self.config.height),
            render_size: self.supersample.render_size(),
            supersampling: self.supersample.factor(),
            render_fraction: state.render_fraction,
            glow: state.glow,
            symmetry: state.symmetry,
            mirror: self.config.mirror,
            palette: self.config.palette,
            particles: self.scene.orbiters().len(),
            threads: self.scene.threads(),
            frame: sample.frame,
            elapsed: sample.elapsed,
        }
    }

    #[inline]
    pub fn config(&self) -> &StaticConfig {
        &self.config
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    #[inline]
    pub fn quality(&self) -> &QualityController {
        &self.quality
    }

    #[inline]
    pub fn supersample(&self) -> &SupersampleManager {
        &self.supersample
    }

    /// Wall-clock seconds as of the last frame.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("scene", &self.scene)
            .field("quality", &self.quality)
            .field("supersample", &self.supersample)
            .field("metrics", &self.metrics)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}
