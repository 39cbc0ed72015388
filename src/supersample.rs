//! Supersampled rendering surface management.
//!
//! With a factor `k > 1` the frame is drawn on an offscreen surface `k`
//! times larger per axis and downsampled onto the output once per frame.
//! A surface that cannot be allocated is not fatal: the manager logs a
//! warning and keeps rendering at factor 1.

use crate::render::Renderer;

/// Supported supersampling factors.
pub const MIN_FACTOR: u32 = 1;
pub const MAX_FACTOR: u32 = 4;

/// Owns the supersampling policy for one output surface.
#[derive(Debug, Clone)]
pub struct SupersampleManager {
    output_width: u32,
    output_height: u32,
    factor: u32,
    allocated: bool,
}

impl SupersampleManager {
    /// Manager for a `width x height` output with no surface allocated yet.
    pub fn new(output_width: u32, output_height: u32) -> Self {
        Self {
            output_width,
            output_height,
            factor: MIN_FACTOR,
            allocated: false,
        }
    }

    /// Effective factor currently in use.
    #[inline]
    pub fn factor(&self) -> u32 {
        self.factor
    }

    /// Whether an offscreen surface is currently allocated.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.allocated
    }

    /// Size of the surface frames are drawn on.
    pub fn render_size(&self) -> (u32, u32) {
        (self.output_width * self.factor, self.output_height * self.factor)
    }

    /// Switch to `factor` (clamped to `[1, 4]`) and return the factor in effect.
    ///
    /// Does nothing if that factor is already configured. On allocation
    /// failure the factor drops to 1.
    pub fn configure<R: Renderer>(&mut self, renderer: &mut R, factor: u32) -> u32 {
        let factor = factor.clamp(MIN_FACTOR, MAX_FACTOR);
        let configured = if factor == MIN_FACTOR { !self.allocated } else { self.allocated };
        if configured && factor == self.factor {
            return self.factor;
        }

        if self.allocated {
            renderer.release_offscreen();
            self.allocated = false;
        }
        self.factor = factor;

        if factor > MIN_FACTOR {
            let (width, height) = self.render_size();
            match renderer.create_offscreen(width, height) {
                Ok(()) => {
                    self.allocated = true;
                    log::info!("Supersampling x{} on a {}x{} surface", factor, width, height);
                }
                Err(e) => {
                    log::warn!("{}; continuing without supersampling", e);
                    self.factor = MIN_FACTOR;
                }
            }
        }
        self.factor
    }

    /// Start a frame, redirecting drawing to the offscreen surface if active.
    pub fn begin_frame<R: Renderer>(&mut self, renderer: &mut R) {
        renderer.begin_frame();
        if self.allocated {
            renderer.bind_offscreen(self.factor as f32);
        }
    }

    /// Finish a frame, compositing the offscreen surface onto the output.
    pub fn end_frame<R: Renderer>(&mut self, renderer: &mut R) {
        if self.allocated {
            renderer.bind_output();
            renderer.composite_offscreen();
        }
        renderer.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::render::{DrawCommand, Recorder};

    #[test]
    fn test_configure_allocates_scaled_surface() {
        let mut rec = Recorder::new(800, 600);
        let mut ssaa = SupersampleManager::new(800, 600);
        assert_eq!(ssaa.configure(&mut rec, 2), 2);
        assert!(ssaa.is_active());
        assert_eq!(ssaa.render_size(), (1600, 1200));
        assert_eq!(rec.commands, vec![DrawCommand::CreateOffscreen { width: 1600, height: 1200 }]);
    }

    #[test]
    fn test_same_factor_is_noop() {
        let mut rec = Recorder::new(800, 600);
        let mut ssaa = SupersampleManager::new(800, 600);
        ssaa.configure(&mut rec, 3);
        rec.clear();
        assert_eq!(ssaa.configure(&mut rec, 3), 3);
        assert!(rec.commands.is_empty());

        let mut plain = SupersampleManager::new(800, 600);
        assert_eq!(plain.configure(&mut rec, 1), 1);
        assert!(rec.commands.is_empty());
    }

    #[test]
    fn test_factor_change_reallocates() {
        let mut rec = Recorder::new(640, 480);
        let mut ssaa = SupersampleManager::new(640, 480);
        ssaa.configure(&mut rec, 4);
        rec.clear();
        assert_eq!(ssaa.configure(&mut rec, 3), 3);
        assert_eq!(
            rec.commands,
            vec![
                DrawCommand::ReleaseOffscreen,
                DrawCommand::CreateOffscreen { width: 1920, height: 1440 },
            ]
        );
        rec.clear();
        assert_eq!(ssaa.configure(&mut rec, 1), 1);
        assert_eq!(rec.commands, vec![DrawCommand::ReleaseOffscreen]);
        assert!(!ssaa.is_active());
    }

    #[test]
    fn test_clamps_factor() {
        let mut rec = Recorder::new(640, 480);
        let mut ssaa = SupersampleManager::new(640, 480);
        assert_eq!(ssaa.configure(&mut rec, 9), 4);
        assert_eq!(ssaa.configure(&mut rec, 0), 1);
    }

    #[test]
    fn test_allocation_failure_falls_back() {
        let mut rec = Recorder::new(800, 600).with_offscreen_limit(2000);
        let mut ssaa = SupersampleManager::new(800, 600);
        assert_eq!(ssaa.configure(&mut rec, 4), 1);
        assert!(!ssaa.is_active());
        assert_eq!(ssaa.render_size(), (800, 600));
        assert_eq!(ssaa.configure(&mut rec, 2), 2);
    }

    #[test]
    fn test_frame_brackets_offscreen() {
        let mut rec = Recorder::new(800, 600);
        let mut ssaa = SupersampleManager::new(800, 600);
        ssaa.configure(&mut rec, 2);
        rec.clear();
        ssaa.begin_frame(&mut rec);
        ssaa.end_frame(&mut rec);
        assert_eq!(
            rec.commands,
            vec![
                DrawCommand::BeginFrame,
                DrawCommand::BindOffscreen { scale: 2.0 },
                DrawCommand::BindOutput,
                DrawCommand::Composite,
                DrawCommand::EndFrame,
            ]
        );
    }

    #[test]
    fn test_canvas_fallback() {
        let mut canvas = Canvas::new(640, 480).with_max_dimension(1024);
        let mut ssaa = SupersampleManager::new(640, 480);
        assert_eq!(ssaa.configure(&mut canvas, 3), 1);
        assert_eq!(canvas.offscreen_size(), None);
        assert_eq!(ssaa.configure(&mut canvas, 1), 1);
    }
}
