//! The drawing capability the engine renders against.
//!
//! The engine never touches pixels directly. It issues draw calls through
//! [`Renderer`], which a back-end implements: [`GpuCanvas`](crate::gpu::GpuCanvas)
//! draws with wgpu, [`Canvas`](crate::canvas::Canvas) rasterises in software,
//! [`Recorder`] just records the calls.
//!
//! Coordinates are in output (device-independent) units. When an offscreen
//! target is bound with a scale, the back-end multiplies coordinates and
//! radii by that scale.

use glam::Vec2;

use crate::color::Rgb;
use crate::error::RenderError;
use crate::visuals::BlendMode;

/// 2D drawing back-end.
///
/// Calls are issued from a single thread, in order; alpha blending is
/// order-dependent.
pub trait Renderer {
    /// Size of the real output surface in pixels.
    fn output_size(&self) -> (u32, u32);

    /// Start a frame.
    fn begin_frame(&mut self);

    /// Finish a frame. Output content is final after this call.
    fn end_frame(&mut self);

    /// Blend mode for subsequent draws.
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Blend `color` over the whole bound surface.
    fn fill_surface(&mut self, color: Rgb, alpha: u8);

    /// Filled disc.
    fn fill_disc(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8);

    /// One-pixel line segment.
    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgb, alpha: u8);

    /// Allocate an offscreen surface, replacing any existing one.
    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Free the offscreen surface, if any.
    fn release_offscreen(&mut self);

    /// Redirect drawing to the offscreen surface, scaling coordinates by `scale`.
    fn bind_offscreen(&mut self, scale: f32);

    /// Redirect drawing back to the output surface at scale 1.
    fn bind_output(&mut self);

    /// Downsample the offscreen surface onto the output surface.
    fn composite_offscreen(&mut self);
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    BeginFrame,
    EndFrame,
    Blend(BlendMode),
    FillSurface { color: Rgb, alpha: u8 },
    Disc { center: Vec2, radius: f32, color: Rgb, alpha: u8 },
    Line { from: Vec2, to: Vec2, color: Rgb, alpha: u8 },
    CreateOffscreen { width: u32, height: u32 },
    ReleaseOffscreen,
    BindOffscreen { scale: f32 },
    BindOutput,
    Composite,
}

/// Renderer that stores every call instead of drawing.
///
/// Offscreen allocations larger than `max_offscreen` pixels per axis fail,
/// which makes it useful for exercising fallback paths.
#[derive(Debug, Clone)]
pub struct Recorder {
    width: u32,
    height: u32,
    max_offscreen: u32,
    pub commands: Vec<DrawCommand>,
}

impl Recorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            max_offscreen: u32::MAX,
            commands: Vec::new(),
        }
    }

    /// Refuse offscreen surfaces wider or taller than `limit`.
    pub fn with_offscreen_limit(mut self, limit: u32) -> Self {
        self.max_offscreen = limit;
        self
    }

    /// All recorded discs as `(center, radius, alpha)`.
    pub fn discs(&self) -> Vec<(Vec2, f32, u8)> {
        self.commands
            .iter()
            .filter_map(|c| match *c {
                DrawCommand::Disc { center, radius, alpha, .. } => Some((center, radius, alpha)),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded lines.
    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Renderer for Recorder {
    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_frame(&mut self) {
        self.commands.push(DrawCommand::BeginFrame);
    }

    fn end_frame(&mut self) {
        self.commands.push(DrawCommand::EndFrame);
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.commands.push(DrawCommand::Blend(mode));
    }

    fn fill_surface(&mut self, color: Rgb, alpha: u8) {
        self.commands.push(DrawCommand::FillSurface { color, alpha });
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8) {
        self.commands.push(DrawCommand::Disc { center, radius, color, alpha });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgb, alpha: u8) {
        self.commands.push(DrawCommand::Line { from, to, color, alpha });
    }

    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width > self.max_offscreen || height > self.max_offscreen {
            return Err(RenderError::OffscreenTooLarge {
                width,
                height,
                limit: self.max_offscreen,
            });
        }
        self.commands.push(DrawCommand::CreateOffscreen { width, height });
        Ok(())
    }

    fn release_offscreen(&mut self) {
        self.commands.push(DrawCommand::ReleaseOffscreen);
    }

    fn bind_offscreen(&mut self, scale: f32) {
        self.commands.push(DrawCommand::BindOffscreen { scale });
    }

    fn bind_output(&mut self) {
        self.commands.push(DrawCommand::BindOutput);
    }

    fn composite_offscreen(&mut self) {
        self.commands.push(DrawCommand::Composite);
    }
}
