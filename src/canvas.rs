//! Software rasteriser implementing [`Renderer`].
//!
//! The canvas keeps an RGBA8 output surface plus an optional offscreen
//! surface for supersampling. Frames are never cleared: the engine fades
//! old content with a translucent fill, so whatever was drawn last frame
//! stays until it is painted over.

use glam::Vec2;

use crate::color::Rgb;
use crate::error::RenderError;
use crate::render::Renderer;
use crate::visuals::BlendMode;

/// Largest offscreen surface accepted on either axis, like a GPU texture limit.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Clone)]
struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Surface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![OPAQUE_BLACK; width as usize * height as usize],
        }
    }

    fn try_new(width: u32, height: u32) -> Result<Self, RenderError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or(RenderError::OffscreenAllocation { width, height })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| RenderError::OffscreenAllocation { width, height })?;
        pixels.resize(len, OPAQUE_BLACK);
        Ok(Self { width, height, pixels })
    }

    #[inline]
    fn blend(&mut self, x: i32, y: i32, color: Rgb, alpha: u8, mode: BlendMode) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let idx = y as usize * self.width as usize + x as usize;
        let px = &mut self.pixels[idx];
        let src = [color.r, color.g, color.b];
        let a = alpha as u32;
        for c in 0..3 {
            let s = src[c] as u32;
            let d = px[c] as u32;
            px[c] = match mode {
                BlendMode::Alpha => ((s * a + d * (255 - a) + 127) / 255) as u8,
                BlendMode::Additive => (d + (s * a + 127) / 255).min(255) as u8,
            };
        }
    }

    fn span(&mut self, x0: i32, x1: i32, y: i32, color: Rgb, alpha: u8, mode: BlendMode) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        let x0 = x0.max(0);
        let x1 = x1.min(self.width as i32 - 1);
        for x in x0..=x1 {
            self.blend(x, y, color, alpha, mode);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Output,
    Offscreen,
}

/// CPU framebuffer back-end.
#[derive(Debug, Clone)]
pub struct Canvas {
    output: Surface,
    offscreen: Option<Surface>,
    target: Target,
    scale: f32,
    blend: BlendMode,
    max_dimension: u32,
    frames: u64,
}

impl Canvas {
    /// Create a canvas with a black `width x height` output surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            output: Surface::new(width, height),
            offscreen: None,
            target: Target::Output,
            scale: 1.0,
            blend: BlendMode::Alpha,
            max_dimension: DEFAULT_MAX_DIMENSION,
            frames: 0,
        }
    }

    /// Cap offscreen surfaces at `limit` pixels per axis.
    pub fn with_max_dimension(mut self, limit: u32) -> Self {
        self.max_dimension = limit;
        self
    }

    /// Output surface as tightly packed RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        bytemuck::cast_slice(&self.output.pixels)
    }

    /// Output pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.output.pixels[y as usize * self.output.width as usize + x as usize]
    }

    /// Size of the offscreen surface, if one is allocated.
    pub fn offscreen_size(&self) -> Option<(u32, u32)> {
        self.offscreen.as_ref().map(|s| (s.width, s.height))
    }

    /// Frames completed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn surface_mut(&mut self) -> &mut Surface {
        match (self.target, self.offscreen.as_mut()) {
            (Target::Offscreen, Some(s)) => s,
            _ => &mut self.output,
        }
    }
}

impl Renderer for Canvas {
    fn output_size(&self) -> (u32, u32) {
        (self.output.width, self.output.height)
    }

    fn begin_frame(&mut self) {
        self.blend = BlendMode::Alpha;
    }

    fn end_frame(&mut self) {
        self.frames += 1;
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
    }

    fn fill_surface(&mut self, color: Rgb, alpha: u8) {
        let mode = self.blend;
        let surface = self.surface_mut();
        let (w, h) = (surface.width as i32, surface.height as i32);
        for y in 0..h {
            surface.span(0, w - 1, y, color, alpha, mode);
        }
    }

    fn fill_disc(&mut self, center: Vec2, radius: f32, color: Rgb, alpha: u8) {
        let mode = self.blend;
        let scale = self.scale;
        let c = center * scale;
        let r = (radius * scale).round().max(0.0) as i32;
        let (cx, cy) = (c.x.round() as i32, c.y.round() as i32);
        let surface = self.surface_mut();
        for dy in -r..=r {
            let half = (((r * r - dy * dy) as f32).sqrt()).floor() as i32;
            surface.span(cx - half, cx + half, cy + dy, color, alpha, mode);
        }
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgb, alpha: u8) {
        let mode = self.blend;
        let scale = self.scale;
        let (p0, p1) = (from * scale, to * scale);
        let d = p1 - p0;
        let steps = d.x.abs().max(d.y.abs()).ceil().max(1.0) as i32;
        let pen = scale.ceil().max(1.0) as i32;
        let offset = (pen - 1) / 2;
        let surface = self.surface_mut();
        for i in 0..=steps {
            let p = p0 + d * (i as f32 / steps as f32);
            let (x, y) = (p.x.round() as i32 - offset, p.y.round() as i32 - offset);
            for py in 0..pen {
                for px in 0..pen {
                    surface.blend(x + px, y + py, color, alpha, mode);
                }
            }
        }
    }

    fn create_offscreen(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width > self.max_dimension || height > self.max_dimension {
            return Err(RenderError::OffscreenTooLarge {
                width,
                height,
                limit: self.max_dimension,
            });
        }
        self.offscreen = Some(Surface::try_new(width, height)?);
        Ok(())
    }

    fn release_offscreen(&mut self) {
        self.offscreen = None;
        self.target = Target::Output;
        self.scale = 1.0;
    }

    fn bind_offscreen(&mut self, scale: f32) {
        if self.offscreen.is_some() {
            self.target = Target::Offscreen;
            self.scale = scale;
        }
    }

    fn bind_output(&mut self) {
        self.target = Target::Output;
        self.scale = 1.0;
    }

    fn composite_offscreen(&mut self) {
        let Some(src) = self.offscreen.as_ref() else {
            return;
        };
        let dst = &mut self.output;
        let kx = (src.width / dst.width.max(1)).max(1) as usize;
        let ky = (src.height / dst.height.max(1)).max(1) as usize;
        let samples = (kx * ky) as u32;
        let src_w = src.width as usize;

        for y in 0..dst.height as usize {
            for x in 0..dst.width as usize {
                let mut sum = [0u32; 3];
                for sy in 0..ky {
                    let row = (y * ky + sy).min(src.height as usize - 1) * src_w;
                    for sx in 0..kx {
                        let p = src.pixels[row + (x * kx + sx).min(src_w - 1)];
                        sum[0] += p[0] as u32;
                        sum[1] += p[1] as u32;
                        sum[2] += p[2] as u32;
                    }
                }
                dst.pixels[y * dst.width as usize + x] = [
                    ((sum[0] + samples / 2) / samples) as u8,
                    ((sum[1] + samples / 2) / samples) as u8,
                    ((sum[2] + samples / 2) / samples) as u8,
                    255,
                ];
            }
        }
    }
}
