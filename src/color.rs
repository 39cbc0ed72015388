//! HSV/RGB colour conversion.

use glam::Vec3;

/// An 8-bit-per-channel colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Quantise a unit-range colour. Channels are truncated, not rounded.
    pub fn from_unit(c: Vec3) -> Self {
        let q = |v: f32| (v * 255.0).clamp(0.0, 255.0) as u8;
        Self::new(q(c.x), q(c.y), q(c.z))
    }

    /// Convert from HSV (`h` in degrees, `s`/`v` in `[0, 1]`).
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        Self::from_unit(hsv_to_rgb(h, s, v))
    }

    pub fn to_unit(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }
}

/// HSV to RGB using the six-sector formula.
///
/// `h` is in degrees and wraps into `[0, 360)`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let rgb = if h < 60.0 {
        Vec3::new(c, x, 0.0)
    } else if h < 120.0 {
        Vec3::new(x, c, 0.0)
    } else if h < 180.0 {
        Vec3::new(0.0, c, x)
    } else if h < 240.0 {
        Vec3::new(0.0, x, c)
    } else if h < 300.0 {
        Vec3::new(x, 0.0, c)
    } else {
        Vec3::new(c, 0.0, x)
    };

    rgb + Vec3::splat(m)
}

/// RGB to HSV. Returns `(hue degrees, saturation, value)`.
///
/// Hue is 0 for greys.
pub fn rgb_to_hsv(rgb: Vec3) -> Vec3 {
    let cmax = rgb.max_element();
    let cmin = rgb.min_element();
    let delta = cmax - cmin;

    let mut h = 0.0;
    if delta > 1e-6 {
        h = if cmax == rgb.x {
            ((rgb.y - rgb.z) / delta).rem_euclid(6.0)
        } else if cmax == rgb.y {
            (rgb.z - rgb.x) / delta + 2.0
        } else {
            (rgb.x - rgb.y) / delta + 4.0
        };
        h *= 60.0;
    }

    let s = if cmax > 1e-6 { delta / cmax } else { 0.0 };
    Vec3::new(h, s, cmax)
}
