//! Palettes and blend modes.
//!
//! A palette decides three colours per frame: each particle's colour, the
//! background tint used for the fading-trail fill, and the attractor guide
//! colours. All of them drift slowly with time.
//!
//! # Usage
//!
//! ```ignore
//! let palette = Palette::from_name("Ocean");
//! let rgb = palette.particle_color(42, t, 0.65);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::color::Rgb;

/// Golden angle in degrees; consecutive indices land far apart on the hue wheel.
const GOLDEN_ANGLE_DEG: f32 = 137.508;

/// Colour palette for particles and background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Full-spectrum hues spread by the golden angle (default).
    #[default]
    Neon,

    /// Cyan-to-blue band with gently pulsing saturation.
    Ocean,
}

impl Palette {
    /// Resolve a palette name, case-insensitively.
    ///
    /// Anything other than `neon` or `ocean` falls back to [`Palette::Neon`].
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("ocean") {
            Palette::Ocean
        } else {
            Palette::Neon
        }
    }

    /// Whether `name` is one of the recognised palette names.
    pub fn is_known(name: &str) -> bool {
        name.eq_ignore_ascii_case("neon") || name.eq_ignore_ascii_case("ocean")
    }

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Neon => "neon",
            Palette::Ocean => "ocean",
        }
    }

    /// Colour of particle `index` at time `t`.
    ///
    /// `saturation_mul` scales the palette saturation; the product is
    /// clamped to `[0, 1]`.
    pub fn particle_color(&self, index: usize, t: f32, saturation_mul: f32) -> Rgb {
        let i = index as f32;
        let (hue, sat, val) = match self {
            Palette::Ocean => {
                let hue = 180.0 + (i * 3.5 + 18.0 * (0.21 * t + i * 0.05).sin()) % 40.0;
                let sat = 0.65 + 0.20 * (0.13 * t + i * 0.09).sin();
                (hue, sat, 0.95)
            }
            Palette::Neon => {
                let hue = (i * GOLDEN_ANGLE_DEG + 90.0 * (0.23 * t + i * 0.031).sin()) % 360.0;
                let hue = if hue < 0.0 { hue + 360.0 } else { hue };
                (hue, 0.85, 1.0)
            }
        };
        let sat = (sat * saturation_mul).clamp(0.0, 1.0);
        Rgb::from_hsv(hue, sat, val)
    }

    /// Background tint drawn over the whole frame to fade old content.
    pub fn background_tint(&self, t: f32) -> Rgb {
        match self {
            Palette::Ocean => Rgb::from_hsv(210.0 + 6.0 * (0.10 * t).sin(), 0.25, 0.16),
            Palette::Neon => Rgb::from_hsv(200.0, 0.10, 0.14),
        }
    }

    /// Guide colour for attractor `k`.
    pub fn attractor_color(&self, k: usize, t: f32) -> Rgb {
        let base = match self {
            Palette::Ocean => 190.0,
            Palette::Neon => 0.0,
        };
        let k = k as f32;
        let hue = base + 20.0 * k + 10.0 * (0.37 * t + k).sin();
        Rgb::from_hsv(hue % 360.0, 0.40, 0.90)
    }
}

impl FromStr for Palette {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Palette::from_name(s))
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How drawn colours combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Standard alpha blending (default).
    ///
    /// `dst = src * a + dst * (1 - a)`.
    #[default]
    Alpha,

    /// Additive blending.
    ///
    /// `dst = dst + src * a`, saturating. Overlaps get brighter, which is
    /// what makes halos and guide rings glow.
    Additive,
}
