//! Per-frame status snapshots.
//!
//! The engine builds a [`FrameStatus`] at the end of every frame and hands
//! it to an optional [`StatusObserver`]. Its `Display` form is the one-line
//! readout shown in the window title.

use std::fmt;

use crate::visuals::Palette;

/// What the engine did in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStatus {
    pub smoothed_fps: f64,
    pub fps_instant: f64,
    /// Output surface size.
    pub output_size: (u32, u32),
    /// Size of the surface drawn on, larger than the output when supersampling.
    pub render_size: (u32, u32),
    pub supersampling: u32,
    pub render_fraction: f32,
    pub glow: bool,
    /// Symmetry actually drawn this frame.
    pub symmetry: u32,
    pub mirror: bool,
    pub palette: Palette,
    pub particles: usize,
    pub threads: usize,
    pub frame: u64,
    /// Wall-clock seconds since start.
    pub elapsed: f64,
}

impl fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mandala | FPS: {:.1} | thr={} | N={} win={}x{} RT={}x{} SSAA={} | palette={} glow={} | sym={} mir={} frac={:.2}",
            self.smoothed_fps,
            self.threads,
            self.particles,
            self.output_size.0,
            self.output_size.1,
            self.render_size.0,
            self.render_size.1,
            self.supersampling,
            self.palette,
            u8::from(self.glow),
            self.symmetry,
            u8::from(self.mirror),
            self.render_fraction
        )
    }
}

/// Receives a status snapshot once per frame.
pub trait StatusObserver {
    fn observe(&mut self, status: &FrameStatus);
}

impl<F> StatusObserver for F
where
    F: FnMut(&FrameStatus),
{
    fn observe(&mut self, status: &FrameStatus) {
        self(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status() -> FrameStatus {
        FrameStatus {
            smoothed_fps: 59.94,
            fps_instant: 61.0,
            output_size: (800, 600),
            render_size: (1600, 1200),
            supersampling: 2,
            render_fraction: 1.0,
            glow: false,
            symmetry: 6,
            mirror: true,
            palette: Palette::Neon,
            particles: 100,
            threads: 8,
            frame: 12,
            elapsed: 0.2,
        }
    }

    #[test]
    fn test_title_readout() {
        assert_eq!(
            status().to_string(),
            "Mandala | FPS: 59.9 | thr=8 | N=100 win=800x600 RT=1600x1200 SSAA=2 | palette=neon glow=0 | sym=6 mir=1 frac=1.00"
        );
    }

    #[test]
    fn test_closure_observer() {
        let mut frames = Vec::new();
        {
            let mut observer = |s: &FrameStatus| frames.push(s.frame);
            observer.observe(&status());
            observer.observe(&status());
        }
        assert_eq!(frames, vec![12, 12]);
    }
}
