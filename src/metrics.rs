//! Periodic CSV metrics.
//!
//! One row per sampling period, stamped with wall-clock seconds since the
//! run started:
//!
//! ```text
//! time_s,smoothed_fps,fps_inst,n,width,height,palette,vsync,threads,ssaa,render_frac,sym
//! 0.501,59.812,60.104,100,800,600,neon,1,8,2,1.00,6
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::MetricsError;
use crate::visuals::Palette;

/// Header line written before any row.
pub const CSV_HEADER: &str =
    "time_s,smoothed_fps,fps_inst,n,width,height,palette,vsync,threads,ssaa,render_frac,sym";

/// One metrics sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsRow {
    pub time_s: f64,
    pub smoothed_fps: f64,
    pub fps_inst: f64,
    pub n: usize,
    pub width: u32,
    pub height: u32,
    pub palette: Palette,
    pub vsync: bool,
    pub threads: usize,
    pub ssaa: u32,
    pub render_frac: f32,
    pub sym: u32,
}

/// Destination for metrics rows.
pub trait MetricsSink {
    fn record(&mut self, row: &MetricsRow) -> Result<(), MetricsError>;
}

/// Writes rows as CSV, flushing after each one.
#[derive(Debug)]
pub struct CsvMetrics<W: Write> {
    out: W,
}

impl CsvMetrics<BufWriter<File>> {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: &Path) -> Result<Self, MetricsError> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvMetrics<W> {
    /// Wrap `out` and write the header.
    pub fn new(mut out: W) -> Result<Self, MetricsError> {
        writeln!(out, "{}", CSV_HEADER)?;
        out.flush()?;
        Ok(Self { out })
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricsSink for CsvMetrics<W> {
    fn record(&mut self, row: &MetricsRow) -> Result<(), MetricsError> {
        writeln!(
            self.out,
            "{:.3},{:.3},{:.3},{},{},{},{},{},{},{},{:.2},{}",
            row.time_s,
            row.smoothed_fps,
            row.fps_inst,
            row.n,
            row.width,
            row.height,
            row.palette,
            u8::from(row.vsync),
            row.threads,
            row.ssaa,
            row.render_frac,
            row.sym
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// Rate-limits rows to one per period.
///
/// A failed write is logged once and disables the recorder; the run itself
/// carries on.
pub struct MetricsRecorder {
    sink: Option<Box<dyn MetricsSink>>,
    period_ms: u64,
    last_ms: u64,
    rows: u64,
}

impl MetricsRecorder {
    pub fn new(sink: Box<dyn MetricsSink>, period_ms: u64) -> Self {
        Self {
            sink: Some(sink),
            period_ms: period_ms.max(1),
            last_ms: 0,
            rows: 0,
        }
    }

    /// Recorder writing CSV to `path`.
    ///
    /// Returns `None` with a warning if the file cannot be created.
    pub fn open_csv(path: &Path, period_ms: u64) -> Option<Self> {
        match CsvMetrics::create(path) {
            Ok(csv) => {
                log::info!("Writing metrics to {}", path.display());
                Some(Self::new(Box::new(csv), period_ms))
            }
            Err(e) => {
                log::warn!("Cannot open metrics file {}: {}; metrics disabled", path.display(), e);
                None
            }
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Rows written so far.
    #[inline]
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Whether a row is due at `elapsed` seconds.
    pub fn is_due(&self, elapsed: f64) -> bool {
        self.is_enabled() && to_millis(elapsed) >= self.last_ms + self.period_ms
    }

    /// Write the row built by `row` if one is due at `elapsed` seconds.
    ///
    /// Returns whether a row was written.
    pub fn offer(&mut self, elapsed: f64, row: impl FnOnce() -> MetricsRow) -> bool {
        if !self.is_due(elapsed) {
            return false;
        }
        let Some(sink) = self.sink.as_mut() else {
            return false;
        };
        match sink.record(&row()) {
            Ok(()) => {
                self.last_ms = to_millis(elapsed);
                self.rows += 1;
                true
            }
            Err(e) => {
                log::warn!("{}; metrics disabled", e);
                self.sink = None;
                false
            }
        }
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("enabled", &self.is_enabled())
            .field("period_ms", &self.period_ms)
            .field("rows", &self.rows)
            .finish()
    }
}

fn to_millis(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0) as u64
}
