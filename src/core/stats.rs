//! Timing statistics across repeated operations
//!
//! Three append-only series (training iterations, fit computation, held-out
//! evaluation). Summaries are computed from a snapshot of the raw series, so
//! a report can be taken from another thread while values are appended.

use crate::utils::memory::MemoryUsage;
use std::{
    fmt,
    io::{self, Write},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tracing::debug;

/// One of the timing series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Training,
    Fit,
    Eval,
}

impl Series {
    /// Label used in the report
    pub const fn label(self) -> &'static str {
        match self {
            Self::Training => "iteration_time",
            Self::Fit => "fit_time",
            Self::Eval => "eval_time",
        }
    }
}

/// Aggregate statistics of one series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl SeriesSummary {
    /// Summarize a series; `None` when it is empty
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            count: values.len(),
            min,
            max,
            mean,
        })
    }
}

/// Shared, thread-safe timing series for one run
#[derive(Debug, Default)]
pub struct TimingStats {
    training: Mutex<Vec<f64>>,
    fit: Mutex<Vec<f64>>,
    eval: Mutex<Vec<f64>>,
    show_fit: AtomicBool,
}

impl TimingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the fit series appears in reports (`--compute-fit`)
    pub fn set_show_fit(&self, show: bool) {
        self.show_fit.store(show, Ordering::SeqCst);
    }

    pub fn show_fit(&self) -> bool {
        self.show_fit.load(Ordering::SeqCst)
    }

    /// Append a duration in seconds
    pub fn record_seconds(&self, series: Series, seconds: f64) {
        self.series(series).push(seconds);
    }

    /// Append a duration
    pub fn record(&self, series: Series, duration: Duration) {
        self.record_seconds(series, duration.as_secs_f64());
    }

    /// Run `operation`, recording its wall-clock time into `series`
    pub fn time<T>(&self, series: Series, operation: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let result = operation();
        let elapsed = started.elapsed();
        debug!("{} += {:?}", series.label(), elapsed);
        self.record(series, elapsed);
        result
    }

    /// Copy of the raw values of `series`
    pub fn snapshot(&self, series: Series) -> Vec<f64> {
        self.series(series).clone()
    }

    /// Summary of `series`, computed from a snapshot
    pub fn summary(&self, series: Series) -> Option<SeriesSummary> {
        SeriesSummary::of(&self.snapshot(series))
    }

    /// Build the report for the current state of all series
    pub fn report(&self) -> StatsReport {
        let mut lines = Vec::new();
        for series in [Series::Training, Series::Fit, Series::Eval] {
            if series == Series::Fit && !self.show_fit() {
                continue;
            }
            if let Some(summary) = self.summary(series) {
                lines.push((series, summary));
            }
        }
        StatsReport {
            lines,
            memory: MemoryUsage::current(),
        }
    }

    /// Write the report to `out`
    pub fn write_report<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.report())?;
        out.flush()
    }

    fn series(&self, series: Series) -> MutexGuard<'_, Vec<f64>> {
        let slot = match series {
            Series::Training => &self.training,
            Series::Fit => &self.fit,
            Series::Eval => &self.eval,
        };
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rendered timing summaries followed by the memory line
#[derive(Debug, Clone)]
pub struct StatsReport {
    lines: Vec<(Series, SeriesSummary)>,
    memory: MemoryUsage,
}

impl StatsReport {
    /// Series that produced a line, in report order
    pub fn series(&self) -> impl Iterator<Item = Series> + '_ {
        self.lines.iter().map(|(series, _)| *series)
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (series, summary) in &self.lines {
            writeln!(
                f,
                "{}: count={}, min={}, max={}, avg={}",
                series.label(),
                summary.count,
                format_seconds(summary.min),
                format_seconds(summary.max),
                format_seconds(summary.mean)
            )?;
        }
        writeln!(f, "{}", self.memory)
    }
}

/// At most two decimals, trailing zeros dropped
fn format_seconds(value: f64) -> String {
    let text = format!("{value:.2}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
