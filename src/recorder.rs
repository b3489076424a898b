//! Timing capture and CSV persistence.
//!
//! One `TimingRecorder` lives for the whole run. It owns the two output file
//! handles, opened once in append mode, so already-finished groups stay on
//! disk even if a later group aborts the run.

use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::stats::RunningStats;

/// Raw per-query timings, one row per measured query.
pub const TIMINGS_FILE: &str = "time.csv";

/// Aggregated statistics, 8 rows per group.
pub const SUMMARY_FILE: &str = "summary.csv";

pub struct TimingRecorder {
    timings_out: File,
    summary_out: File,
    ttfb: RunningStats,
    ttlb: RunningStats,
    rows: Vec<String>,
    group_id: Option<String>,
}

impl TimingRecorder {
    /// Open `time.csv` and `summary.csv` under `output_dir`, creating them
    /// if absent and appending if present. Files grow monotonically across
    /// the run; nothing is ever truncated.
    pub fn create(output_dir: &Path) -> Result<Self> {
        Ok(Self {
            timings_out: append_handle(&output_dir.join(TIMINGS_FILE))?,
            summary_out: append_handle(&output_dir.join(SUMMARY_FILE))?,
            ttfb: RunningStats::new(),
            ttlb: RunningStats::new(),
            rows: Vec::new(),
            group_id: None,
        })
    }

    /// Begin a new group: both accumulators and the raw-row buffer reset.
    pub fn start_group(&mut self, id: &str) {
        self.group_id = Some(id.to_string());
        self.rows.clear();
        self.ttfb.clear();
        self.ttlb.clear();
    }

    /// Record one measured execution. Timings are converted to seconds and
    /// buffered as a `group,query,ttfb,ttlb` row with 4 decimal places.
    pub fn handle(&mut self, query_id: usize, ttfb: Duration, ttlb: Duration) -> Result<()> {
        let group = self
            .group_id
            .as_deref()
            .context("Timing recorded outside an active group")?;

        let ttfb_secs = ttfb.as_secs_f64();
        let ttlb_secs = ttlb.as_secs_f64();
        self.ttfb.add_value(ttfb_secs);
        self.ttlb.add_value(ttlb_secs);
        self.rows
            .push(format!("{group},{query_id},{ttfb_secs:.4},{ttlb_secs:.4}"));
        Ok(())
    }

    /// Flush the group: append the buffered raw rows to the timings file and
    /// the 8 summary rows (ttfb then ttlb, each min/mean/std/max) to the
    /// summary file.
    pub fn finish_group(&mut self) -> Result<()> {
        let group = self
            .group_id
            .take()
            .context("finish_group called outside an active group")?;
        if self.ttfb.count() == 0 {
            bail!("Query template {group} produced no measured samples");
        }

        for row in &self.rows {
            writeln!(self.timings_out, "{row}")
                .with_context(|| format!("Failed to append timings for template {group}"))?;
        }
        self.rows.clear();

        for (metric, stats) in [("ttfb", &self.ttfb), ("ttlb", &self.ttlb)] {
            for (stat, value) in [
                ("min", stats.min()?),
                ("mean", stats.mean()?),
                ("std", stats.std()?),
                ("max", stats.max()?),
            ] {
                writeln!(self.summary_out, "{group},{metric},{stat},{value:.4}")
                    .with_context(|| format!("Failed to append summary for template {group}"))?;
            }
        }

        self.timings_out.flush()?;
        self.summary_out.flush()?;
        Ok(())
    }
}

fn append_handle(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))
}
