//! Offline comparison of two benchmark summaries.
//!
//! Reads two `summary.csv` files, reconstructs per-group statistics and
//! emits a diff report: absolute difference (`old - new`) and relative
//! difference in percent (`(old/new - 1) * 100`) for every metric/stat pair
//! of every group in the old dataset. Missing groups or keys in the new
//! dataset abort the comparison.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub const METRICS: [&str; 2] = ["ttfb", "ttlb"];
pub const STATS: [&str; 4] = ["min", "mean", "std", "max"];

/// Header of the diff report (spacing kept for compatibility with existing
/// downstream spreadsheets).
pub const DIFF_HEADER: &str =
    "Query template,Time type, Stat type, Difference (abs.), Difference (%)";

/// Summary statistics for one query template, keyed by `metric-stat`.
#[derive(Debug, Default)]
pub struct SummaryResult {
    values: HashMap<String, f64>,
}

impl SummaryResult {
    fn insert(&mut self, metric: &str, stat: &str, value: f64) {
        self.values.insert(format!("{metric}-{stat}"), value);
    }

    pub fn get(&self, metric: &str, stat: &str) -> Result<f64> {
        self.values
            .get(&format!("{metric}-{stat}"))
            .copied()
            .with_context(|| format!("Missing {metric} {stat} entry"))
    }
}

/// A parsed summary file: groups in file order, indexed by group id.
#[derive(Debug, Default)]
pub struct SummaryData {
    groups: Vec<(String, SummaryResult)>,
    index: HashMap<String, usize>,
}

impl SummaryData {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SummaryResult)> {
        self.groups.iter().map(|(id, result)| (id.as_str(), result))
    }

    pub fn get(&self, group: &str) -> Option<&SummaryResult> {
        self.index.get(group).map(|&i| &self.groups[i].1)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// One row of the diff report.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRow {
    pub group: String,
    pub metric: &'static str,
    pub stat: &'static str,
    pub abs: f64,
    pub rel: f64,
}

/// Parse a summary file. Rows for a group are expected to be contiguous
/// (the benchmark writes them that way); a group id reappearing after a
/// different group is a malformed input.
pub fn read_summary(path: &Path) -> Result<SummaryData> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read summary file: {}", path.display()))?;

    let mut data = SummaryData::default();
    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let &[group, metric, stat, value] = fields.as_slice() else {
            bail!(
                "Malformed summary row at {}:{}: {line}",
                path.display(),
                line_no + 1
            );
        };
        let value: f64 = value.trim().parse().with_context(|| {
            format!(
                "Invalid numeric value at {}:{}: {line}",
                path.display(),
                line_no + 1
            )
        })?;

        let continues_run = data
            .groups
            .last()
            .is_some_and(|(id, _)| id == group);
        if !continues_run {
            if data.index.contains_key(group) {
                bail!(
                    "Group {group} appears in non-contiguous runs in {}",
                    path.display()
                );
            }
            data.index.insert(group.to_string(), data.groups.len());
            data.groups.push((group.to_string(), SummaryResult::default()));
        }
        if let Some((_, result)) = data.groups.last_mut() {
            result.insert(metric, stat, value);
        }
    }

    Ok(data)
}

/// Join the old dataset against the new one and compute 8 diff rows per
/// group, in the old file's group order.
pub fn compare(old: &SummaryData, new: &SummaryData) -> Result<Vec<DiffRow>> {
    let mut rows = Vec::with_capacity(old.len() * METRICS.len() * STATS.len());
    for (group, old_result) in old.iter() {
        let new_result = new
            .get(group)
            .with_context(|| format!("Group {group} is missing from the new summary"))?;

        for metric in METRICS {
            for stat in STATS {
                let old_value = old_result
                    .get(metric, stat)
                    .with_context(|| format!("Old summary, group {group}"))?;
                let new_value = new_result
                    .get(metric, stat)
                    .with_context(|| format!("New summary, group {group}"))?;
                let rel = relative_diff(old_value, new_value).with_context(|| {
                    format!("Cannot compare {metric} {stat} of group {group}")
                })?;
                rows.push(DiffRow {
                    group: group.to_string(),
                    metric,
                    stat,
                    abs: old_value - new_value,
                    rel,
                });
            }
        }
    }
    Ok(rows)
}

/// Relative difference in percent. Two zeros compare equal; a non-zero old
/// value against a zero new value has no defined ratio.
fn relative_diff(old: f64, new: f64) -> Result<f64> {
    if new == 0.0 {
        if old == 0.0 {
            return Ok(0.0);
        }
        bail!("relative difference undefined, new value is zero");
    }
    Ok((old / new - 1.0) * 100.0)
}

/// Write the diff report with its header, 4-decimal fixed formatting.
pub fn write_diff(path: &Path, rows: &[DiffRow]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create diff report: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "{DIFF_HEADER}")?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{:.4},{:.4}",
            row.group, row.metric, row.stat, row.abs, row.rel
        )?;
    }
    out.flush()
        .with_context(|| format!("Failed to write diff report: {}", path.display()))
}

/// Compare two summary files and write the diff report. Returns the number
/// of diff rows written.
pub fn compare_files(old: &Path, new: &Path, out: &Path) -> Result<usize> {
    let old_data = read_summary(old)?;
    let new_data = read_summary(new)?;
    if old_data.is_empty() {
        bail!("Summary file holds no rows: {}", old.display());
    }

    let rows = compare(&old_data, &new_data)?;
    write_diff(out, &rows)?;
    Ok(rows.len())
}
