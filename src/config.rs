//! Run configuration and the persisted run manifest.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_POOL_SIZE: usize = 1;
pub const DEFAULT_ITERATIONS: usize = 1;
pub const DEFAULT_PACING_MS: u64 = 1000;

pub const MANIFEST_FILE: &str = "run.json";

/// Everything a benchmark run needs, built once at startup and passed by
/// reference into the driver and executor.
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// SPARQL endpoint URL, receives the raw query text via POST.
    pub endpoint: String,
    pub queries_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Concurrent repetitions per measured query; their timings are averaged
    /// into a single sample.
    pub pool_size: usize,
    /// Sequential requests per repetition, averaged before the pool average.
    pub iterations: usize,
    /// Sleep after every request, warm-up or measured.
    pub pacing: Duration,
    /// Persist warm-up response bodies to `<group>-0.txt`.
    pub capture_warm_up: bool,
}

/// Metadata written next to the CSV outputs so a later comparison can tell
/// which endpoint and settings produced the run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunManifest {
    pub endpoint: String,
    pub pool_size: usize,
    pub iterations: usize,
    pub pacing_ms: u64,
    pub started_at: DateTime<Utc>,
    pub templates: Vec<String>,
}

impl RunManifest {
    pub fn new(config: &BenchConfig, templates: Vec<String>) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            pool_size: config.pool_size,
            iterations: config.iterations,
            pacing_ms: config.pacing.as_millis() as u64,
            started_at: Utc::now(),
            templates,
        }
    }

    pub fn save(&self, output_dir: &Path) -> Result<()> {
        let path = output_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write run manifest: {}", path.display()))
    }

    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read run manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse run manifest: {}", path.display()))
    }
}
