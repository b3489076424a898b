//! Run command - execute the benchmark against an endpoint.
//!
//! Validates directories and builds the run context before any network
//! activity; the core pipeline lives in the library modules.

use anyhow::{bail, Result};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use sparql_bench::config::{BenchConfig, RunManifest};
use sparql_bench::corpus;
use sparql_bench::driver::BenchmarkDriver;
use sparql_bench::executor;
use sparql_bench::recorder::{SUMMARY_FILE, TIMINGS_FILE};

pub struct RunOptions {
    pub url: String,
    pub queries: String,
    pub output: String,
    pub pool_size: usize,
    pub iterations: usize,
    pub pacing_ms: u64,
    pub discard_warm_up: bool,
    pub json: bool,
}

pub fn execute(options: RunOptions) -> Result<()> {
    let queries_dir = PathBuf::from(&options.queries);
    if !queries_dir.is_dir() {
        bail!("The queries directory doesn't exist: {}", options.queries);
    }
    if options.pool_size == 0 {
        bail!("Pool size must be at least 1");
    }
    if options.iterations == 0 {
        bail!("Iterations must be at least 1");
    }

    let output_dir = PathBuf::from(&options.output);
    if !output_dir.exists() {
        println!(
            "Output directory is missing. Creating {} ...",
            output_dir.display()
        );
        fs::create_dir_all(&output_dir)?;
    }

    let config = BenchConfig {
        endpoint: options.url,
        queries_dir,
        output_dir,
        pool_size: options.pool_size,
        iterations: options.iterations,
        pacing: Duration::from_millis(options.pacing_ms),
        capture_warm_up: !options.discard_warm_up,
    };

    let groups = corpus::load_groups(&config.queries_dir)?;
    let templates: Vec<String> = groups.iter().map(|g| g.id.clone()).collect();
    RunManifest::new(&config, templates.clone()).save(&config.output_dir)?;

    let client = executor::build_client()?;
    let mut driver = BenchmarkDriver::new(&config, &client)?;
    let measured = driver.run(&groups)?;

    if options.json {
        let result = serde_json::json!({
            "endpoint": config.endpoint,
            "templates": templates,
            "measured_queries": measured,
            "timings_file": config.output_dir.join(TIMINGS_FILE),
            "summary_file": config.output_dir.join(SUMMARY_FILE),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} templates, {} measured queries. Results in {}",
        "Benchmark finished:".green().bold(),
        templates.len(),
        measured,
        config.output_dir.display()
    );
    Ok(())
}
