//! Benchmark orchestration.
//!
//! Two passes over the corpus: a warm-up pass that executes only each
//! group's first query, then a measured pass over every remaining query.
//! A pacing sleep follows every request in both passes. Any failure aborts
//! the whole run; there is no per-query retry.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::thread;

use crate::config::BenchConfig;
use crate::corpus::QueryGroup;
use crate::executor::RequestExecutor;
use crate::recorder::TimingRecorder;

pub struct BenchmarkDriver<'a> {
    config: &'a BenchConfig,
    executor: RequestExecutor<'a>,
    recorder: TimingRecorder,
}

impl<'a> BenchmarkDriver<'a> {
    pub fn new(config: &'a BenchConfig, client: &'a Client) -> Result<Self> {
        Ok(Self {
            config,
            executor: RequestExecutor::new(client, config),
            recorder: TimingRecorder::create(&config.output_dir)?,
        })
    }

    /// Run the full benchmark over `groups`. Returns the number of measured
    /// query executions.
    pub fn run(&mut self, groups: &[QueryGroup]) -> Result<usize> {
        println!("Running warm-up queries...");
        for group in groups {
            self.warm_up_group(group)?;
        }

        println!("Running benchmark queries...");
        let mut measured = 0;
        for group in groups {
            measured += self.measure_group(group)?;
        }
        Ok(measured)
    }

    fn warm_up_group(&mut self, group: &QueryGroup) -> Result<()> {
        println!("Executing warm-up query for {}...", group.id);

        let capture = self
            .config
            .capture_warm_up
            .then(|| self.config.output_dir.join(format!("{}-0.txt", group.id)));
        self.executor
            .execute_warm_up(group.warm_up(), capture.as_deref())
            .with_context(|| format!("Warm-up query of template {} failed", group.id))?;
        self.pace();
        Ok(())
    }

    fn measure_group(&mut self, group: &QueryGroup) -> Result<usize> {
        if group.queries.len() < 2 {
            println!(
                "Query template {} has no measured queries, skipping",
                group.id
            );
            return Ok(0);
        }

        println!("Started query template {}", group.id);
        self.recorder.start_group(&group.id);

        let mut measured = 0;
        for (query_id, query) in group.measured() {
            println!("  Executing query {query_id}...");
            let (ttfb, ttlb) = self
                .executor
                .execute(query)
                .with_context(|| format!("Query {query_id} of template {} failed", group.id))?;
            self.recorder.handle(query_id, ttfb, ttlb)?;
            measured += 1;
            self.pace();
        }

        self.recorder
            .finish_group()
            .with_context(|| format!("Failed to flush summary for template {}", group.id))?;
        Ok(measured)
    }

    fn pace(&self) {
        if !self.config.pacing.is_zero() {
            thread::sleep(self.config.pacing);
        }
    }
}
