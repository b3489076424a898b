//! HTTP request execution and latency measurement.
//!
//! TTFB is taken when the response head arrives, TTLB after the body is
//! fully drained. Both clocks start just before the request is sent.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::BenchConfig;

/// SPARQL protocol media type for a direct POST of the query text.
const SPARQL_QUERY_CONTENT_TYPE: &str = "application/sparql-query; charset=utf-8";

/// Build the shared blocking client. Per-request timeouts are disabled so
/// slow queries are measured rather than interrupted.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(None)
        .user_agent(concat!("sparql-bench/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Issues query requests against the endpoint. The client is shared; each
/// `execute` call runs its repetition pool to completion before returning,
/// so no two calls ever interleave.
pub struct RequestExecutor<'a> {
    client: &'a Client,
    config: &'a BenchConfig,
}

impl<'a> RequestExecutor<'a> {
    pub fn new(client: &'a Client, config: &'a BenchConfig) -> Self {
        Self { client, config }
    }

    /// Issue the warm-up request and fully drain the response. With a
    /// capture path the body is persisted for inspection, otherwise it is
    /// discarded.
    pub fn execute_warm_up(&self, query: &str, capture: Option<&Path>) -> Result<()> {
        let mut response = self.send(query)?;
        match capture {
            Some(path) => {
                let mut body = String::new();
                response
                    .read_to_string(&mut body)
                    .context("Failed to read warm-up response body")?;
                fs::write(path, body).with_context(|| {
                    format!("Failed to write warm-up response: {}", path.display())
                })?;
            }
            None => {
                io::copy(&mut response, &mut io::sink())
                    .context("Failed to drain warm-up response body")?;
            }
        }
        Ok(())
    }

    /// Execute the configured number of concurrent repetitions of `query`
    /// and reduce them to one averaged (ttfb, ttlb) pair.
    ///
    /// Each repetition runs on its own scoped thread and writes into its own
    /// slot; the scope join is the only synchronization.
    pub fn execute(&self, query: &str) -> Result<(Duration, Duration)> {
        let pool_size = self.config.pool_size.max(1);
        let mut slots: Vec<Option<Result<(Duration, Duration)>>> =
            (0..pool_size).map(|_| None).collect();

        thread::scope(|scope| {
            for slot in slots.iter_mut() {
                scope.spawn(move || {
                    *slot = Some(self.run_repetition(query));
                });
            }
        });

        let mut ttfb_total = Duration::ZERO;
        let mut ttlb_total = Duration::ZERO;
        for slot in slots {
            let (ttfb, ttlb) = slot.ok_or_else(|| anyhow!("Repetition reported no result"))??;
            ttfb_total += ttfb;
            ttlb_total += ttlb;
        }
        Ok((ttfb_total / pool_size as u32, ttlb_total / pool_size as u32))
    }

    /// One repetition: sequential iterations of the same request, timings
    /// averaged.
    fn run_repetition(&self, query: &str) -> Result<(Duration, Duration)> {
        let iterations = self.config.iterations.max(1);
        let mut ttfb_total = Duration::ZERO;
        let mut ttlb_total = Duration::ZERO;
        for _ in 0..iterations {
            let (ttfb, ttlb) = self.measure_once(query)?;
            ttfb_total += ttfb;
            ttlb_total += ttlb;
        }
        Ok((ttfb_total / iterations as u32, ttlb_total / iterations as u32))
    }

    fn measure_once(&self, query: &str) -> Result<(Duration, Duration)> {
        let start = Instant::now();
        let mut response = self.send(query)?;
        let ttfb = start.elapsed();
        io::copy(&mut response, &mut io::sink()).context("Failed to drain response body")?;
        let ttlb = start.elapsed();
        Ok((ttfb, ttlb))
    }

    fn send(&self, query: &str) -> Result<reqwest::blocking::Response> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, SPARQL_QUERY_CONTENT_TYPE)
            .body(query.to_string())
            .send()
            .with_context(|| format!("Request to {} failed", self.config.endpoint))?;
        response.error_for_status_ref().with_context(|| {
            format!("Endpoint {} returned an error status", self.config.endpoint)
        })?;
        Ok(response)
    }
}
