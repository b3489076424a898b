//! Latency micro-benchmark for SPARQL endpoints.
//!
//! Issues a corpus of query templates against a single HTTP endpoint,
//! measures time-to-first-byte and time-to-last-byte per request, writes
//! raw timings and per-template summary statistics as CSV, and ships an
//! offline comparator for summaries from two runs.

pub mod compare;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod executor;
pub mod recorder;
pub mod stats;

// Re-export commonly used types
pub use config::BenchConfig;
pub use corpus::QueryGroup;
pub use driver::BenchmarkDriver;
pub use recorder::TimingRecorder;
pub use stats::RunningStats;
