use anyhow::Result;
use clap::{Parser, Subcommand};
use sparql_bench::config::{DEFAULT_ITERATIONS, DEFAULT_PACING_MS, DEFAULT_POOL_SIZE};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Latency micro-benchmark for SPARQL endpoints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark against an endpoint
    Run {
        /// SPARQL endpoint URL
        #[arg(short = 'u', long)]
        url: String,

        /// Directory where each file holds one query template
        #[arg(short, long)]
        queries: String,

        /// Directory where results are stored
        #[arg(short, long)]
        output: String,

        /// Concurrent repetitions per measured query
        #[arg(short = 'N', long, default_value_t = DEFAULT_POOL_SIZE)]
        pool_size: usize,

        /// Sequential iterations per repetition, timings averaged
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,

        /// Delay between requests in milliseconds
        #[arg(long, default_value_t = DEFAULT_PACING_MS)]
        pacing_ms: u64,

        /// Drop warm-up response bodies instead of saving them
        #[arg(long)]
        discard_warm_up: bool,

        /// Output a machine-readable completion summary
        #[arg(short, long)]
        json: bool,
    },

    /// Compare summary.csv files from two previous runs
    Compare {
        /// summary.csv of the baseline run
        old: String,

        /// summary.csv of the new run
        new: String,

        /// Path for the diff report
        #[arg(short, long, default_value = "diff.csv")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            url,
            queries,
            output,
            pool_size,
            iterations,
            pacing_ms,
            discard_warm_up,
            json,
        } => {
            commands::run::execute(commands::run::RunOptions {
                url,
                queries,
                output,
                pool_size,
                iterations,
                pacing_ms,
                discard_warm_up,
                json,
            })?;
        }
        Commands::Compare { old, new, output } => {
            commands::compare::execute(&old, &new, &output)?;
        }
    }

    Ok(())
}
