//! Compare command - diff the summaries of two benchmark runs.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use sparql_bench::compare;

pub fn execute(old: &str, new: &str, output: &str) -> Result<()> {
    let old_path = Path::new(old);
    let new_path = Path::new(new);
    if !old_path.is_file() {
        bail!("Old summary file doesn't exist: {old}");
    }
    if !new_path.is_file() {
        bail!("New summary file doesn't exist: {new}");
    }

    let rows = compare::compare_files(old_path, new_path, Path::new(output))?;
    println!(
        "{} {} diff rows written to {}",
        "Comparison finished:".green().bold(),
        rows,
        output
    );
    Ok(())
}
