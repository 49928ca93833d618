//! Batch processing command for multiple invoice files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::stream::{self, StreamExt};
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, warn};

use profex_core::Extractor;

use super::load_config;
use super::output::{OutputFormat, Outcome, render};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of input files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Skip positioned-token table extraction
    #[arg(long)]
    no_tables: bool,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    outcome: Outcome,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    filename: &'a str,
    status: &'a str,
    error: &'a str,
    invoice_no: &'a str,
    customer_name: &'a str,
    date: &'a str,
    items: usize,
    total: Option<f64>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if args.no_tables {
        config.pdf.use_positioned_tokens = false;
    }

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = Arc::new(Extractor::new(&config));
    let jobs = args.jobs.max(1);

    // buffered() yields in input order while running up to `jobs` at once
    let mut tasks = stream::iter(files)
        .map(|path| {
            let extractor = Arc::clone(&extractor);
            tokio::task::spawn_blocking(move || process_file(&extractor, path))
        })
        .buffered(jobs);

    let mut results = Vec::new();
    while let Some(joined) = tasks.next().await {
        let result = joined??;
        pb.inc(1);

        if !result.outcome.record.success {
            let message = &result.outcome.record.message;
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), message);
            } else {
                error!("Failed to process {}: {}", result.path.display(), message);
                pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), message);
            }
        }

        if let Some(output_dir) = &args.output_dir {
            write_output(output_dir, &result, args.format)?;
        }
        results.push(result);
    }

    pb.finish_and_clear();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.outcome.record.success).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.outcome.record.message
            );
        }
    }

    Ok(())
}

fn process_file(extractor: &Extractor, path: PathBuf) -> anyhow::Result<FileResult> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let data = fs::read(&path)
        .map_err(|e| anyhow::anyhow!("Could not read {}: {}", path.display(), e))?;
    let outcome = Outcome::from(extractor.extract(&data, &filename));

    debug!("Processed {} in {}ms", path.display(), outcome.processing_time_ms);
    Ok(FileResult { path, outcome })
}

fn write_output(output_dir: &Path, result: &FileResult, format: OutputFormat) -> anyhow::Result<()> {
    let stem = result
        .path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");
    let output_path = output_dir.join(format!("{}.{}", stem, format.extension()));

    fs::write(&output_path, render(&result.outcome, format, true)?)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    for result in results {
        let record = &result.outcome.record;
        let header = &record.header;

        wtr.serialize(SummaryRow {
            filename: result.path.file_name().and_then(|s| s.to_str()).unwrap_or(""),
            status: if record.success { "success" } else { "error" },
            error: record.error.map_or("", |e| e.as_str()),
            invoice_no: header.invoice_no.as_deref().unwrap_or(""),
            customer_name: header.customer_name.as_deref().unwrap_or(""),
            date: header.date.as_deref().unwrap_or(""),
            items: record.items.len(),
            total: header.total,
            processing_time_ms: result.outcome.processing_time_ms,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
