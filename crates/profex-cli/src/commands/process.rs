//! Process command - extract data from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use profex_core::Extractor;

use super::load_config;
use super::output::{OutputFormat, Outcome, render};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Skip positioned-token table extraction
    #[arg(long)]
    no_tables: bool,

    /// Show processing details
    #[arg(long)]
    show_details: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if args.no_tables {
        config.pdf.use_positioned_tokens = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Extracting invoice data...");

    let data = fs::read(&args.input)?;
    let filename = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let extractor = Extractor::new(&config);
    let result = tokio::task::spawn_blocking(move || extractor.extract(&data, &filename)).await?;
    let backend = result.as_ref().map(|e| e.backend).ok();
    let outcome = Outcome::from(result);

    pb.finish_and_clear();

    let output = render(&outcome, args.format, args.pretty)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_details {
        println!();
        if let Some(backend) = backend {
            println!("{} Text backend: {}", style("ℹ").blue(), backend);
        }
        if let Some(invoice) = &outcome.invoice {
            println!(
                "{} Items: {} (source: {:?})",
                style("ℹ").blue(),
                invoice.items.len(),
                invoice.item_source
            );
        }
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            outcome.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if !outcome.record.success {
        anyhow::bail!("{}", outcome.record.message);
    }

    Ok(())
}
