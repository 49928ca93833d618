//! Text command - parse invoice text that was extracted elsewhere.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use profex_core::Extractor;

use super::load_config;
use super::output::{OutputFormat, Outcome, render};

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Input text file, or "-" for stdin
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

pub async fn run(args: TextArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let text = if args.input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        info!("Reading text from {}", args.input);
        fs::read_to_string(&args.input)
            .map_err(|e| anyhow::anyhow!("Could not read {}: {}", args.input, e))?
    };

    let outcome = Outcome::from(Extractor::new(&config).extract_from_text(&text));
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

    if !outcome.record.success {
        anyhow::bail!("{}", outcome.record.message);
    }

    Ok(())
}
