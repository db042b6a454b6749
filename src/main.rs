use std::fs::File;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use evingest::{ingest_file, HeaderMapping, IngestConfig, InputFormat, TracingSink};

#[derive(Parser)]
#[command(name = "evingest", about = "Normalize event-log exports into canonical timeline events")]
struct Cli {
    /// Input file (CSV, JSONL or Redline export).
    input: PathBuf,

    /// Input format. Guessed from the extension when omitted.
    #[arg(long, short)]
    format: Option<InputFormat>,

    /// Config file (TOML, YAML or JSON) layered over the defaults.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// CSV field separator; `\t` or `tab` for tabs.
    #[arg(long, short)]
    delimiter: Option<String>,

    /// Rows per CSV chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// JSON file with header mapping rules.
    #[arg(long, short)]
    mapping: Option<PathBuf>,

    /// Write records here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set).
    #[arg(long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = IngestConfig::load(cli.config.as_deref())?;
    if let Some(delimiter) = cli.delimiter {
        config = config.with_delimiter(delimiter);
    }
    if let Some(chunk_size) = cli.chunk_size {
        config = config.with_chunk_size(chunk_size);
    }
    if let Some(path) = &cli.mapping {
        config = config.with_headers_mapping(HeaderMapping::load_rules(path)?);
    }
    config.validate()?;

    let sink = Box::new(TracingSink);
    let stats = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            ingest_file(&cli.input, cli.format, &config, sink, file)?
        }
        None => ingest_file(&cli.input, cli.format, &config, sink, io::stdout().lock())?,
    };

    tracing::info!("{stats}");
    Ok(())
}
