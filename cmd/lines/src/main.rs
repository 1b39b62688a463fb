//! sluice-lines - reads a file through a bucket pipeline, line by line.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use sluice_bucket::{Bucket, EolSet, Scratch};
use tracing_subscriber::EnvFilter;

mod config;
mod lines;

use config::{EolMode, load_config};
use lines::{Pipeline, copy_lines};

/// sluice-lines - reads a file through a bucket pipeline, line by line.
///
/// The source is wrapped in order: base64 decoding, skipping, then the
/// length limit. Lines keep their terminators, so without `--count` the
/// output reproduces the selected bytes.
#[derive(Parser)]
#[command(name = "sluice-lines")]
#[command(about = "Read a file through a bucket pipeline, line by line")]
#[command(version)]
pub struct Cli {
    /// Input file, or `-` for stdin
    pub path: String,

    /// Config file (YAML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip this many bytes first
    #[arg(long, default_value_t = 0)]
    pub skip: u64,

    /// Read at most this many bytes after skipping
    #[arg(long)]
    pub take: Option<u64>,

    /// Decode the input as base64
    #[arg(long)]
    pub base64: bool,

    /// Line terminators (default from config, else lf)
    #[arg(long, value_enum)]
    pub eol: Option<EolMode>,

    /// Longest line before it is cut
    #[arg(long)]
    pub max_line: Option<usize>,

    /// Print totals instead of the lines
    #[arg(long)]
    pub count: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let mut bucket_config = config.bucket;
    if let Some(max) = cli.max_line {
        bucket_config = bucket_config.with_max_line_length(max);
    }
    bucket_config.validate()?;
    let eol = EolSet::from(cli.eol.or(config.eol).unwrap_or_default());

    let scratch = Scratch::with_config(&bucket_config);
    let pipeline = Pipeline {
        base64: cli.base64,
        skip: cli.skip,
        take: cli.take,
    };
    let mut bucket = pipeline.open(&cli.path, &bucket_config, &scratch)?;
    tracing::debug!(bucket = bucket.name(), ?eol, "reading lines");

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let stats = if cli.count {
        copy_lines(
            &mut bucket,
            eol,
            bucket_config.max_line_length,
            &scratch,
            None,
        )?
    } else {
        copy_lines(
            &mut bucket,
            eol,
            bucket_config.max_line_length,
            &scratch,
            Some(&mut out as &mut dyn Write),
        )?
    };

    if cli.count {
        writeln!(out, "lines: {}", stats.lines)?;
        writeln!(out, "bytes: {}", stats.bytes)?;
        if stats.truncated > 0 {
            writeln!(out, "truncated: {}", stats.truncated)?;
        }
    }
    out.flush()?;
    Ok(())
}
