//! Golden fixture generator
//!
//! Regenerates the activation and module test-data documents consumed by
//! layer integration tests.
//!
//! # Usage
//!
//! ```bash
//! # Write both documents under the current directory
//! goldvec
//!
//! # Write only the module batch under another root
//! goldvec --output-dir ../tests --batch modules
//!
//! # Fail if the documents on disk differ from a fresh generation
//! goldvec --check
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use goldvec::generator::{BatchKind, Generator, GeneratorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BatchArg {
    Activations,
    Modules,
    All,
}

impl BatchArg {
    fn kinds(self) -> &'static [BatchKind] {
        match self {
            BatchArg::Activations => &[BatchKind::Activations],
            BatchArg::Modules => &[BatchKind::Modules],
            BatchArg::All => &BatchKind::ALL,
        }
    }
}

/// Deterministic golden test vectors for neural-network layers
#[derive(Parser, Debug)]
#[command(name = "goldvec")]
#[command(version)]
struct Args {
    /// Root directory the TestData/ documents are written under
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Which batch to generate
    #[arg(short, long, value_enum, default_value_t = BatchArg::All)]
    batch: BatchArg,

    /// Compare against the documents on disk instead of writing
    #[arg(long)]
    check: bool,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

/// A valid `RUST_LOG` wins; otherwise `--verbose` picks debug over info.
fn log_filter(rust_log: Option<String>, verbose: bool) -> EnvFilter {
    if let Some(directives) = rust_log {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return filter;
        }
    }
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    EnvFilter::new(level.as_str())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), args.verbose))
        .with_writer(std::io::stderr)
        .init();

    let generator = Generator::new(GeneratorConfig::default().with_output_root(&args.output_dir));

    if args.check {
        let mut drifted = Vec::new();
        for &kind in args.batch.kinds() {
            let (path, status) = generator
                .check(kind)
                .with_context(|| format!("failed to check {kind} test data"))?;
            if !status.is_up_to_date() {
                drifted.push(format!("{} ({status:?})", path.display()));
            }
        }
        if !drifted.is_empty() {
            bail!("test data out of date: {}", drifted.join(", "));
        }
        return Ok(());
    }

    for &kind in args.batch.kinds() {
        let path = generator
            .write(kind)
            .with_context(|| format!("failed to generate {kind} test data"))?;
        println!("Wrote {kind} test data to {}", path.display());
    }
    Ok(())
}
