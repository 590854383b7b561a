use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mbna::{ArbiterConfig, Pipeline, SensorFrame};

#[derive(Debug, Parser)]
#[command(name = "mbna-replay")]
#[command(about = "Replay recorded sensor frames through the navigation arbiter")]
struct Cli {
    /// JSON-lines file, one sensor frame per line
    #[arg(long)]
    input: PathBuf,

    /// Arbiter configuration (TOML); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit the full cycle report instead of the decision only
    #[arg(long, default_value_t = false)]
    full: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ArbiterConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ArbiterConfig::default(),
    };
    let mut pipeline = Pipeline::standard(config).context("failed to build arbiter pipeline")?;

    let input = File::open(&cli.input).with_context(|| format!("failed to open {}", cli.input.display()))?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut refusals = 0_u64;
    for (idx, line) in BufReader::new(input).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: SensorFrame =
            serde_json::from_str(&line).with_context(|| format!("invalid sensor frame on line {}", idx + 1))?;

        let report = pipeline.process(&frame)?;
        if report.decision.nav_unsafe {
            refusals += 1;
        }
        if cli.full {
            serde_json::to_writer(&mut out, &report)?;
        } else {
            serde_json::to_writer(&mut out, &report.decision)?;
        }
        writeln!(out)?;
    }
    out.flush()?;

    info!(cycles = pipeline.cycles(), refusals, "replay finished");
    Ok(())
}
