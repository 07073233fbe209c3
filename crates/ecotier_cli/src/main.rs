//! `ecotier` command-line entry point.
//!
//! # Responsibility
//! - Decode a JSON event batch from a file or stdin.
//! - Resolve config as file, then `ECOTIER_*` environment, then flags.
//! - Write recommendations (or the full explain payload) to stdout.
//!
//! # Invariants
//! - stdout carries only the final JSON document; logs go to stderr or files.
//! - Any failure exits with status 1 before anything is written to stdout.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ecotier_core::{
    default_log_level, init_logging, init_stderr_logging, EmissionsEvent, PipelineConfig,
    RecommendationService, TierLabeling,
};
use log::{error, info};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Tiered emissions recommendations from a batch of activity events.
#[derive(Debug, Parser)]
#[command(name = "ecotier")]
#[command(version)]
#[command(about = "Cluster emissions activity into tiers and emit recommendations")]
struct Cli {
    /// JSON array of events; reads stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// JSON pipeline config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the clustering seed.
    #[arg(long)]
    seed: Option<u64>,

    /// `ranked_by_total` or `raw_label`.
    #[arg(long, value_parser = parse_tier_labeling)]
    tier_labeling: Option<TierLabeling>,

    /// Indent the JSON output.
    #[arg(long)]
    pretty: bool,

    /// Emit groups, recommendations and clustering summary.
    #[arg(long)]
    explain: bool,

    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,

    /// Write rolling log files here instead of stderr.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn parse_tier_labeling(raw: &str) -> Result<TierLabeling, String> {
    TierLabeling::parse(raw).ok_or_else(|| format!("unknown tier labeling `{raw}`"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli) {
        eprintln!("ecotier: {err:#}");
        std::process::exit(1);
    }

    match run(&cli) {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(err) = writeln!(stdout, "{output}") {
                eprintln!("ecotier: failed to write output: {err}");
                std::process::exit(1);
            }
        }
        Err(err) => {
            error!("event=cli_run module=cli status=error");
            eprintln!("ecotier: {err:#}");
            std::process::exit(1);
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let initialized = match &cli.log_dir {
        Some(dir) => {
            let dir = absolute_dir(dir)?;
            init_logging(&cli.log_level, &dir.to_string_lossy())
        }
        None => init_stderr_logging(&cli.log_level),
    };
    initialized
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")
}

fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    Ok(cwd.join(dir))
}

/// Runs the pipeline and returns the rendered JSON document.
fn run(cli: &Cli) -> Result<String> {
    let config = resolve_config(cli)?;
    let events = read_events(cli.input.as_deref())?;
    info!(
        "event=cli_input module=cli status=ok events={} source={}",
        events.len(),
        cli.input
            .as_deref()
            .map_or_else(|| "stdin".to_string(), |p| p.display().to_string())
    );

    let service = RecommendationService::new(config).context("invalid pipeline config")?;
    let resolved = service.config();
    info!(
        "event=cli_config module=cli status=ok clusters={} seed={} restarts={} labeling={}",
        resolved.cluster_count,
        resolved.seed,
        resolved.restarts,
        resolved.tier_labeling.as_str()
    );
    let output = service
        .run(&events)
        .context("failed to generate recommendations")?;

    let rendered = if cli.explain {
        render(&output, cli.pretty)?
    } else {
        render(&output.recommendations, cli.pretty)?
    };
    Ok(rendered)
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config
        .apply_env_overrides()
        .context("invalid environment override")?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(labeling) = cli.tier_labeling {
        config.tier_labeling = labeling;
    }
    Ok(config)
}

fn read_events(input: Option<&Path>) -> Result<Vec<EmissionsEvent>> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input `{}`", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    decode_events(&raw)
}

fn decode_events(raw: &str) -> Result<Vec<EmissionsEvent>> {
    serde_json::from_str(raw).context("input is not a valid JSON array of emissions events")
}

fn render<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.context("failed to serialize output")
}
