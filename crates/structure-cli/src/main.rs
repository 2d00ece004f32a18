//! structure-cli: run the market structure engine over candle bundles on disk.
//!
//! Each bundle is a JSON document with a pair, a timeframe and candle arrays
//! (`primary`, plus optional `daily`, `weekly`, `monthly` and `options`).
//! Bundles are processed in parallel; one JSON response per bundle is printed
//! to stdout in argument order.
//!
//! Usage:
//!   cargo run -p structure-cli -- eurusd_h1.json gbpjpy_h4.json
//!   cargo run -p structure-cli -- --pair EURUSD --timeframe H4 bundle.json
//!   cargo run -p structure-cli -- --config calibration.json --strict --pretty *.json

use analysis_core::Timeframe;
use anyhow::{anyhow, Context};
use market_structure::StructureConfig;
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use structure_engine::{CandleSeries, StructureEngine, StructureOptions, StructureResponse};

const DEFAULT_TIMEFRAME: Timeframe = Timeframe::H1;

#[derive(Debug, Deserialize)]
struct Bundle {
    #[serde(default)]
    pair: Option<String>,
    #[serde(default)]
    timeframe: Option<String>,
    #[serde(flatten)]
    series: CandleSeries,
    #[serde(default)]
    options: StructureOptions,
}

struct Args {
    files: Vec<PathBuf>,
    pair: Option<String>,
    timeframe: Option<Timeframe>,
    config: Option<PathBuf>,
    strict: bool,
    pretty: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let value_of = |flag: &str| {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .cloned()
    };

    let timeframe = value_of("--timeframe")
        .map(|tf| tf.parse::<Timeframe>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let mut files = Vec::new();
    let mut skip_next = false;
    for a in &args {
        if skip_next {
            skip_next = false;
        } else if matches!(a.as_str(), "--pair" | "--timeframe" | "--config") {
            skip_next = true;
        } else if !a.starts_with("--") {
            files.push(PathBuf::from(a));
        }
    }

    Ok(Args {
        files,
        pair: value_of("--pair").or_else(|| std::env::var("STRUCTURE_PAIR").ok()),
        timeframe,
        config: value_of("--config")
            .or_else(|| std::env::var("STRUCTURE_CONFIG").ok())
            .map(PathBuf::from),
        strict: args.iter().any(|a| a == "--strict"),
        pretty: args.iter().any(|a| a == "--pretty"),
    })
}

fn load_config(path: &Path) -> anyhow::Result<StructureConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    StructureConfig::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn run_bundle(engine: &StructureEngine, args: &Args, path: &Path) -> anyhow::Result<StructureResponse> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let bundle: Bundle =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let pair = args
        .pair
        .clone()
        .or(bundle.pair)
        .ok_or_else(|| anyhow!("{}: no pair given (bundle, --pair or STRUCTURE_PAIR)", path.display()))?;

    let timeframe = match (args.timeframe, bundle.timeframe) {
        (Some(tf), _) => tf,
        (None, Some(tf)) => tf.parse::<Timeframe>().map_err(|e| anyhow!("{}: {e}", path.display()))?,
        (None, None) => DEFAULT_TIMEFRAME,
    };

    if let Err(e) = engine.check_series(timeframe, &bundle.series.primary) {
        if args.strict {
            return Err(anyhow!("{}: {e}", path.display()));
        }
        tracing::warn!(file = %path.display(), error = %e, "primary series is incomplete");
    }

    Ok(engine.compute_structure(&pair, timeframe, &bundle.series, &bundle.options))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "structure_cli=info,structure_engine=info,market_structure=warn".into()),
        )
        .init();

    let args = parse_args()?;
    if args.files.is_empty() {
        eprintln!("Usage:");
        eprintln!("  structure-cli [options] <bundle.json>...");
        eprintln!("");
        eprintln!("Options:");
        eprintln!("  --pair SYMBOL      Pair for every bundle (env: STRUCTURE_PAIR)");
        eprintln!("  --timeframe TF     Primary timeframe (default: {})", DEFAULT_TIMEFRAME);
        eprintln!("  --config PATH      StructureConfig JSON (env: STRUCTURE_CONFIG)");
        eprintln!("  --strict           Fail on malformed or too-short primary series");
        eprintln!("  --pretty           Pretty-print responses");
        std::process::exit(1);
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => StructureConfig::default(),
    };
    let engine = StructureEngine::new().with_config(config);

    tracing::info!("Processing {} bundle(s)", args.files.len());
    let results: Vec<anyhow::Result<StructureResponse>> = args
        .files
        .par_iter()
        .map(|path| run_bundle(&engine, &args, path))
        .collect();

    let mut failed = 0usize;
    for (path, result) in args.files.iter().zip(results) {
        match result {
            Ok(response) => {
                let json = if args.pretty {
                    serde_json::to_string_pretty(&response)?
                } else {
                    serde_json::to_string(&response)?
                };
                println!("{json}");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(file = %path.display(), "{e:#}");
            }
        }
    }

    tracing::info!("Done: {} ok, {} failed", args.files.len() - failed, failed);
    if failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}
