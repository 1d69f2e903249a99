use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use terane::{build_pipeline, PluginRegistry, Settings};

#[derive(Parser)]
#[command(name = "terane-run")]
#[command(about = "Run events through a pipeline of sources, filters and sinks")]
#[command(version)]
struct Args {
    /// Pipeline spec, e.g. `stdin_source | debug_sink` (words are joined with spaces)
    #[arg(value_name = "PIPELINE")]
    pipeline: Vec<String>,

    /// Configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug mode - log each stage and dropped event
    #[arg(short = 'd', long)]
    debug: bool,

    /// Log filter directive, e.g. `terane=trace`
    #[arg(long, value_name = "DIRECTIVE")]
    log_filter: Option<String>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("terane-run: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let section = settings.section("run");

    let debug = args.debug || section.get_bool("debug", false)?;
    init_logging(
        args.log_filter.as_deref().or(section.get_string("log filter")),
        debug,
    )?;

    let spec = if !args.pipeline.is_empty() {
        args.pipeline.join(" ")
    } else {
        section
            .get_string("pipeline")
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no pipeline was specified"))?
    };

    let registry = PluginRegistry::builtin();
    let mut pipeline = build_pipeline(&spec, &registry)?;
    let stats = pipeline.run()?;
    tracing::debug!(elapsed = ?stats.processing_time, "pipeline finished");
    Ok(())
}

/// An explicit directive wins over RUST_LOG, which wins over the debug switch
fn init_logging(directive: Option<&str>, debug: bool) -> anyhow::Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{}'", directive))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" })),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}
