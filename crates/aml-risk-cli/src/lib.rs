//! amlrisk - command-line front end for the AML risk engine
//!
//! Reads an already parsed evaluation request (JSON), resolves the risk
//! configuration from the configuration service, a local file, or the
//! built-in defaults, and prints the verdict.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aml_risk_config::{
    CachedConfigSource, ConfigFetcher, FileConfigFetcher, HttpConfigFetcher, DEFAULT_CACHE_TTL,
    DEFAULT_REQUEST_TIMEOUT,
};
use aml_risk_core::{
    ConfigProvider, EvaluationRequest, RiskConfig, RiskEngine, StaticConfigProvider,
};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;
mod settings;

pub use output::OutputFormat;
pub use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "amlrisk")]
#[command(
    about = "Evaluate gaming account movements against the AML risk engine",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, env = "AMLRISK_SETTINGS")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate one account's movement history
    Evaluate(EvaluateArgs),

    /// Print the built-in fallback configuration
    Defaults,
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    /// Evaluation request JSON, `-` for stdin
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration service endpoint
    #[arg(long, env = "AMLRISK_CONFIG_URL")]
    config_url: Option<String>,

    /// Configuration payload JSON on disk; wins over any URL
    #[arg(long)]
    config_file: Option<PathBuf>,

    /// Snapshot time-to-live in seconds
    #[arg(long)]
    cache_ttl_secs: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,
}

/// Run using the current process arguments.
pub async fn run() -> anyhow::Result<()> {
    run_with_args(std::env::args_os()).await
}

/// Run using the provided argument iterator.
pub async fn run_with_args<I, T>(args: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    // Logs go to stderr so stdout stays machine readable.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let settings = Settings::load(cli.settings.as_deref())?;

    match cli.command {
        Commands::Evaluate(args) => evaluate(args, &settings).await,
        Commands::Defaults => {
            let payload = RiskConfig::default().to_payload();
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
    }
}

async fn evaluate(args: EvaluateArgs, settings: &Settings) -> anyhow::Result<()> {
    let request = read_request(&args.input)?;
    debug!(movements = request.movements.len(), "request loaded");

    let ttl = args
        .cache_ttl_secs
        .map(Duration::from_secs)
        .or_else(|| settings.cache_ttl())
        .unwrap_or(DEFAULT_CACHE_TTL);

    let url = args
        .config_url
        .as_deref()
        .or(settings.config_url.as_deref());
    let provider: Arc<dyn ConfigProvider> = if let Some(path) = &args.config_file {
        warm(CachedConfigSource::new(FileConfigFetcher::new(path)).with_ttl(ttl)).await
    } else if let Some(url) = url {
        let timeout = settings.request_timeout().unwrap_or(DEFAULT_REQUEST_TIMEOUT);
        let fetcher = HttpConfigFetcher::new(url, timeout)?;
        warm(CachedConfigSource::new(fetcher).with_ttl(ttl)).await
    } else {
        debug!("no configuration source given, using built-in defaults");
        Arc::new(StaticConfigProvider::default())
    };

    let engine = RiskEngine::new(provider);
    let result = engine.evaluate(&request);
    println!("{}", output::render(&result, args.output)?);
    Ok(())
}

/// Load the first snapshot before the engine reads it.
async fn warm<F>(source: CachedConfigSource<F>) -> Arc<dyn ConfigProvider>
where
    F: ConfigFetcher + 'static,
{
    source.fetch().await;
    if source.is_fallback() {
        warn!("evaluating with the built-in fallback configuration");
    }
    Arc::new(source)
}

fn read_request(input: &Path) -> anyhow::Result<EvaluationRequest> {
    let raw = if input == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("reading request from stdin")?
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("reading request {}", input.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("decoding request {}", input.display()))
}
