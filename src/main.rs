use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::info;

use txcache::{app::App, config::Config, logging};

#[derive(Parser, Debug)]
#[command(name = "txcache")]
#[command(about = "Interactive session over a cached transactions backend")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/txcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Simulated backend latency in milliseconds
  #[arg(long)]
  latency_ms: Option<u64>,

  /// Disable the response cache
  #[arg(long)]
  no_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Command line overrides
  if let Some(latency_ms) = args.latency_ms {
    config.backend.latency_ms = latency_ms;
  }
  if args.no_cache {
    config.cache.enabled = false;
  }

  let _guard = logging::init(&config.log)?;
  info!(
    cache = config.cache.enabled,
    latency_ms = config.backend.latency_ms,
    "starting session"
  );

  let mut app = App::new(&config);
  let stdin = tokio::io::BufReader::new(tokio::io::stdin());
  app.run(stdin, &mut std::io::stdout()).await?;

  Ok(())
}
