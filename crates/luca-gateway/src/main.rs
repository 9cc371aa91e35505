//! LUCA Gateway - HTTP analysis server

use clap::Parser;
use luca_consciousness::EngineConfig;
use luca_core::{BindMode, GatewayConfig};
use luca_gateway::{start_gateway, ExtendedConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "luca-gateway", about = "LUCA message-analysis gateway", version)]
struct Cli {
    #[arg(short, long, default_value = "8369")]
    port: u16,
    /// loopback or lan
    #[arg(short, long, default_value = "loopback")]
    bind: String,
    /// Engine config (TOML). Falls back to $LUCA_CONFIG, then defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Journal file for durable memory. Falls back to $LUCA_JOURNAL.
    #[arg(short, long)]
    journal: Option<PathBuf>,
    /// Also write daily-rolling logs into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Print the effective engine config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (file_layer, _guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "luca-gateway.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luca=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    let config_path = cli
        .config
        .or_else(|| std::env::var("LUCA_CONFIG").ok().map(PathBuf::from));
    let engine = match &config_path {
        Some(path) => EngineConfig::load(path),
        None => EngineConfig::default(),
    };

    if cli.dump_config {
        print!("{}", engine.to_toml());
        return Ok(());
    }

    let journal = cli
        .journal
        .or_else(|| std::env::var("LUCA_JOURNAL").ok().map(PathBuf::from));

    let config = ExtendedConfig {
        gateway: GatewayConfig {
            port: cli.port,
            bind: BindMode::parse(&cli.bind),
        },
        engine,
        journal,
    };
    start_gateway(config).await
}
