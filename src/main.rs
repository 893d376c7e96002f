use anyhow::Context;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pns::config::{CliOverrides, Config, DEFAULT_CONFIG_PATH};
use pns::events::Subscribers;
use pns::proxy;

#[derive(Parser)]
#[command(name = "pns")]
#[command(about = "Local DNS proxy with blocklist, overrides and cache", long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Local port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level, used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = Config::load(
        &args.config,
        CliOverrides {
            dns_port: args.port,
            bind_address: args.bind,
        },
    )
    .with_context(|| format!("loading {}", args.config.display()))?;
    config.validate().context("invalid configuration")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let port = config.dns_port;
    let subscribers = Arc::new(Subscribers::new());
    match rt.block_on(proxy::run(config, subscribers)) {
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(anyhow::anyhow!(
            "permission denied binding port {}: run with elevated privileges or use a port above 1024",
            port
        )),
        result => result.context("DNS proxy stopped"),
    }
}
