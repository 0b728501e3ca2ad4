use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stream_resolver::{
    config::{Config, defaults::DEFAULT_CONFIG_FILE},
    upstream::{HttpUpstreamApi, UpstreamClient, UpstreamTargets},
    web::WebServer,
};

#[derive(Parser)]
#[command(name = "stream-resolver")]
#[command(version)]
#[command(about = "Resolves video references into manifest URLs, DRM keys and HLS URLs")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("stream_resolver={},tower_http=trace", cli.log_level)
    } else {
        format!("stream_resolver={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Stream Resolver v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }
    config.validate()?;

    let targets = Arc::new(UpstreamTargets::from_config(
        &config.upstreams,
        &config.credentials,
    )?);
    for (name, target) in config.upstreams.iter() {
        info!("Upstream {}: {}{}", name, target.base_url, target.path);
    }
    if config.health.probe_reference.is_none() {
        info!("No health probe reference configured, /health will report not_configured");
    }

    let api = Arc::new(HttpUpstreamApi::new(UpstreamClient::new()?, targets));
    let server = WebServer::new(config, api)?;
    info!("Web server starting on {}:{}", server.host(), server.port());
    server.serve().await?;

    info!("Stream Resolver stopped");
    Ok(())
}
