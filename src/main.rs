use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use email_mentor::{
    clients::GeminiClient, config::Config, config::RuntimeConfig, controller::Controller, http,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "email-mentor", version, about = "Email marketing mentor backend")]
struct Args {
    /// Path to the TOML config file (overrides EMAIL_MENTOR_CONFIG)
    #[arg(long)]
    config: Option<String>,
    /// Listen address (overrides MENTOR_HTTP_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging first so config warnings are visible
    email_mentor::load_env();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(RuntimeConfig::load_from_env().log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    let mut config = Config::load_from(args.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(bind) = args.bind {
        config.server.http_bind = bind;
    }

    info!(
        model = %config.model.model,
        timeout_ms = config.model.timeout_ms,
        "Starting email mentor"
    );

    let model = Arc::new(GeminiClient::from_config(&config)?);
    let controller = Arc::new(Controller::new(model));

    http::start_http_server(&config, controller).await?;
    Ok(())
}
