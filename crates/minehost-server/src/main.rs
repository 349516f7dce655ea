use clap::Parser;
use minehost_core::HostConfig;
use minehost_server::App;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tiny_http::Server;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(
    name = "minehost-server",
    version,
    about = "HTTP API for Minecraft server containers"
)]
struct Cli {
    /// Port to listen on.
    #[arg(long, env = "MINEHOST_PORT", default_value_t = 8080)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// TOML configuration file.
    #[arg(long, env = "MINEHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for server records and logs (overrides the config file).
    #[arg(long, env = "MINEHOST_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Container engine base URL (overrides the config file).
    #[arg(long, env = "DOCKER_HOST_URL")]
    engine_url: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match HostConfig::load_or_default(cli.config.as_deref()) {
        Ok(c) => c
            .with_store_dir(cli.data_dir)
            .with_engine_url(cli.engine_url.as_deref()),
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let app = match App::from_config(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if app.manager().is_none() {
        warn!("no data directory configured; store-backed routes will answer 500");
    }

    let addr = format!("{}:{}", cli.bind, cli.port);
    let server = match Server::http(&addr) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let srv = Arc::clone(&server);
    if let Err(e) = ctrlc::set_handler(move || {
        info!("shutdown requested");
        srv.unblock();
    }) {
        warn!("failed to install signal handler: {e}");
    }

    info!("starting minehost-server on {addr}");
    info!("container engine: {}", config.engine.base_url());
    minehost_server::serve(&Arc::new(app), &server);
    ExitCode::SUCCESS
}
