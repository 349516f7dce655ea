mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_STORE_ERROR};
use minehost_core::{Action, HostConfig, Manager};
use minehost_store::{Edition, NewServer};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "minehost",
    version,
    about = "Manage Minecraft server containers and their records"
)]
struct Cli {
    /// Data directory holding server records and logs.
    #[arg(long, env = "MINEHOST_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Container engine base URL.
    #[arg(long, env = "DOCKER_HOST_URL", global = true)]
    engine_url: Option<String>,

    /// TOML configuration file (flags and environment override it).
    #[arg(long, env = "MINEHOST_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a new server record.
    Register {
        name: String,
        /// Address players connect to.
        #[arg(long)]
        ip: String,
        #[arg(long, default_value = "java")]
        edition: Edition,
        #[arg(long = "game-version", default_value = "1.20.1")]
        game_version: String,
        #[arg(long, default_value_t = 20)]
        max_players: u32,
        /// Tenant that owns the record.
        #[arg(long, default_value = "demo-user")]
        owner: String,
    },
    /// List a tenant's servers, newest first.
    List {
        #[arg(long, default_value = "demo-user")]
        owner: String,
    },
    /// Create and start the server's container.
    Create { server_id: String },
    /// Start the server's container.
    Start { server_id: String },
    /// Stop the server's container.
    Stop { server_id: String },
    /// Restart the server's container.
    Restart { server_id: String },
    /// Show live status, falling back to the last recorded one.
    Status { server_id: String },
    /// Show the server's log, newest first.
    Logs {
        server_id: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

fn build_manager(cli: &Cli) -> Result<Manager, String> {
    let config = HostConfig::load_or_default(cli.config.as_deref())
        .map_err(|e| e.to_string())?
        .with_store_dir(cli.data_dir.clone())
        .with_engine_url(cli.engine_url.as_deref());
    debug!("config: {config:?}");

    Manager::from_config(&config)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| {
            "store error: no data directory configured (use --data-dir or MINEHOST_DATA_DIR)"
                .to_owned()
        })
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MINEHOST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = build_manager(&cli).and_then(|manager| {
        let json = cli.json;
        match cli.command {
            Commands::Register {
                name,
                ip,
                edition,
                game_version,
                max_players,
                owner,
            } => commands::register::run(
                &manager,
                &NewServer {
                    owner,
                    name,
                    ip,
                    edition,
                    version: game_version,
                    max_players,
                },
                json,
            ),
            Commands::List { owner } => commands::list::run(&manager, &owner, json),
            Commands::Create { server_id } => {
                commands::action::run(&manager, &server_id, Action::Create, json)
            }
            Commands::Start { server_id } => {
                commands::action::run(&manager, &server_id, Action::Start, json)
            }
            Commands::Stop { server_id } => {
                commands::action::run(&manager, &server_id, Action::Stop, json)
            }
            Commands::Restart { server_id } => {
                commands::action::run(&manager, &server_id, Action::Restart, json)
            }
            Commands::Status { server_id } => commands::status::run(&manager, &server_id, json),
            Commands::Logs { server_id, limit } => {
                commands::logs::run(&manager, &server_id, limit, json)
            }
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
