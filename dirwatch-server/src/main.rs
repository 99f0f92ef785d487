//! # dirwatch server
//!
//! Watches a directory for files containing a magic word and keeps a
//! catalog of them, combining filesystem events with periodic full scans.
//!
//! ```text
//! dirwatch-server                 # serve the HTTP control surface
//! dirwatch-server --in-memory     # same, without PostgreSQL
//! dirwatch-server db migrate      # apply catalog migrations and exit
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use dirwatch_config::{Config, ConfigLoad, ConfigLoader};
use dirwatch_core::PostgresCatalog;
use dirwatch_server::{
    infra::startup::{build_state, connect_catalog, run_startup},
    routes,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "dirwatch-server")]
#[command(about = "Catalog files containing a magic word, kept current by events and scans")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(ClapArgs, Debug, Clone)]
struct ServeArgs {
    /// Server port (overrides config)
    #[arg(short, long, env = "SERVER_PORT")]
    port: Option<u16>,

    /// Server host (overrides config)
    #[arg(long, env = "SERVER_HOST")]
    host: Option<String>,

    /// Path to a dirwatch.toml configuration file
    #[arg(long, env = "DIRWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Path to a .env file loaded before the environment is read
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Keep the catalog in memory even when DATABASE_URL is set
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(subcommand)]
    Db(DbCommand),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_runtime_config(&cli.serve)?;

    if let Some(Command::Db(DbCommand::Migrate)) = cli.command {
        return run_db_migrate(&config).await;
    }

    run_server(config, cli.serve.in_memory).await
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_runtime_config(args: &ServeArgs) -> anyhow::Result<Config> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_config_path(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad {
        mut config,
        warnings,
    } = loader.load().context("failed to load configuration")?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    if config.metadata.env_file_loaded {
        info!("loaded environment from .env file");
    }
    if let Some(path) = &config.metadata.config_path {
        info!(path = %path.display(), "using configuration file");
    }
    for warning in &warnings.items {
        match &warning.hint {
            Some(hint) => {
                warn!(message = %warning.message, hint = %hint, "configuration warning")
            }
            None => warn!(message = %warning.message, "configuration warning"),
        }
    }

    Ok(config)
}

async fn run_db_migrate(config: &Config) -> anyhow::Result<()> {
    let url = config
        .database
        .primary_url
        .as_deref()
        .context("DATABASE_URL must be set to run migrations")?;
    let catalog = PostgresCatalog::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to PostgreSQL")?;
    catalog
        .initialize_schema()
        .await
        .context("failed to apply database migrations")?;
    info!("database migrations applied");
    Ok(())
}

async fn run_server(config: Config, in_memory: bool) -> anyhow::Result<()> {
    let (catalog, backend) = connect_catalog(&config, in_memory).await?;
    let state = build_state(&config, catalog, backend);
    run_startup(&config, &state).await?;

    let coordinator = state.coordinator().clone();
    let app = routes::create_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        address = %addr,
        backend = backend.as_str(),
        root = %config.watch.directory.display(),
        "dirwatch server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down watch task");
    coordinator
        .stop()
        .await
        .context("watch task did not stop cleanly")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
