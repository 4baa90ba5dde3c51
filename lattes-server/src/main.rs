//! lattes-server - Lattes curriculum processor
//!
//! Serves the upload/search HTTP API and UI, and offers two maintenance
//! commands: bulk import of a folder of XML files and database reset.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lattes_common::config::{load_config_file, ConfigOverrides, ServerConfig};
use lattes_common::db::{init_database, reset_schema};
use lattes_server::ingest::import_directory;
use lattes_server::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for lattes-server
#[derive(Parser, Debug)]
#[command(name = "lattes-server")]
#[command(about = "Ingests Lattes curriculum XML files and serves publication search")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Folder holding lattes.db (also LATTES_ROOT_FOLDER)
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, global = true, env = "LATTES_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true, env = "LATTES_PORT")]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Ingest every .xml file under a folder and print the summary as JSON
    Import {
        /// Folder to scan recursively
        dir: PathBuf,
    },
    /// Drop and recreate the researcher and publication tables
    Reset {
        /// Confirm deletion of all stored data
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lattes_server=info,lattes_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting lattes-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml = load_config_file();
    let config = ServerConfig::resolve(
        ConfigOverrides {
            root_folder: args.root_folder,
            host: args.host,
            port: args.port,
        },
        toml.as_ref(),
    );

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::Import { dir } => {
            let summary = import_directory(&pool, &dir)
                .await
                .with_context(|| format!("Import of {} failed", dir.display()))?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                anyhow::bail!("Refusing to reset {} without --yes", db_path.display());
            }
            reset_schema(&pool).await.context("Database reset failed")?;
            info!("All researchers and publications deleted");
            Ok(())
        }
    }
}

async fn serve(config: ServerConfig, pool: sqlx::SqlitePool) -> Result<()> {
    let state = AppState::new(pool).with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("lattes-server listening on http://{}", addr);
    info!("UI: http://{}/ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
