//! CLI command implementations
//!
//! Boot sequence for `serve`:
//! 1. Load config (file, then environment)
//! 2. Open the pool and ping the database; abort if unreachable
//! 3. Serve until SIGTERM or Ctrl-C
//! 4. Drain the pool

use std::path::Path;
use std::sync::Arc;

use crate::config::RowgateConfig;
use crate::http_server::HttpServer;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::rest_api::DataHandler;
use crate::store::{DataStore, PgStore, StoreError};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::write_json;

/// Parse arguments and run the selected command on a fresh runtime
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::io_error(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(run_command(cli.command))
}

/// Dispatch a parsed command
pub async fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { config } => serve(config.as_deref()).await,
        Command::Check { config } => check(config.as_deref()).await,
    }
}

fn load_config(path: Option<&Path>) -> CliResult<RowgateConfig> {
    let config = RowgateConfig::load(path)?;

    let port = config.server.port.to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("db_host", config.database.host.as_str()),
            ("db_name", config.database.name.as_str()),
            ("port", port.as_str()),
            ("schema", config.database.schema.as_str()),
        ],
    );
    Ok(config)
}

/// Open the pool and prove the database answers
async fn connect(config: &RowgateConfig) -> CliResult<PgStore> {
    let connected = async {
        let store = PgStore::connect(&config.database).await?;
        store.ping().await?;
        Ok::<_, StoreError>(store)
    }
    .await;

    match connected {
        Ok(store) => {
            log_event(Event::DatabaseConnected);
            Ok(store)
        }
        Err(err) => {
            let reason = err.to_string();
            log_event_with_fields(Event::DatabaseUnreachable, &[("reason", reason.as_str())]);
            Err(err.into())
        }
    }
}

/// `rowgate serve`
pub async fn serve(config_path: Option<&Path>) -> CliResult<()> {
    log_event(Event::BootStart);

    let config = load_config(config_path)?;
    let store = Arc::new(connect(&config).await?);
    let handler = Arc::new(DataHandler::new(
        store.clone(),
        config.database.schema.clone(),
        &config.query,
    ));

    let server = HttpServer::new(config.server.clone(), handler);
    let served = server.start(shutdown_signal()).await;

    store.close().await;
    log_event(Event::ShutdownComplete);

    served.map_err(CliError::from)
}

/// `rowgate check`
pub async fn check(config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let store = Arc::new(connect(&config).await?);
    let handler = DataHandler::new(store.clone(), config.database.schema.clone(), &config.query);

    let tables = handler.list_tables().await;
    store.close().await;

    let tables = tables.map_err(|e| CliError::boot_failed(e.to_string()))?;
    write_json(&tables)
}

/// Resolves on Ctrl-C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log_event(Event::ShutdownStart);
}
