//! Kirimkan: send WhatsApp messages through a local HTTP endpoint.
//!
//! Run with: cargo run -p kirimkan -- --config kirimkan.conf --loopback
//!
//! Then `POST {"no": "...", "pesan": "..."}` to http://127.0.0.1:6969/kirim-pesan.

mod banner;
mod network;

use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::Parser;
use kirimkan_core::{
    Config,
    config::DEFAULT_CONFIG_FILE,
    traits::DestinationRecorder,
};
use kirimkan_session::{
    LogPresenter, PairingPresenter, SessionManager, TerminalQrPresenter,
    identity::SqliteIdentityStore,
};
use kirimkan_store::{DestinationRegistry, SqlConnector, StoreConnectionManager};
use kirimkan_transport::{DispatchState, router};
use secrecy::ExposeSecret;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "kirimkan", version, about = "Local HTTP gateway for sending WhatsApp messages")]
struct Cli {
    /// Configuration file (KEY=value lines).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log pairing codes as text instead of drawing QR codes.
    #[arg(long, default_value_t = false)]
    plain_pairing: bool,

    /// Run against the in-process loopback network. Messages are not delivered.
    #[arg(long, default_value_t = false)]
    loopback: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("Kirimkan starting");

    let config = Config::load(&cli.config)?;
    log_config(&config);
    let backend = network::select(cli.loopback, &config.session_file)?;

    let recorder = match &config.recording {
        Some(db) => {
            let connector = SqlConnector::new(db.url().expose_secret().as_str(), db.max_connections)?;
            let registry = DestinationRegistry::new(Arc::new(StoreConnectionManager::new(connector)));
            registry
                .prepare()
                .await
                .context("failed to create table 'whatsapp'")?;
            Some(Arc::new(registry) as Arc<dyn DestinationRecorder>)
        }
        None => None,
    };

    let presenter: Arc<dyn PairingPresenter> = if cli.plain_pairing {
        Arc::new(LogPresenter)
    } else {
        Arc::new(TerminalQrPresenter)
    };
    let sessions = Arc::new(SessionManager::new(
        Arc::new(SqliteIdentityStore::open(&backend.identity_file)),
        backend.network,
        presenter,
    ));
    sessions
        .establish()
        .await
        .context("failed to connect to WhatsApp")?;

    let mut state = DispatchState::new(sessions.clone());
    if let Some(recorder) = recorder {
        state = state.with_recorder(recorder);
    }
    let app = router(state, &config.web_dir);

    let listener = match tokio::net::TcpListener::bind(config.listen_addr()).await {
        Ok(listener) => listener,
        Err(e) => {
            sessions.shutdown().await;
            return Err(e).with_context(|| format!("failed to bind {}", config.listen_addr()));
        }
    };

    banner::print();
    tracing::info!("API server listening on http://{}", config.listen_addr());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sessions.shutdown().await;
    served.context("server error")
}

fn log_config(config: &Config) {
    tracing::info!("Loaded configuration");
    tracing::info!("API_HOST : {}", config.api_host);
    tracing::info!("API_PORT : {}", config.api_port);
    tracing::info!("WA_SESSION_FILE : {}", config.session_file.display());
    tracing::info!("WEB_DIR : {}", config.web_dir.display());

    if let Some(db) = &config.recording {
        tracing::info!("DB_SAVE_NUMBER : yes");
        tracing::info!("DB_HOST : {}", db.host);
        tracing::info!("DB_USERNAME : {}", db.username);
        tracing::info!("DB_DATABASE : {}", db.database);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutting down");
}
