//! Price estimation HTTP server
//!
//! Serves predictions from a model artifact and demographics table loaded
//! once at startup. Routes:
//! - `GET /health`
//! - `POST /predict`
//! - `POST /predict/simple`
//! - `GET /features`

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::training::artifact::MODEL_FILE;

const DEMOGRAPHICS_FILE: &str = "zipcode_demographics.csv";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_dir: PathBuf,
    pub demographics_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5005),
            model_dir: std::env::var("MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::resolve_model_dir()),
            demographics_path: std::env::var("DEMOGRAPHICS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::resolve_demographics_path()),
        }
    }
}

impl ServerConfig {
    /// `./model` when it holds a trained model (container layout), otherwise
    /// `../model` (running from a source subdirectory).
    fn resolve_model_dir() -> PathBuf {
        first_existing(&["./model", "../model"], MODEL_FILE)
    }

    fn resolve_demographics_path() -> PathBuf {
        first_existing(&["./data", "../data"], DEMOGRAPHICS_FILE).join(DEMOGRAPHICS_FILE)
    }
}

fn first_existing(candidates: &[&str], file: &str) -> PathBuf {
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|dir| dir.join(file).exists())
        .unwrap_or_else(|| PathBuf::from(candidates[0]))
}

/// Load artifacts and serve until ctrl+c. Any load failure aborts before the
/// listener is bound.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();
    info!(
        model_dir = %config.model_dir.display(),
        demographics = %config.demographics_path.display(),
        "Loading model artifacts"
    );

    let state = Arc::new(AppState::load(config.clone())?);
    info!(
        features = state.service.model_features().len(),
        zipcodes = state.service.preparer().demographics().len(),
        "Model loaded"
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        address = %addr,
        pid = std::process::id(),
        started_at = %start_time.to_rfc3339(),
        "Server listening and ready to accept connections"
    );
    info!(url = %format!("http://{}/health", addr), "Health endpoint available");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Whether `dir` looks like a trained artifact directory
pub fn has_model(dir: impl AsRef<Path>) -> bool {
    dir.as_ref().join(MODEL_FILE).exists()
}
