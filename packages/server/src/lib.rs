#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the land-surveying pricing dashboard.
//!
//! Loads the municipality pricing dataset once at startup and serves the
//! server-rendered dashboard at `/dashboard`, a JSON API under `/api`, and
//! the logo and other static files under `/assets`.

mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use pricing_map_dataset::{Dataset, DatasetError};
use thiserror::Error;

/// Default location of the pricing dataset.
pub const DEFAULT_DATASET_PATH: &str = "dados/precificacao_al_ii.geojson";
/// Default directory served under `/assets`.
pub const DEFAULT_ASSETS_DIR: &str = "dados";

/// Errors that prevent the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Dataset loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub dataset_path: PathBuf,
    pub assets_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `PRICING_DATASET_PATH` and
    /// `PRICING_ASSETS_DIR`, falling back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dataset_path: std::env::var_os("PRICING_DATASET_PATH")
                .map_or(defaults.dataset_path, PathBuf::from),
            assets_dir: std::env::var_os("PRICING_ASSETS_DIR")
                .map_or(defaults.assets_dir, PathBuf::from),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// The full dataset, read once at startup and never mutated.
    pub dataset: Arc<Dataset>,
}

/// Reads and transforms the dataset on the blocking thread pool.
///
/// # Errors
///
/// Returns [`ServerError`] if the file cannot be loaded.
pub async fn load_dataset(path: PathBuf) -> Result<Dataset, ServerError> {
    Ok(tokio::task::spawn_blocking(move || Dataset::load(&path)).await??)
}

/// Registers the dashboard and API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        log::warn!("Rejected query string: {message}");
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        )
        .into()
    }))
    .route("/", web::get().to(handlers::index))
    .route("/dashboard", web::get().to(handlers::dashboard))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/criteria", web::get().to(handlers::criteria))
            .route("/states", web::get().to(handlers::states))
            .route("/view", web::get().to(handlers::view))
            .route("/stats", web::get().to(handlers::criterion_stats))
            .route("/general", web::get().to(handlers::general))
            .route("/table", web::get().to(handlers::table)),
    );
}

/// Starts the pricing dashboard server.
///
/// Loads the dataset before binding; a missing or malformed file aborts
/// startup and no partial dataset is ever served. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded, or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let dataset = load_dataset(config.dataset_path.clone())
        .await
        .map_err(|e| {
            log::error!(
                "Failed to load dataset {}: {e}",
                config.dataset_path.display()
            );
            std::io::Error::other(e)
        })?;

    let state = web::Data::new(AppState {
        dataset: Arc::new(dataset),
    });
    let assets_dir = config.assets_dir.clone();

    log::info!(
        "Starting server on {}:{} (assets from {})",
        config.bind_addr,
        config.port,
        assets_dir.display()
    );

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            .service(Files::new("/assets", assets_dir.clone()))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_points_at_bundled_data() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.dataset_path, PathBuf::from("dados/precificacao_al_ii.geojson"));
        assert_eq!(config.assets_dir, PathBuf::from("dados"));
    }

    #[actix_rt::test]
    async fn missing_dataset_fails_to_load() {
        let err = load_dataset(PathBuf::from("does/not/exist.geojson"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Dataset(DatasetError::Io(_))));
    }
}
