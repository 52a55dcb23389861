#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web incident repository service for the disaster report
//! application.
//!
//! Serves `GET /api/incidents` (filterable list, newest first),
//! `POST /api/incidents` (validated create) and `GET /api/health`.
//! Incidents are held in an in-memory [`table::IncidentTable`] seeded with
//! sample incidents at startup.

mod handlers;
pub mod interactive;
pub mod table;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use chrono::Utc;
use disaster_report_server_models::ApiError;
use table::{IncidentTable, sample_incidents};

/// Origins allowed when `ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] =
    &["http://localhost:5173", "https://disaster-report.vercel.app"];

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// All stored incidents.
    pub incidents: IncidentTable,
}

/// Server settings, read from the environment by [`ServerConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to bind (`PORT`).
    pub port: u16,
    /// Browser origins allowed by CORS (`ALLOWED_ORIGINS`, comma-separated;
    /// `*` allows any origin).
    pub allowed_origins: Vec<String>,
    /// Whether to load the sample incidents (`DISASTER_REPORT_SEED`).
    pub seed: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 3001,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            seed: true,
        }
    }
}

impl ServerConfig {
    /// Builds a config from environment variables, using defaults for
    /// anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let allowed_origins = std::env::var("ALLOWED_ORIGINS").map_or(
            defaults.allowed_origins,
            |origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(ToString::to_string)
                    .collect()
            },
        );
        let seed = std::env::var("DISASTER_REPORT_SEED")
            .map_or(defaults.seed, |v| !matches!(v.as_str(), "0" | "false" | "no"));

        Self {
            bind_addr,
            port,
            allowed_origins,
            seed,
        }
    }

    fn cors(&self) -> Cors {
        if self.allowed_origins.iter().any(|o| o == "*") {
            return Cors::permissive();
        }

        self.allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(["GET", "POST"])
            .allow_any_header()
    }
}

/// Registers the `/api` routes.
///
/// Malformed JSON bodies are answered with `400` and an `{"error": ...}`
/// body like every other failure.
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ApiError::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/incidents", web::get().to(handlers::list_incidents))
            .route("/incidents", web::post().to(handlers::create_incident)),
    );
}

/// Starts the incident repository server.
///
/// This is a regular async function; the caller provides the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let incidents = if config.seed {
        let samples = sample_incidents(Utc::now());
        log::info!("Seeded {} sample incidents", samples.len());
        IncidentTable::with_incidents(samples)
    } else {
        IncidentTable::default()
    };

    let state = web::Data::new(AppState { incidents });

    log::info!(
        "Starting server on {}:{} (allowed origins: {:?})",
        config.bind_addr,
        config.port,
        config.allowed_origins
    );

    let bind = (config.bind_addr.clone(), config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(config.cors())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(bind)?
    .run()
    .await?;

    log::info!("Server stopped");
    Ok(())
}
