//! # analyzer: Dataset Analyzer API
//!
//! `analyzer` is a small HTTP service that accepts file uploads from a web frontend and returns a
//! shallow structural summary of each one, together with a canned acknowledgement of an optional
//! free-text message.
//!
//! ## Overview
//!
//! A client posts a `multipart/form-data` request to `/analyze` carrying an optional `message`
//! field and any number of `files` parts. Every file is classified by its extension, falling back
//! to image signature sniffing, and then summarised:
//!
//! - **Tabular files** (`csv`, `xlsx`, `xls`) report row and column counts, the column names and
//!   the first three rows.
//! - **JSON files** report whether the top level is a list or an object, how many elements it
//!   holds and a short pretty-printed preview.
//! - **Documents and images** are recognised but not parsed; their counts are zero.
//!
//! A file that cannot be read is reported with `file_type: error` and does not fail the request.
//! The response also carries a plain-text digest listing every processed file in upload order.
//!
//! ## Architecture
//!
//! The service is a single [Axum](https://github.com/tokio-rs/axum) router with no shared state.
//! Uploads are buffered in memory for the duration of the request and nothing is persisted.
//!
//! - [`api`]: route handlers and response envelopes
//! - [`classify`]: file classification and metadata extraction
//! - [`config`]: YAML + environment configuration
//! - [`errors`]: request-level error type and its HTTP rendering
//! - [`telemetry`]: tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use analyzer::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = analyzer::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     analyzer::telemetry::init_telemetry()?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod classify;
pub mod config;
pub mod errors;
mod openapi;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

use std::time::Duration;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;

use crate::config::CorsOrigin;
use crate::openapi::ApiDoc;

/// Build the CORS layer from the configured allow-list.
///
/// Any method and request header is accepted from an allowed origin. A `*` entry allows every
/// origin; config validation guarantees it is never combined with credentials.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.cors;

    let allow_origin = if cors_config.allowed_origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            origins.push(origin.header_value().parse::<HeaderValue>()?);
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// Routes:
/// - `GET /`: service status
/// - `GET /healthz`: liveness probe
/// - `POST /analyze`: upload analysis, with the body limit from `limits.max_upload_size`
/// - `GET /openapi.json` and `GET /docs`: API documentation
///
/// # Errors
///
/// Returns an error if a configured CORS origin cannot be expressed as a header value.
#[instrument(skip_all)]
pub fn build_router(config: &Config) -> anyhow::Result<Router> {
    let router = Router::new()
        .route("/", get(api::handlers::health::root))
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/analyze",
            post(api::handlers::analyze::analyze_data).layer(DefaultBodyLimit::max(config.limits.max_upload_size)),
        )
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors_layer = create_cors_layer(config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The configured HTTP application, ready to serve.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Build the router for `config`.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let router = build_router(&config)?;
        Ok(Self { router, config })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application until `shutdown` resolves.
    ///
    /// In-flight requests are allowed to complete before this returns.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Dataset analyzer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}
