//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Response envelopes
//!
//! # API Structure
//!
//! - `POST /analyze`: classify uploaded files and summarise an optional message
//! - `GET /`: service status
//! - `GET /healthz`: plain-text liveness probe
//! - `GET /openapi.json`, `GET /docs`: generated OpenAPI document and viewer

pub mod handlers;
pub mod models;
