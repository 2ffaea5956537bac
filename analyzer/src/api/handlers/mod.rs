//! HTTP request handlers.
//!
//! - [`analyze`]: multipart upload analysis (`POST /analyze`)
//! - [`health`]: service status (`GET /`)
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which renders the `{"status": "error", ...}`
//! envelope with a matching HTTP status code.

pub mod analyze;
pub mod health;
