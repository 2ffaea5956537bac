//! API request and response data models.
//!
//! API models are kept apart from the classifier's own types so the wire envelope can evolve
//! independently. All models derive `utoipa::ToSchema` for the generated OpenAPI document.
//!
//! - [`analyze`]: the `{"status", "response"}` envelopes for `/analyze` and `/`

pub mod analyze;
