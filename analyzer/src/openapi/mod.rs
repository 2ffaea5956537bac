//! OpenAPI documentation for the analyzer API.
//!
//! The generated document is served at `/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::classify;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Dataset Analyzer API",
        description = "Upload datasets and documents for a shallow structural summary."
    ),
    paths(
        api::handlers::health::root,
        api::handlers::analyze::analyze_data,
    ),
    components(
        schemas(
            api::models::analyze::ResponseStatus,
            api::models::analyze::AnalyzeResponse,
            api::models::analyze::AnalysisResponse,
            api::models::analyze::MessageAnalysis,
            api::models::analyze::ErrorResponse,
            api::models::analyze::ErrorBody,
            api::models::analyze::HealthResponse,
            classify::FileMetadata,
            classify::ImageFormat,
        )
    ),
    tags(
        (name = "health", description = "Service status."),
        (name = "analyze", description = "Classify uploaded files.

Tabular uploads (`csv`, `xlsx`, `xls`) report their row and column counts along with the first three rows. \
JSON uploads report whether the top level is a list or an object. Other documents and images are recognised by \
extension or signature only."),
    )
)]
pub struct ApiDoc;
