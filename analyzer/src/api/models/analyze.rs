use crate::classify::FileMetadata;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome marker carried by every response envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// `POST /analyze` sent as `application/x-www-form-urlencoded`; files need multipart
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeForm {
    pub message: Option<String>,
}

/// Successful `POST /analyze` envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    pub status: ResponseStatus,
    pub response: AnalysisResponse,
}

impl AnalyzeResponse {
    pub fn success(response: AnalysisResponse) -> Self {
        Self {
            status: ResponseStatus::Success,
            response,
        }
    }
}

/// Per-request analysis of the message and uploaded files
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    /// Present when a non-empty message was submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_analysis: Option<MessageAnalysis>,
    /// One entry per uploaded file, in upload order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_analyses: Option<Vec<FileMetadata>>,
    /// Human-readable digest of the whole request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mock_model_response: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageAnalysis {
    pub mock_analysis: String,
}

/// Envelope returned for request-level failures
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub response: ErrorBody,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            response: ErrorBody { error: error.into() },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /` liveness response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ResponseStatus,
    pub message: String,
}
