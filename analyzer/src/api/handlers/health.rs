//! Liveness endpoints.

use crate::api::models::analyze::{HealthResponse, ResponseStatus};
use axum::Json;

#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    summary = "Service status",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
    )
)]
pub async fn root() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: ResponseStatus::Success,
        message: "Dataset Analyzer API is running".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_utils::create_test_app;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_root_reports_running() {
        let server = create_test_app();

        let response = server.get("/").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body, json!({"status": "success", "message": "Dataset Analyzer API is running"}));
    }

    #[tokio::test]
    async fn test_healthz() {
        let server = create_test_app();

        let response = server.get("/healthz").await;

        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }
}
