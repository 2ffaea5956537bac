//! HTTP handler for `POST /analyze`.

use crate::api::models::analyze::{AnalysisResponse, AnalyzeForm, AnalyzeResponse, MessageAnalysis};
use crate::classify::UploadedFile;
use crate::errors::{Error, Result};
use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};

/// Request body encodings accepted by `POST /analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Multipart,
    UrlEncoded,
    Other,
}

impl BodyKind {
    fn detect(request: &Request) -> Self {
        let mime = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(|mime| mime.trim().to_ascii_lowercase());

        match mime.as_deref() {
            Some("multipart/form-data") => BodyKind::Multipart,
            Some("application/x-www-form-urlencoded") => BodyKind::UrlEncoded,
            _ => BodyKind::Other,
        }
    }
}

#[utoipa::path(
    post,
    path = "/analyze",
    tag = "analyze",
    summary = "Analyze message and files",
    description = "Classify each uploaded file and summarise its contents. Tabular files (csv, xlsx, xls) report \
        their shape and first rows, JSON files their top-level structure. Documents and images are recognised \
        but not parsed. A file that cannot be read is reported with `file_type: error` without failing the request.\n\n\
        A message without files may also be sent as `application/x-www-form-urlencoded`. An empty body is an \
        empty analysis.",
    request_body(
        content_type = "multipart/form-data",
        description = "Optional `message` text field and zero or more `files` parts"
    ),
    responses(
        (status = 200, description = "Analysis completed", body = AnalyzeResponse),
        (status = 400, description = "Malformed form body", body = crate::api::models::analyze::ErrorResponse),
        (status = 413, description = "Upload exceeds the configured size limit", body = crate::api::models::analyze::ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn analyze_data(request: Request) -> Result<Json<AnalyzeResponse>> {
    let (message, mut files) = match BodyKind::detect(&request) {
        BodyKind::Multipart => {
            let multipart = Multipart::from_request(request, &()).await?;
            read_multipart(multipart).await?
        }
        BodyKind::UrlEncoded => {
            let Form(form) = Form::<AnalyzeForm>::from_request(request, &()).await?;
            (form.message, Vec::new())
        }
        BodyKind::Other => {
            let body = Bytes::from_request(request, &()).await?;
            if !body.is_empty() {
                return Err(Error::BadRequest {
                    message: "Expected a multipart/form-data or application/x-www-form-urlencoded body".to_string(),
                });
            }
            (None, Vec::new())
        }
    };

    let message = message.filter(|m| !m.is_empty());
    let analysis = analyze(message.as_deref(), &mut files);

    tracing::info!(
        has_message = message.is_some(),
        files = files.len(),
        "Analysis completed"
    );

    Ok(Json(AnalyzeResponse::success(analysis)))
}

/// Collect the `message` field and every `files` part; other fields are ignored.
async fn read_multipart(mut multipart: Multipart) -> Result<(Option<String>, Vec<UploadedFile>)> {
    let mut message: Option<String> = None;
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "message" => {
                message = Some(field.text().await?);
            }
            "files" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("upload_{}", files.len() + 1));
                let file = UploadedFile::new(filename, field.bytes().await?);

                tracing::debug!(filename = %file.filename(), size_bytes = file.len(), "Received upload");
                files.push(file);
            }
            _ => {
                // Ignore unknown fields (the web client also sends `fileTypes`)
            }
        }
    }

    Ok((message, files))
}

/// Classify `files` in order and build the digest.
///
/// Digest lines: the message line first, then `Processed N files:` and one `- name (type)` line
/// per file.
pub fn analyze(message: Option<&str>, files: &mut [UploadedFile]) -> AnalysisResponse {
    let mut response = AnalysisResponse::default();
    let mut digest = Vec::with_capacity(files.len() + 2);

    if let Some(message) = message {
        let line = format!("Analyzed message: '{message}'");
        response.message_analysis = Some(MessageAnalysis {
            mock_analysis: line.clone(),
        });
        digest.push(line);
    }

    if !files.is_empty() {
        digest.push(format!("Processed {} files:", files.len()));

        let analyses = files
            .iter_mut()
            .map(|file| {
                let metadata = file.classify();
                digest.push(format!("- {} ({})", file.filename(), metadata.file_type()));
                metadata
            })
            .collect();
        response.file_analyses = Some(analyses);
    }

    if !digest.is_empty() {
        response.mock_model_response = Some(digest.join("\n"));
    }

    response
}
