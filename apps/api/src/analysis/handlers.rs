//! Analysis Orchestrator — sequences validation, extraction, prompting, the
//! provider call, and persistence for one request.
//!
//! Per-request state only; nothing is shared across requests. No partial
//! records: persistence happens only after a fully successful provider call.

use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use anyhow::anyhow;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::extract::{extract_text, FileKind};
use crate::analysis::prompts::build_prompt;
use crate::analysis::validation::{
    validate_resume_content, MAX_CONTENT_CHARS, MIN_CONTENT_CHARS,
};
use crate::errors::AppError;
use crate::models::resume::{AnalysisResult, NewAnalysisRecord, ResumeAnalysisRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub resume_text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub analysis: AnalysisResult,
    pub processing_time: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ResumeAnalysisRow> for AnalysisResponse {
    fn from(row: ResumeAnalysisRow) -> Self {
        AnalysisResponse {
            id: row.id,
            user_name: row.user_name,
            user_email: row.user_email,
            file_name: row.file_name,
            analysis: row.analysis.0,
            processing_time: row.processing_time_ms,
            created_at: row.created_at,
        }
    }
}

/// One uploaded multipart file part.
struct UploadField {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Transient on-disk home for an upload while it is being extracted.
/// Removed on every exit path; removal failure is logged, never escalated.
struct TempUpload {
    file: Option<NamedTempFile>,
}

impl TempUpload {
    fn spool(bytes: &[u8]) -> Result<Self, AppError> {
        let mut file = NamedTempFile::new()
            .map_err(|e| AppError::Internal(anyhow!("Failed to create temporary upload: {e}")))?;
        file.write_all(bytes)
            .map_err(|e| AppError::Internal(anyhow!("Failed to write temporary upload: {e}")))?;
        Ok(Self { file: Some(file) })
    }

    fn path(&self) -> &Path {
        self.file.as_ref().expect("upload already removed").path()
    }
}

impl Drop for TempUpload {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let path = file.path().to_path_buf();
            if let Err(e) = file.close() {
                warn!("Failed to delete temporary upload {}: {e}", path.display());
            }
        }
    }
}

/// POST /analyze/upload
pub async fn handle_analyze_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let started = Instant::now();

    let mut user_name: Option<String> = None;
    let mut user_email: Option<String> = None;
    let mut upload: Option<UploadField> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("userName") => user_name = Some(field.text().await.map_err(bad_multipart)?),
            Some("userEmail") => user_email = Some(field.text().await.map_err(bad_multipart)?),
            Some("resume") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                upload = Some(UploadField {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let (user_name, user_email) = match (nonempty(user_name), nonempty(user_email)) {
        (Some(name), Some(email)) => (name, email),
        _ => {
            return Err(AppError::Validation(
                "User name and email are required".to_string(),
            ))
        }
    };
    let user_email = normalize_email(&user_email)?;

    let upload = upload.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    let kind = upload
        .content_type
        .as_deref()
        .and_then(FileKind::from_mime)
        .ok_or_else(|| {
            AppError::Validation(
                "Invalid file type. Please upload a PDF, TXT, DOC, or DOCX file only.".to_string(),
            )
        })?;

    let temp = TempUpload::spool(&upload.bytes)?;
    let raw = tokio::fs::read(temp.path())
        .await
        .map_err(|e| AppError::Internal(anyhow!("Failed to read temporary upload: {e}")))?;
    let resume_text = extract_text(&raw, kind)
        .map_err(|e| AppError::Extraction(format!("Failed to parse file: {e}")))?;
    drop(temp);

    if resume_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Could not extract text from file. Please ensure the file contains readable text."
                .to_string(),
        ));
    }

    run_analysis(
        &state,
        AnalysisInput {
            user_name,
            user_email,
            resume_text,
            file_name: upload.file_name,
            file_type: kind.as_str(),
        },
        started,
    )
    .await
}

/// POST /analyze/text
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTextRequest>,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let started = Instant::now();

    let (user_name, user_email, resume_text) = match (
        nonempty(request.user_name),
        nonempty(request.user_email),
        nonempty(request.resume_text),
    ) {
        (Some(name), Some(email), Some(text)) => (name, email, text),
        _ => {
            return Err(AppError::Validation(
                "User name, email, and resume text are required".to_string(),
            ))
        }
    };
    let user_email = normalize_email(&user_email)?;

    let length = resume_text.trim().chars().count();
    if length < MIN_CONTENT_CHARS {
        return Err(AppError::Validation(
            "Resume text is too short. Please provide at least 100 characters with professional \
             details like experience, education, or skills."
                .to_string(),
        ));
    }
    if length > MAX_CONTENT_CHARS {
        return Err(AppError::Validation(
            "Resume text is too long. Please keep it under 50,000 characters.".to_string(),
        ));
    }

    run_analysis(
        &state,
        AnalysisInput {
            user_name,
            user_email,
            resume_text,
            file_name: None,
            file_type: "text",
        },
        started,
    )
    .await
}

struct AnalysisInput {
    user_name: String,
    user_email: String,
    resume_text: String,
    file_name: Option<String>,
    file_type: &'static str,
}

/// The shared pipeline tail: content check, prompt, provider call,
/// persistence. Elapsed time is measured from request start to just before
/// the store write.
async fn run_analysis(
    state: &AppState,
    input: AnalysisInput,
    started: Instant,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    validate_resume_content(&input.resume_text)
        .map_err(|rejection| AppError::ContentRejected(rejection.to_string()))?;

    let prompt = build_prompt(&input.resume_text);
    let analysis = state.provider.analyze(&prompt).await.map_err(|e| {
        AppError::Provider(format!(
            "Failed to analyze resume with {}: {e}",
            state.provider.name()
        ))
    })?;

    let processing_time_ms = started.elapsed().as_millis() as i64;

    let record = state
        .store
        .create(NewAnalysisRecord {
            user_name: input.user_name.trim().to_string(),
            user_email: input.user_email,
            original_text: input.resume_text,
            file_name: input.file_name,
            file_type: input.file_type.to_string(),
            analysis,
            ai_provider: state.provider.name().to_string(),
            model_used: state.provider.model().to_string(),
            processing_time_ms,
        })
        .await?;

    info!(
        "Resume analyzed for {} via {} in {processing_time_ms}ms",
        record.user_email, record.ai_provider
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {e}"))
}

fn nonempty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("invalid built-in pattern"))
}

/// Lowercases and trims the address, rejecting anything that does not look
/// like an email.
fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if !email_pattern().is_match(&email) {
        return Err(AppError::Validation(
            "Please provide a valid email address".to_string(),
        ));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::provider::StubProvider;
    use crate::resumes::store::MemoryStore;
    use crate::routes::build_router;

    const RESUME_TEXT: &str = "Experienced software engineer with 5 years in backend \
         development, skilled in Go, Python, and distributed systems design. Led cloud \
         migration projects and mentored junior developers.";

    fn test_app() -> axum::Router {
        let state = AppState {
            store: Arc::new(MemoryStore::default()),
            provider: Arc::new(StubProvider),
        };
        build_router(state)
    }

    fn text_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/analyze/text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn upload_request(parts: &[(&str, &str)], file: Option<(&str, &str, &str)>) -> Request<Body> {
        const BOUNDARY: &str = "test-boundary";
        let mut body = String::new();
        for (name, value) in parts {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        if let Some((file_name, content_type, content)) = file {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));

        Request::builder()
            .method("POST")
            .uri("/analyze/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_text_analysis_creates_retrievable_record() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "ada@example.com",
                "resumeText": RESUME_TEXT,
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["userName"], "Ada Lovelace");
        assert_eq!(body["userEmail"], "ada@example.com");
        assert!(!body["analysis"]["skills"].as_array().unwrap().is_empty());
        assert!(!body["analysis"]["suggestedRoles"]
            .as_array()
            .unwrap()
            .is_empty());
        assert!(body["processingTime"].as_i64().unwrap() >= 0);
        // Text mode carries no file name.
        assert!(body.get("fileName").is_none());

        let id = body["id"].as_str().unwrap();
        let detail = app
            .oneshot(
                Request::builder()
                    .uri(format!("/resumes/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(detail.status(), StatusCode::OK);
        let detail_body = body_json(detail).await;
        assert_eq!(detail_body["fileType"], "text");
        assert_eq!(detail_body["originalText"], RESUME_TEXT);
    }

    #[tokio::test]
    async fn test_text_of_99_chars_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "ada@example.com",
                "resumeText": "a".repeat(99),
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_text_of_100_resume_chars_reaches_provider() {
        let app = test_app();
        let text = format!("experience{}", "a".repeat(90));
        assert_eq!(text.chars().count(), 100);

        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "ada@example.com",
                "resumeText": text,
            })))
            .await
            .unwrap();
        // Stub provider answered, so the request made it past validation.
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_text_over_50k_chars_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "ada@example.com",
                "resumeText": "experience ".repeat(5_000),
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_text_missing_fields_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"]["message"],
            "User name, email, and resume text are required"
        );
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "not-an-email",
                "resumeText": RESUME_TEXT,
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_email_is_lowercased_and_trimmed() {
        let app = test_app();
        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "  Ada@Example.COM ",
                "resumeText": RESUME_TEXT,
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["userEmail"], "ada@example.com");
    }

    #[tokio::test]
    async fn test_non_resume_text_is_rejected_by_content_check() {
        let app = test_app();
        let response = app
            .oneshot(text_request(json!({
                "userName": "Ada Lovelace",
                "userEmail": "ada@example.com",
                "resumeText": "The quick brown fox jumps over the lazy dog. ".repeat(5),
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "CONTENT_REJECTED");
    }

    #[tokio::test]
    async fn test_upload_txt_file_creates_record() {
        let app = test_app();
        let response = app
            .oneshot(upload_request(
                &[
                    ("userName", "Ada Lovelace"),
                    ("userEmail", "ada@example.com"),
                ],
                Some(("resume.txt", "text/plain", RESUME_TEXT)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["fileName"], "resume.txt");
        assert!(!body["analysis"]["skills"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(upload_request(
                &[
                    ("userName", "Ada Lovelace"),
                    ("userEmail", "ada@example.com"),
                ],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_upload_disallowed_content_type_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(upload_request(
                &[
                    ("userName", "Ada Lovelace"),
                    ("userEmail", "ada@example.com"),
                ],
                Some(("resume.png", "image/png", "binary-ish")),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_missing_user_fields_is_rejected() {
        let app = test_app();
        let response = app
            .oneshot(upload_request(
                &[],
                Some(("resume.txt", "text/plain", RESUME_TEXT)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "User name and email are required");
    }

    #[test]
    fn test_normalize_email_accepts_plausible_addresses() {
        assert_eq!(
            normalize_email(" Ada@Example.COM ").unwrap(),
            "ada@example.com"
        );
        assert!(normalize_email("missing-at.example.com").is_err());
        assert!(normalize_email("no-domain@").is_err());
    }
}
