/// Provider Adapter — the single point of entry for all LLM vendor calls.
///
/// ARCHITECTURAL RULE: No other module may call a vendor API directly.
/// All resume analysis MUST go through `AnalysisProvider`.
///
/// The backend is a closed set (Gemini, OpenAI), selected once by
/// configuration and fixed for the process lifetime. Both backends converge
/// on the identical canonical `AnalysisResult` regardless of the vendor's
/// native field naming or prose formatting quirks.
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::resume::AnalysisResult;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

/// Vendor calls are the one stage that can suspend for a long time;
/// expiry surfaces as a `ProviderError`, never a retry.
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Provider returned empty content")]
    EmptyContent,

    #[error("Provider returned invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Which backend to construct, resolved from `AI_PROVIDER` at startup.
/// No per-request switching exists.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    Gemini { api_key: String, model: String },
    OpenAi { api_key: String, model: String },
}

/// The analysis backend trait. `AppState` holds an `Arc<dyn AnalysisProvider>`
/// constructed once in `main`, so "one instance per process" holds without
/// hidden global state.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Sends the prompt to the vendor and returns the normalized result.
    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, ProviderError>;

    /// Provider tag persisted on each record ("gemini" | "openai").
    fn name(&self) -> &str;

    /// Concrete model identifier persisted on each record.
    fn model(&self) -> &str;
}

/// Constructs the configured backend. Called once from `main`.
pub fn build_provider(config: &ProviderConfig) -> Arc<dyn AnalysisProvider> {
    match config {
        ProviderConfig::Gemini { api_key, model } => {
            Arc::new(GeminiProvider::new(api_key.clone(), model.clone()))
        }
        ProviderConfig::OpenAi { api_key, model } => {
            Arc::new(OpenAiProvider::new(api_key.clone(), model.clone()))
        }
    }
}

/// Builds the shared HTTP client used by both backends.
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

/// Ordered alias preference for the roles field. Vendors disagree on naming;
/// the first present key wins.
const ROLE_FIELD_ALIASES: &[&str] = &["suggested_roles", "suggestedRoles"];

/// Parses raw vendor output into the canonical `AnalysisResult`.
///
/// Models wrap JSON in markdown fences or pad it with whitespace despite
/// instructions, so the text is trimmed and de-fenced before parsing.
/// Missing fields default rather than fail; unknown fields are ignored.
pub(crate) fn parse_analysis_text(raw: &str) -> Result<AnalysisResult, ProviderError> {
    let cleaned = strip_json_fences(raw);
    let value: Value = serde_json::from_str(cleaned)?;
    Ok(normalize_analysis(&value))
}

fn normalize_analysis(value: &Value) -> AnalysisResult {
    AnalysisResult {
        skills: string_array(value.get("skills")),
        summary: value
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        suggested_roles: string_array(
            ROLE_FIELD_ALIASES.iter().find_map(|key| value.get(*key)),
        ),
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[derive(Debug, Deserialize)]
struct VendorError {
    error: VendorErrorBody,
}

#[derive(Debug, Deserialize)]
struct VendorErrorBody {
    message: String,
}

/// Extracts the vendor's error message from a non-2xx body.
/// Both vendors use an `{"error": {"message": ...}}` envelope; anything else
/// is passed through verbatim.
pub(crate) fn vendor_error_message(body: String) -> String {
    serde_json::from_str::<VendorError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Stub backend for handler tests. Deterministic, no network.
#[cfg(test)]
pub(crate) struct StubProvider;

#[cfg(test)]
#[async_trait]
impl AnalysisProvider for StubProvider {
    async fn analyze(&self, _prompt: &str) -> Result<AnalysisResult, ProviderError> {
        Ok(AnalysisResult {
            skills: vec!["Rust".to_string(), "Go".to_string(), "SQL".to_string()],
            summary: "Experienced backend engineer focused on distributed systems.".to_string(),
            suggested_roles: vec![
                "Backend Engineer".to_string(),
                "Platform Engineer".to_string(),
            ],
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}
