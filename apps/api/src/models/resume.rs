#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// The canonical analysis shape returned by every provider backend.
///
/// All three fields are always present: a provider that omits one gets an
/// empty string / empty list instead of surfacing a missing-field error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub suggested_roles: Vec<String>,
}

/// One persisted analysis outcome. Created once per successful provider call,
/// never updated in place, deleted only by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisRow {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub original_text: String,
    pub file_name: Option<String>,
    /// "pdf" | "txt" | "docx" | "text"
    pub file_type: String,
    pub analysis: Json<AnalysisResult>,
    /// "gemini" | "openai"
    pub ai_provider: String,
    pub model_used: String,
    pub processing_time_ms: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing/stats projection of `ResumeAnalysisRow` without `original_text`.
/// The full text is large and never needed for summaries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysisSummary {
    pub id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub file_name: Option<String>,
    pub file_type: String,
    pub analysis: Json<AnalysisResult>,
    pub ai_provider: String,
    pub model_used: String,
    pub processing_time_ms: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `AnalysisStore::create`. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewAnalysisRecord {
    pub user_name: String,
    pub user_email: String,
    pub original_text: String,
    pub file_name: Option<String>,
    pub file_type: String,
    pub analysis: AnalysisResult,
    pub ai_provider: String,
    pub model_used: String,
    pub processing_time_ms: i64,
}

impl ResumeAnalysisRow {
    /// Projects out `original_text` for listings and stats.
    pub fn to_summary(&self) -> ResumeAnalysisSummary {
        ResumeAnalysisSummary {
            id: self.id,
            user_name: self.user_name.clone(),
            user_email: self.user_email.clone(),
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
            analysis: Json(self.analysis.0.clone()),
            ai_provider: self.ai_provider.clone(),
            model_used: self.model_used.clone(),
            processing_time_ms: self.processing_time_ms,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
