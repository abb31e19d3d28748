use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeAnalysisRow, ResumeAnalysisSummary};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub email: Option<String>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub count: usize,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub data: Vec<ResumeAnalysisSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub email: String,
    pub total_analyses: i64,
    pub recent_analyses: Vec<ResumeAnalysisSummary>,
}

/// GET /resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let page = params.page.unwrap_or(1).max(1);
    let email = params
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());

    let (data, total) = state.store.list(email.as_deref(), page, limit).await?;
    let pages = (total + limit - 1) / limit;

    Ok(Json(ListResponse {
        count: data.len(),
        total,
        page,
        pages,
        data,
    }))
}

/// GET /resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeAnalysisRow>, AppError> {
    let record = state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume analysis not found".to_string()))?;

    Ok(Json(record))
}

/// DELETE /resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let deleted = state.store.delete_by_id(id).await?;
    if !deleted {
        return Err(AppError::NotFound("Resume analysis not found".to_string()));
    }

    Ok(Json(json!({
        "message": "Resume analysis deleted successfully"
    })))
}

/// GET /resumes/stats/:email
pub async fn handle_user_stats(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let email = email.trim().to_lowercase();
    let (total, recent) = state.store.stats_by_email(&email).await?;

    Ok(Json(StatsResponse {
        email,
        total_analyses: total,
        recent_analyses: recent,
    }))
}
