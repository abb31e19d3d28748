//! Record Store — owns every persisted analysis record.
//!
//! `AppState` holds an `Arc<dyn AnalysisStore>`; the production backend is
//! PostgreSQL, tests swap in an in-memory implementation of the same trait.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{NewAnalysisRecord, ResumeAnalysisRow, ResumeAnalysisSummary};

/// Listing/stats projection: everything except `original_text`.
const SUMMARY_COLUMNS: &str = "id, user_name, user_email, file_name, file_type, analysis, \
     ai_provider, model_used, processing_time_ms, created_at, updated_at";

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persists a new record, assigning id and timestamps.
    async fn create(&self, record: NewAnalysisRecord) -> Result<ResumeAnalysisRow, AppError>;

    /// Returns one page of summaries (newest first) plus the total count
    /// matching the filter. `page` is 1-based.
    async fn list(
        &self,
        email: Option<&str>,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<ResumeAnalysisSummary>, i64), AppError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ResumeAnalysisRow>, AppError>;

    /// Returns whether a record was actually deleted.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;

    /// Total count plus up to 5 most recent summaries for one user.
    async fn stats_by_email(
        &self,
        email: &str,
    ) -> Result<(i64, Vec<ResumeAnalysisSummary>), AppError>;
}

/// PostgreSQL-backed store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisStore for PgStore {
    async fn create(&self, record: NewAnalysisRecord) -> Result<ResumeAnalysisRow, AppError> {
        let row = sqlx::query_as::<_, ResumeAnalysisRow>(
            r#"
            INSERT INTO resume_analyses
                (user_name, user_email, original_text, file_name, file_type,
                 analysis, ai_provider, model_used, processing_time_ms)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&record.user_name)
        .bind(&record.user_email)
        .bind(&record.original_text)
        .bind(&record.file_name)
        .bind(&record.file_type)
        .bind(sqlx::types::Json(&record.analysis))
        .bind(&record.ai_provider)
        .bind(&record.model_used)
        .bind(record.processing_time_ms)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(
        &self,
        email: Option<&str>,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<ResumeAnalysisSummary>, i64), AppError> {
        let offset = (page - 1) * page_size;

        let (rows, total) = match email {
            Some(email) => {
                let rows = sqlx::query_as::<_, ResumeAnalysisSummary>(&format!(
                    "SELECT {SUMMARY_COLUMNS} FROM resume_analyses \
                     WHERE user_email = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                ))
                .bind(email)
                .bind(page_size)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM resume_analyses WHERE user_email = $1")
                        .bind(email)
                        .fetch_one(&self.pool)
                        .await?;
                (rows, total)
            }
            None => {
                let rows = sqlx::query_as::<_, ResumeAnalysisSummary>(&format!(
                    "SELECT {SUMMARY_COLUMNS} FROM resume_analyses \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                ))
                .bind(page_size)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resume_analyses")
                    .fetch_one(&self.pool)
                    .await?;
                (rows, total)
            }
        };

        Ok((rows, total))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ResumeAnalysisRow>, AppError> {
        let row = sqlx::query_as::<_, ResumeAnalysisRow>(
            "SELECT * FROM resume_analyses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM resume_analyses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats_by_email(
        &self,
        email: &str,
    ) -> Result<(i64, Vec<ResumeAnalysisSummary>), AppError> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM resume_analyses WHERE user_email = $1")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        let recent = sqlx::query_as::<_, ResumeAnalysisSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM resume_analyses \
             WHERE user_email = $1 ORDER BY created_at DESC LIMIT 5"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok((total, recent))
    }
}

/// In-memory store for handler tests. Same contract as `PgStore`.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
    records: std::sync::Mutex<Vec<ResumeAnalysisRow>>,
}

#[cfg(test)]
#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn create(&self, record: NewAnalysisRecord) -> Result<ResumeAnalysisRow, AppError> {
        let now = chrono::Utc::now();
        let row = ResumeAnalysisRow {
            id: Uuid::new_v4(),
            user_name: record.user_name,
            user_email: record.user_email,
            original_text: record.original_text,
            file_name: record.file_name,
            file_type: record.file_type,
            analysis: sqlx::types::Json(record.analysis),
            ai_provider: record.ai_provider,
            model_used: record.model_used,
            processing_time_ms: record.processing_time_ms,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn list(
        &self,
        email: Option<&str>,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<ResumeAnalysisSummary>, i64), AppError> {
        let records = self.records.lock().unwrap();
        let mut rows: Vec<_> = records
            .iter()
            .filter(|r| email.map_or(true, |e| r.user_email == e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len() as i64;
        let offset = ((page - 1) * page_size).max(0) as usize;
        let data = rows
            .into_iter()
            .skip(offset)
            .take(page_size.max(0) as usize)
            .map(|r| r.to_summary())
            .collect();

        Ok((data, total))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ResumeAnalysisRow>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn stats_by_email(
        &self,
        email: &str,
    ) -> Result<(i64, Vec<ResumeAnalysisSummary>), AppError> {
        let records = self.records.lock().unwrap();
        let mut rows: Vec<_> = records
            .iter()
            .filter(|r| r.user_email == email)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len() as i64;
        let recent = rows.into_iter().take(5).map(|r| r.to_summary()).collect();
        Ok((total, recent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::AnalysisResult;

    fn fixture(email: &str) -> NewAnalysisRecord {
        NewAnalysisRecord {
            user_name: "Ada Lovelace".to_string(),
            user_email: email.to_string(),
            original_text: "Experienced engineer with a strong education background.".to_string(),
            file_name: None,
            file_type: "text".to_string(),
            analysis: AnalysisResult {
                skills: vec!["Rust".to_string()],
                summary: "Engineer.".to_string(),
                suggested_roles: vec!["Backend Engineer".to_string()],
            },
            ai_provider: "gemini".to_string(),
            model_used: "gemini-2.5-flash".to_string(),
            processing_time_ms: 42,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = MemoryStore::default();
        let row = store.create(fixture("a@example.com")).await.unwrap();
        assert!(!row.id.is_nil());
        assert_eq!(row.created_at, row.updated_at);
        assert_eq!(row.processing_time_ms, 42);
    }

    #[tokio::test]
    async fn test_list_filters_by_email() {
        let store = MemoryStore::default();
        store.create(fixture("a@example.com")).await.unwrap();
        store.create(fixture("b@example.com")).await.unwrap();
        store.create(fixture("a@example.com")).await.unwrap();

        let (rows, total) = store.list(Some("a@example.com"), 1, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.user_email == "a@example.com"));
    }

    #[tokio::test]
    async fn test_list_paginates_newest_first() {
        let store = MemoryStore::default();
        for _ in 0..5 {
            store.create(fixture("a@example.com")).await.unwrap();
        }

        let (page1, total) = store.list(None, 1, 2).await.unwrap();
        let (page2, _) = store.list(None, 2, 2).await.unwrap();
        let (page3, _) = store.list(None, 3, 2).await.unwrap();

        assert_eq!(total, 5);
        assert_eq!(page1.len(), 2);
        assert_eq!(page2.len(), 2);
        assert_eq!(page3.len(), 1);
        assert!(page1[0].created_at >= page1[1].created_at);
        assert!(page1[1].created_at >= page2[0].created_at);
    }

    #[tokio::test]
    async fn test_delete_missing_id_leaves_count_unchanged() {
        let store = MemoryStore::default();
        store.create(fixture("a@example.com")).await.unwrap();

        let deleted = store.delete_by_id(Uuid::new_v4()).await.unwrap();
        assert!(!deleted);

        let (_, total) = store.list(None, 1, 10).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_stats_caps_recent_at_five() {
        let store = MemoryStore::default();
        for _ in 0..7 {
            store.create(fixture("a@example.com")).await.unwrap();
        }

        let (total, recent) = store.stats_by_email("a@example.com").await.unwrap();
        assert_eq!(total, 7);
        assert_eq!(recent.len(), 5);
    }
}
