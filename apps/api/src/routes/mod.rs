pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis;
use crate::resumes;
use crate::state::AppState;

/// Resumes are small documents; this bounds multipart bodies well above any
/// realistic upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/analyze/upload",
            post(analysis::handlers::handle_analyze_upload),
        )
        .route(
            "/analyze/text",
            post(analysis::handlers::handle_analyze_text),
        )
        // History API
        .route("/resumes", get(resumes::handlers::handle_list_resumes))
        .route(
            "/resumes/stats/:email",
            get(resumes::handlers::handle_user_stats),
        )
        .route(
            "/resumes/:id",
            get(resumes::handlers::handle_get_resume)
                .delete(resumes::handlers::handle_delete_resume),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
