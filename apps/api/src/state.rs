use std::sync::Arc;

use crate::provider::AnalysisProvider;
use crate::resumes::store::AnalysisStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Both trait objects are constructed once at startup and reused for the
/// process lifetime. No other cross-request mutable state exists; the store's
/// backing database provides its own concurrency control.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AnalysisStore>,
    pub provider: Arc<dyn AnalysisProvider>,
}
