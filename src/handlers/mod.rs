pub mod analytics;
pub mod health;
pub mod ingest;

use crate::db::DbPool;
use crate::services::{AnalyticsService, IngestService};

#[derive(Clone)]
pub struct AppState {
    pub ingest: IngestService,
    pub analytics: AnalyticsService,
    pub pool: DbPool,
}
