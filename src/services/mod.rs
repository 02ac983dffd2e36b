pub mod analytics;
pub mod ingest;

pub use analytics::AnalyticsService;
pub use ingest::IngestService;
