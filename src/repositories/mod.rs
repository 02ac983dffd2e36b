pub mod analytics;
pub mod ingest;
pub mod mapping;

pub use analytics::AnalyticsRepository;
pub use ingest::IngestRepository;
pub use mapping::MappingRepository;
