pub mod analytics;
pub mod reading;

pub use analytics::*;
pub use reading::*;
