pub mod config;
pub mod logging;

pub use config::{AnalysisSettings, DiffGranularity, LoggingSettings, Settings};
