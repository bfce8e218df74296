//! Application orchestration: the analysis engine and its configuration.

pub mod config;
pub mod engine;

pub use config::{Config, LoggingConfig};
pub use engine::{AnalyzeOptions, Engine};
