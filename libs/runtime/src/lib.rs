//! Process-level runtime support shared by the event tracker binaries:
//! layered configuration loading and logging initialization.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, AppSection, DatabaseConfig, LoggingConfig, Section};
