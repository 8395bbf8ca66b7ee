//! Ambient services shared by every binary in the workspace: configuration
//! loading/validation and logging setup.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError, DownloadThreads, LogLevel};
pub use logging::{init as init_logging, LoggingGuard};
