//! eldocs-core - Core library for the eldocs CLI
//!
//! This library provides a typed client for the Cloud Elements documents hub
//! REST API: file and folder metadata, listing, copy, upload, download and
//! folder management, plus configuration management, per-connector usage
//! statistics and diagnostic tracing.

pub mod auth;
pub mod config;
pub mod connector;
pub mod documents;
pub mod error;
pub mod stats;
pub mod trace;
pub mod types;

// Re-export commonly used types
pub use auth::CloudAuthorization;
pub use config::{config_exists, get_config_path, load_config, save_config, validate_config};
pub use config::{ConfigFile, ElementsConfig, LoggingConfig};
pub use connector::{ElementsConnector, Payload, Verb, DEFAULT_ELEMENTS_URL};
pub use documents::{EntryKind, FileSpec};
pub use error::{Error, Result};
pub use stats::GlobalStats;
pub use trace::{set_simplify_logged_uris, set_trace_level, DiagSink, TraceLevel};
pub use types::{CloudFile, CloudLink, CloudStorage, FileContent, Pong};
