//! Configuration schema definitions.
//!
//! Every section has defaults, so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::parsers::DEFAULT_DATE_FORMAT;

/// Root configuration for the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Decoder defaults.
    pub decoder: DecoderSettings,

    /// Cache store and response caching.
    pub cache: CacheSettings,

    /// HTTP backend.
    pub http: HttpSettings,

    /// Work-item runner.
    pub runner: RunnerSettings,

    /// Logging and metrics.
    pub observability: ObservabilitySettings,
}

/// Decoder policy defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecoderSettings {
    /// chrono `strftime` format for timestamp fields.
    pub date_format: String,
    pub forbid_empty_selection: bool,
    pub require_all_fields_tagged: bool,
    pub forbid_missing_attribute: bool,
    pub forbid_nested_traversal: bool,
    pub allow_nil_pointer: bool,
    pub allow_pointer_target: bool,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            forbid_empty_selection: false,
            require_all_fields_tagged: false,
            forbid_missing_attribute: false,
            forbid_nested_traversal: false,
            allow_nil_pointer: false,
            allow_pointer_target: false,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// SQLite file backing the cache.
    pub path: PathBuf,

    /// Lifetime of cached GET responses in seconds (0 = never expire).
    pub ttl_secs: u64,

    /// Serve GET responses through the cache.
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("scraper_cache.db"),
            ttl_secs: 86_400,
            enabled: true,
        }
    }
}

/// HTTP backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Work-item runner configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Base that relative work-item URLs are resolved against.
    pub base_url: Option<String>,

    /// Pause after this many attempted items (0 = never pause).
    pub pause_every: usize,

    /// Pause length in seconds.
    pub pause_secs: u64,

    /// Suffixes appended to each item URL; the fetched pages are combined
    /// into one selection before dispatch. Empty fetches the URL as-is.
    pub tabs: Vec<String>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            pause_every: 50,
            pause_secs: 30,
            tabs: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
