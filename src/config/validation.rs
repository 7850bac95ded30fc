//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check formats the decoder and runner will rely on
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use chrono::format::{Item, StrftimeItems};

use crate::config::schema::PipelineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending setting.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let date_format = &config.decoder.date_format;
    if date_format.trim().is_empty() {
        errors.push(ValidationError::new("decoder.date_format", "must not be empty"));
    } else if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        errors.push(ValidationError::new(
            "decoder.date_format",
            format!("`{date_format}` is not a valid strftime format"),
        ));
    }

    if config.cache.path.as_os_str().is_empty() {
        errors.push(ValidationError::new("cache.path", "must not be empty"));
    }

    if config.http.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("http.user_agent", "must not be empty"));
    }
    if config.http.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("http.connect_timeout_secs", "must be greater than 0"));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::new("http.request_timeout_secs", "must be greater than 0"));
    }

    if let Some(base) = &config.runner.base_url {
        if let Err(e) = url::Url::parse(base) {
            errors.push(ValidationError::new("runner.base_url", format!("`{base}`: {e}")));
        }
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("`{}` is not one of {}", config.observability.log_level, LOG_LEVELS.join(", ")),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&PipelineConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = PipelineConfig::default();
        config.decoder.date_format = "%Y-%Q".into();
        config.http.request_timeout_secs = 0;
        config.runner.base_url = Some("not a url".into());
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "decoder.date_format",
                "http.request_timeout_secs",
                "runner.base_url",
                "observability.log_level"
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_when_enabled() {
        let mut config = PipelineConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "observability.metrics_address");
    }
}
