//! Per-call decode options.

use crate::config::DecoderSettings;
use crate::parsers::{ParserFn, Registry, DEFAULT_DATE_FORMAT};

/// Options for one decode call.
///
/// Starts from the built-in parser registry and lenient policies; every
/// builder method returns the updated config.
#[derive(Debug, Clone)]
pub struct DecodeConfig {
    /// chrono `strftime` format for timestamp fields without a parser.
    pub date_format: String,
    pub parsers: Registry,
    pub forbid_empty_selection: bool,
    pub require_all_fields_tagged: bool,
    pub forbid_missing_attribute: bool,
    pub forbid_nested_traversal: bool,
    /// A parser's `Value::None` leaves an optional field as `None` rather than `Some(zero)`.
    pub allow_nil_pointer: bool,
    /// Optional leaf fields receive built-in conversions; optional nested records are allocated.
    pub allow_pointer_target: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            parsers: Registry::with_defaults(),
            forbid_empty_selection: false,
            require_all_fields_tagged: false,
            forbid_missing_attribute: false,
            forbid_nested_traversal: false,
            allow_nil_pointer: false,
            allow_pointer_target: false,
        }
    }
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    /// Merge `parsers` over the current registry.
    pub fn parsers(mut self, parsers: &Registry) -> Self {
        self.parsers.merge(parsers);
        self
    }

    pub fn parser(mut self, name: impl Into<String>, f: ParserFn) -> Self {
        self.parsers.register(name, f);
        self
    }

    pub fn forbid_empty_selection(mut self, on: bool) -> Self {
        self.forbid_empty_selection = on;
        self
    }

    pub fn require_all_fields_tagged(mut self, on: bool) -> Self {
        self.require_all_fields_tagged = on;
        self
    }

    pub fn forbid_missing_attribute(mut self, on: bool) -> Self {
        self.forbid_missing_attribute = on;
        self
    }

    pub fn forbid_nested_traversal(mut self, on: bool) -> Self {
        self.forbid_nested_traversal = on;
        self
    }

    pub fn allow_nil_pointer(mut self, on: bool) -> Self {
        self.allow_nil_pointer = on;
        self
    }

    pub fn allow_pointer_target(mut self, on: bool) -> Self {
        self.allow_pointer_target = on;
        self
    }
}

impl From<&DecoderSettings> for DecodeConfig {
    fn from(settings: &DecoderSettings) -> Self {
        DecodeConfig::default()
            .date_format(settings.date_format.clone())
            .forbid_empty_selection(settings.forbid_empty_selection)
            .require_all_fields_tagged(settings.require_all_fields_tagged)
            .forbid_missing_attribute(settings.forbid_missing_attribute)
            .forbid_nested_traversal(settings.forbid_nested_traversal)
            .allow_nil_pointer(settings.allow_nil_pointer)
            .allow_pointer_target(settings.allow_pointer_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{parser, Value};

    #[test]
    fn test_defaults() {
        let cfg = DecodeConfig::default();
        assert_eq!(cfg.date_format, "%Y-%m-%dT%H:%M:%S%#z");
        assert!(cfg.parsers.contains("int"));
        assert!(!cfg.forbid_empty_selection);
        assert!(!cfg.require_all_fields_tagged);
        assert!(!cfg.allow_nil_pointer);
        assert!(!cfg.allow_pointer_target);
    }

    #[test]
    fn test_caller_parsers_win() {
        let mut custom = Registry::new();
        custom.register("float", parser(|_| Ok(Value::Float(9.0))));
        let cfg = DecodeConfig::new().parsers(&custom);

        let f = cfg.parsers.get("float").unwrap();
        assert_eq!(f("1.5").unwrap(), Value::Float(9.0));
        assert!(cfg.parsers.contains("int"));
    }

    #[test]
    fn test_from_settings() {
        let settings = DecoderSettings {
            date_format: "%d/%m/%Y".into(),
            forbid_empty_selection: true,
            ..DecoderSettings::default()
        };
        let cfg = DecodeConfig::from(&settings);
        assert_eq!(cfg.date_format, "%d/%m/%Y");
        assert!(cfg.forbid_empty_selection);
        assert!(!cfg.forbid_missing_attribute);
    }
}
