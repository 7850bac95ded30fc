//! Parser registry subsystem.
//!
//! # Data Flow
//! ```text
//! raw text (extracted by the decoder)
//!     → registry lookup by name (parser tag on the field)
//!     → ParserFn (built-in or caller supplied)
//!     → Value (Str | Int | Float | Time | None)
//!     → decoder checks Value kind against the field kind
//! ```
//!
//! # Design Decisions
//! - Parsers are pure `&str -> Value` functions, shared via `Arc`
//! - `Value::None` is the "leave this field empty" marker
//! - Later registrations under the same name replace earlier ones

pub mod builtin;
pub mod value;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use builtin::{default_if_empty, parse_float, parse_int, parse_timestamp, timestamp, DEFAULT_DATE_FORMAT};
pub use value::{Kind, Value};

/// A named text conversion.
pub type ParserFn = Arc<dyn Fn(&str) -> Result<Value, ParseError> + Send + Sync>;

/// Failure converting raw text.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input did not match the accepted shape for `target`.
    #[error("`{input}` is not valid for parsing to {target}")]
    Invalid { input: String, target: &'static str },

    /// Input did not match the configured date format.
    #[error("`{input}` does not match date format `{format}`: {source}")]
    Timestamp {
        input: String,
        format: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Free-form failure from a caller parser.
    #[error("{0}")]
    Message(String),

    /// Wrapped failure from a caller parser.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl ParseError {
    pub fn msg(message: impl Into<String>) -> Self {
        ParseError::Message(message.into())
    }

    pub fn custom<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ParseError::Custom(Box::new(err))
    }
}

/// Wrap a plain function or closure as a [`ParserFn`].
pub fn parser<F>(f: F) -> ParserFn
where
    F: Fn(&str) -> Result<Value, ParseError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Name → parser mapping.
#[derive(Clone, Default)]
pub struct Registry {
    parsers: HashMap<String, ParserFn>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in parsers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("string", parser(builtin::string));
        registry.register("trimmed", parser(builtin::trimmed));
        registry.register("int", parser(builtin::int));
        registry.register("float", parser(builtin::float));
        registry.register("timestamp", timestamp(DEFAULT_DATE_FORMAT));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, f: ParserFn) -> &mut Self {
        self.parsers.insert(name.into(), f);
        self
    }

    /// Copy every entry of `other` over this registry.
    pub fn merge(&mut self, other: &Registry) -> &mut Self {
        for (name, f) in &other.parsers {
            self.parsers.insert(name.clone(), f.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParserFn> {
        self.parsers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ParserFn)> for Registry {
    fn from_iter<I: IntoIterator<Item = (S, ParserFn)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for (name, f) in iter {
            registry.register(name, f);
        }
        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.parsers.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("parsers", &names).finish()
    }
}
