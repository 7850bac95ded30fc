//! Decode errors.

use thiserror::Error;

use crate::decode::rule::RuleError;
use crate::dom::SelectorError;
use crate::parsers::ParseError;

/// A failed decode, with the dotted path of the offending field.
#[derive(Debug, Error)]
#[error("field `{path}`: {kind}")]
pub struct DecodeError {
    pub path: String,
    #[source]
    pub kind: ErrorKind,
}

impl DecodeError {
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        Self {
            path: String::new(),
            kind: kind.into(),
        }
    }

    /// Prepend the enclosing field name to the path.
    pub fn within(mut self, field: &str) -> Self {
        self.path = if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{field}.{}", self.path)
        };
        self
    }
}

/// Why a field could not be decoded.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("not a decodable record: {0}")]
    TypeError(String),

    #[error("field has no extraction rule")]
    MissingRule,

    #[error("selector `{selector}` matched nothing")]
    EmptySelection { selector: String },

    #[error("attribute `{attribute}` missing on `{selector}`")]
    MissingAttribute { attribute: String, selector: String },

    #[error("parser `{0}` is not registered")]
    UnknownParser(String),

    #[error("parser produced {found}, field holds {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("no built-in conversion for `{0}`")]
    UnsupportedType(&'static str),

    #[error("{source}")]
    Parse {
        parser: Option<String>,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    InvalidSelector(#[from] SelectorError),

    #[error(transparent)]
    InvalidRule(#[from] RuleError),
}

impl From<ParseError> for ErrorKind {
    fn from(source: ParseError) -> Self {
        ErrorKind::Parse {
            parser: None,
            source,
        }
    }
}
