//! Built-in parsers and the numeric/timestamp policies the decoder shares.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::parsers::{ParseError, ParserFn, Value};

/// RFC 3339 in chrono `strftime` syntax. `%#z` accepts `Z` as well as `+hh:mm`.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%#z";

static INT_SHAPE: OnceLock<Regex> = OnceLock::new();
static DIGITS: OnceLock<Regex> = OnceLock::new();
static FLOAT_SHAPE: OnceLock<Regex> = OnceLock::new();
static FLOAT_NUMBER: OnceLock<Regex> = OnceLock::new();

fn int_shape() -> &'static Regex {
    INT_SHAPE.get_or_init(|| {
        Regex::new(r"^[A-Za-z$%€£¥]*\s*[0-9]+\s*[A-Za-z$%€£¥]*$").expect("integer shape regex")
    })
}

fn digits() -> &'static Regex {
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("digit run regex"))
}

fn float_shape() -> &'static Regex {
    FLOAT_SHAPE.get_or_init(|| {
        Regex::new(r"^[A-Za-z$%€£¥]?\s*[+-]?\d+(?:,\d+)*(?:\.\d+)?\s*[A-Za-z$%€£¥]?$")
            .expect("float shape regex")
    })
}

fn float_number() -> &'static Regex {
    FLOAT_NUMBER.get_or_init(|| Regex::new(r"[+-]?\d+(?:,\d+)*(?:\.\d+)?").expect("float number regex"))
}

/// Integer policy: one digit run, optionally wrapped in letter/currency/percent markers.
pub fn parse_int(raw: &str) -> Result<i64, ParseError> {
    let trimmed = raw.trim();
    let invalid = || ParseError::Invalid {
        input: trimmed.to_string(),
        target: "integer",
    };

    if !int_shape().is_match(trimmed) {
        return Err(invalid());
    }
    let run = digits().find(trimmed).ok_or_else(invalid)?;
    run.as_str().parse::<i64>().map_err(|_| invalid())
}

/// Float policy: signed decimal with optional `,` grouping and one marker each side.
pub fn parse_float(raw: &str) -> Result<f64, ParseError> {
    let trimmed = raw.trim();
    let invalid = || ParseError::Invalid {
        input: trimmed.to_string(),
        target: "float",
    };

    if !float_shape().is_match(trimmed) {
        return Err(invalid());
    }
    let number = float_number().find(trimmed).ok_or_else(invalid)?;
    number.as_str().replace(',', "").parse::<f64>().map_err(|_| invalid())
}

/// Parse with a chrono format. Offset-less formats read as UTC, date-only ones as midnight UTC.
pub fn parse_timestamp(raw: &str, format: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    let trimmed = raw.trim();

    // Fractional seconds are valid RFC 3339 but absent from the strftime form.
    if format == DEFAULT_DATE_FORMAT {
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt);
        }
    }

    let first_err = match DateTime::parse_from_str(trimmed, format) {
        Ok(dt) => return Ok(dt),
        Err(e) => e,
    };
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
        return Ok(naive.and_utc().fixed_offset());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc().fixed_offset());
        }
    }

    Err(ParseError::Timestamp {
        input: trimmed.to_string(),
        format: format.to_string(),
        source: first_err,
    })
}

/// Raw text, untouched.
pub fn string(raw: &str) -> Result<Value, ParseError> {
    Ok(Value::Str(raw.to_string()))
}

/// Raw text with surrounding whitespace removed.
pub fn trimmed(raw: &str) -> Result<Value, ParseError> {
    Ok(Value::Str(raw.trim().to_string()))
}

pub fn int(raw: &str) -> Result<Value, ParseError> {
    parse_int(raw).map(Value::Int)
}

pub fn float(raw: &str) -> Result<Value, ParseError> {
    parse_float(raw).map(Value::Float)
}

/// Timestamp parser bound to `format`.
pub fn timestamp(format: impl Into<String>) -> ParserFn {
    let format = format.into();
    Arc::new(move |raw| parse_timestamp(raw, &format).map(Value::Time))
}

/// `default` for blank input, otherwise `inner`.
pub fn default_if_empty(default: impl Into<Value>, inner: ParserFn) -> ParserFn {
    let default = default.into();
    Arc::new(move |raw| {
        if raw.trim().is_empty() {
            return Ok(default.clone());
        }
        inner(raw)
    })
}
