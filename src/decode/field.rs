//! Leaf field types and their conversions.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use crate::decode::config::DecodeConfig;
use crate::decode::error::ErrorKind;
use crate::parsers::{parse_float, parse_int, parse_timestamp, Kind, ParseError, Value};

/// A record field the decoder can write.
///
/// Implement this for caller types that are only ever filled through a named
/// parser; the default `parse_text` rejects built-in conversion.
pub trait Field {
    /// Store a parser result. `Value::None` resets the field.
    fn assign(&mut self, value: Value, cfg: &DecodeConfig) -> Result<(), ErrorKind>;

    /// Built-in conversion of non-empty raw text.
    fn parse_text(&mut self, raw: &str, cfg: &DecodeConfig) -> Result<(), ErrorKind> {
        let _ = (raw, cfg);
        Err(ErrorKind::UnsupportedType(std::any::type_name::<Self>()))
    }
}

/// A type with a built-in conversion from text and from parser values.
pub trait Leaf: Default + Sized {
    const KIND: Kind;

    /// `None` when the value's kind or range does not fit.
    fn from_value(value: Value) -> Option<Self>;

    fn from_text(raw: &str, cfg: &DecodeConfig) -> Result<Self, ParseError>;
}

fn convert<T: Leaf>(value: Value) -> Result<T, ErrorKind> {
    let found = value.type_name();
    T::from_value(value).ok_or(ErrorKind::TypeMismatch {
        expected: T::KIND.name(),
        found,
    })
}

impl Leaf for String {
    const KIND: Kind = Kind::Str;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    fn from_text(raw: &str, _cfg: &DecodeConfig) -> Result<Self, ParseError> {
        Ok(raw.trim().to_string())
    }
}

macro_rules! int_leaf {
    ($($t:ty),*) => {$(
        impl Leaf for $t {
            const KIND: Kind = Kind::Int;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Int(i) => <$t>::try_from(i).ok(),
                    _ => None,
                }
            }

            fn from_text(raw: &str, _cfg: &DecodeConfig) -> Result<Self, ParseError> {
                let parsed = parse_int(raw)?;
                <$t>::try_from(parsed).map_err(|_| ParseError::Invalid {
                    input: raw.trim().to_string(),
                    target: stringify!($t),
                })
            }
        }
    )*};
}

int_leaf!(i64, i32, u64, u32, usize);

impl Leaf for f64 {
    const KIND: Kind = Kind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f),
            _ => None,
        }
    }

    fn from_text(raw: &str, _cfg: &DecodeConfig) -> Result<Self, ParseError> {
        parse_float(raw)
    }
}

impl Leaf for f32 {
    const KIND: Kind = Kind::Float;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(f) => Some(f as f32),
            _ => None,
        }
    }

    fn from_text(raw: &str, _cfg: &DecodeConfig) -> Result<Self, ParseError> {
        parse_float(raw).map(|f| f as f32)
    }
}

macro_rules! time_leaf {
    ($t:ty, $map:expr) => {
        impl Leaf for $t {
            const KIND: Kind = Kind::Time;

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::Time(t) => Some(($map)(t)),
                    _ => None,
                }
            }

            fn from_text(raw: &str, cfg: &DecodeConfig) -> Result<Self, ParseError> {
                parse_timestamp(raw, &cfg.date_format).map($map)
            }
        }
    };
}

time_leaf!(DateTime<FixedOffset>, |t: DateTime<FixedOffset>| t);
time_leaf!(DateTime<Utc>, |t: DateTime<FixedOffset>| t.with_timezone(&Utc));
time_leaf!(NaiveDateTime, |t: DateTime<FixedOffset>| t.naive_local());
time_leaf!(NaiveDate, |t: DateTime<FixedOffset>| t.date_naive());

macro_rules! leaf_field {
    ($($t:ty),*) => {$(
        impl Field for $t {
            fn assign(&mut self, value: Value, _cfg: &DecodeConfig) -> Result<(), ErrorKind> {
                *self = if value.is_none() {
                    <$t>::default()
                } else {
                    convert::<$t>(value)?
                };
                Ok(())
            }

            fn parse_text(&mut self, raw: &str, cfg: &DecodeConfig) -> Result<(), ErrorKind> {
                *self = <$t as Leaf>::from_text(raw, cfg)?;
                Ok(())
            }
        }
    )*};
}

leaf_field!(
    String,
    i64,
    i32,
    u64,
    u32,
    usize,
    f64,
    f32,
    DateTime<FixedOffset>,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate
);

impl<T: Leaf> Field for Option<T> {
    fn assign(&mut self, value: Value, cfg: &DecodeConfig) -> Result<(), ErrorKind> {
        *self = if value.is_none() {
            if cfg.allow_nil_pointer {
                None
            } else {
                Some(T::default())
            }
        } else {
            Some(convert::<T>(value)?)
        };
        Ok(())
    }

    fn parse_text(&mut self, raw: &str, cfg: &DecodeConfig) -> Result<(), ErrorKind> {
        if !cfg.allow_pointer_target {
            return Err(ErrorKind::UnsupportedType(std::any::type_name::<Self>()));
        }
        *self = Some(T::from_text(raw, cfg)?);
        Ok(())
    }
}
