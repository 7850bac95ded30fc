//! Declarative record decoder.
//!
//! # Data Flow
//! ```text
//! Selection (node) + &mut R where R: Record
//!     → schema_of::<R>() (built once per type, shared)
//!     → for each field in declaration order:
//!         nested  → recurse with the same node
//!         leaf    → rule.selector → matched nodes
//!                 → raw text (own text | attribute)
//!                 → named parser → Value → kind check
//!                   or built-in conversion by field type
//!     → first failure aborts with a dotted field path
//! ```
//!
//! # Design Decisions
//! - Schemas replace runtime reflection: accessors are plain `fn` pointers
//! - Parser results are a tagged `Value` checked against the field type
//! - Blank raw text without a parser leaves the field untouched
//! - Strictness is opt-in through `DecodeConfig` flags

pub mod config;
pub mod decoder;
pub mod error;
pub mod field;
pub mod rule;
pub mod schema;

pub use config::DecodeConfig;
pub use decoder::{decode, decode_document, decode_str};
pub use error::{DecodeError, ErrorKind};
pub use field::{Field, Leaf};
pub use rule::{FieldRule, RuleError, Source};
pub use schema::{schema_of, Record, Schema};
