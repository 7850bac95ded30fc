//! Tree document subsystem.
//!
//! # Data Flow
//! ```text
//! markup text
//!     → document.rs (parse into an owned Document)
//!     → Selection (borrowed, ordered set of element nodes)
//!     → selector.rs (compiled CSS selectors, cached by source text)
//!     → find / own_text / attr
//! ```
//!
//! # Design Decisions
//! - A Selection may span several documents (stages combine tabs of one page)
//! - Structural queries only descend; the selection's own nodes never match
//! - Documents are single-threaded; borrowed selections never outlive them

pub mod document;
pub mod selector;

pub use document::{Document, Selection};
pub use selector::SelectorError;
