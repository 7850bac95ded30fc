//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, spans per dispatch/fetch/item)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields, never pre-formatted strings
//! - Runner items carry a run id through every nested span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
