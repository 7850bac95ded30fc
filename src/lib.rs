//! Declarative HTML extraction pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!     WorkItem ──▶ runner ──▶ dispatch::Dispatcher ──▶ backend (HTTP, cached GET)
//!                                  │                        │
//!                                  │                        ▼
//!                                  │                   cache (SQLite, TTL)
//!                                  ▼
//!                     handlers(d, ctx, node) ──▶ decode (tagged records)
//!                                  │                   │
//!                                  │                   ▼
//!                                  │              parsers (named text → Value)
//!                                  ▼
//!                    nested dispatch / invoke(stage)
//!
//!     Cross-cutting: config (TOML), observability (tracing + metrics)
//! ```

// Document model and extraction
pub mod dom;
pub mod parsers;
pub mod decode;

// Pipeline
pub mod backend;
pub mod cache;
pub mod dispatch;
pub mod runner;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::PipelineConfig;
pub use decode::{decode, decode_document, decode_str, DecodeConfig, DecodeError, Record, Schema};
pub use dispatch::{Cancellation, Ctx, DispatchError, Dispatcher};
pub use dom::{Document, Selection};
pub use runner::{Runner, WorkItem};
