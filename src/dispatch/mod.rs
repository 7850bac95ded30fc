//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! get/post/put/delete(url, ctx, body)
//!     → Backend::fetch (aborts on ctx cancellation)
//!     → dispatch(url, ctx, document root)
//!
//! dispatch(id, ctx, node)
//!     → router.rs (first pattern matching the whole id)
//!     → handler(dispatcher, ctx, node)
//!         → decode records, persist through ctx.state
//!         → dispatch(derived id, ctx, sub-node)   (string composition)
//!         → invoke(stage, ctx, sub-node)          (typed composition)
//!     → handler result, unchanged
//! ```
//!
//! # Design Decisions
//! - Registration order decides precedence between overlapping patterns
//! - `Ctx<S>` carries typed state instead of a keyed bag of values
//! - Handler futures are not `Send`: documents are single-threaded
//! - One backend and one cache handle per dispatcher, shared by all stages
//! - Transactions live in `ctx.state`; the caller commits after the chain

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod router;

pub use context::{Cancellation, Ctx};
pub use dispatcher::{Dispatcher, Handler, HandlerFuture};
pub use error::{DispatchError, StageResultExt};
pub use router::{Router, Stage};
