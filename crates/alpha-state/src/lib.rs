//! Alpha-State: persistence for outbound governance decisions
//!
//! Every canonical decision that leaves the governance core is placed on a
//! durable queue before downstream execution systems pick it up. This crate
//! owns that queue and nothing else; the governance logic lives in
//! `alpha-core`.
//!
//! ## Key Components
//!
//! - `DecisionQueue`: async, backend-agnostic queue contract
//! - `MemoryDecisionQueue`: in-process fake for tests and dry runs
//! - `SurrealDecisionQueue`: SurrealDB backend (`mem://`, `surrealkv://`, remote)
//!
//! Payloads are immutable once enqueued. Only the delivery status and retry
//! bookkeeping of a queued decision ever change.

mod error;
pub mod fakes;
mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_queue;

pub use error::QueueError;
pub use schema::DecisionRow;
pub use storage_traits::{DecisionQueue, QueueResult, QueueStatus, QueuedDecision};
pub use surreal_queue::SurrealDecisionQueue;

/// Default number of delivery attempts before a decision stays failed.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
