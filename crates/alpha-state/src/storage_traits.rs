//! Storage trait definitions for the decision queue
//!
//! `DecisionQueue` is the only persistence contract the governance core
//! depends on. It is async and backend-agnostic; an in-memory fake lives in
//! the `fakes` module.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;

/// Result type for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

// ---------------------------------------------------------------------------
// QueueStatus
// ---------------------------------------------------------------------------

/// Delivery state of a queued decision.
///
/// Transitions: `Pending -> Delivered`, `Pending -> Failed`,
/// `Failed -> Pending` (retry, bounded by `max_retries`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Pending,
    Delivered,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "PENDING",
            QueueStatus::Delivered => "DELIVERED",
            QueueStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(QueueStatus::Pending),
            "DELIVERED" => Ok(QueueStatus::Delivered),
            "FAILED" => Ok(QueueStatus::Failed),
            other => Err(QueueError::UnknownStatus {
                status: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// QueuedDecision
// ---------------------------------------------------------------------------

/// A decision as held by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedDecision {
    /// Unique decision identifier (`AD-...`)
    pub decision_id: String,
    /// Immutable JSON payload, exactly as enqueued
    pub payload: serde_json::Value,
    pub status: QueueStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// Reason given by the most recent failed delivery
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// DecisionQueue
// ---------------------------------------------------------------------------

/// Durable FIFO of outbound decisions.
///
/// Guarantees:
/// - `enqueue` is idempotent on `decision_id`; a second enqueue of the same id
///   returns `false` and leaves the stored payload untouched.
/// - `fetch_pending` returns pending decisions in enqueue order.
/// - Status updates only apply from the documented source state and report
///   whether a row actually changed.
#[async_trait]
pub trait DecisionQueue: Send + Sync {
    /// Store a decision payload. Returns `true` when a new row was created.
    async fn enqueue(&self, decision_id: &str, payload: serde_json::Value) -> QueueResult<bool>;

    /// Up to `limit` pending decisions, oldest first.
    async fn fetch_pending(&self, limit: usize) -> QueueResult<Vec<QueuedDecision>>;

    /// `Pending -> Delivered`. Returns `false` if the decision was not pending.
    async fn mark_delivered(&self, decision_id: &str) -> QueueResult<bool>;

    /// `Pending -> Failed`, incrementing the retry counter.
    async fn mark_failed(&self, decision_id: &str, error: &str) -> QueueResult<bool>;

    /// Move failed decisions with retries left back to pending. Returns how many moved.
    async fn retry_failed(&self) -> QueueResult<usize>;

    /// Number of pending decisions.
    async fn count_pending(&self) -> QueueResult<usize>;

    /// Row counts keyed by status. Statuses with no rows are omitted.
    async fn count_by_status(&self) -> QueueResult<BTreeMap<QueueStatus, usize>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [QueueStatus::Pending, QueueStatus::Delivered, QueueStatus::Failed] {
            assert_eq!(status.as_str().parse::<QueueStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "ARCHIVED".parse::<QueueStatus>().unwrap_err();
        assert!(matches!(err, QueueError::UnknownStatus { .. }));
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&QueueStatus::Delivered).unwrap();
        assert_eq!(json, "\"DELIVERED\"");
    }
}
