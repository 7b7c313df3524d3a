//! In-memory fake for the decision queue (tests and dry runs)
//!
//! `MemoryDecisionQueue` satisfies the `DecisionQueue` contract without any
//! external dependency. Rows live in insertion order inside a `Vec`, which
//! gives FIFO for free.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::storage_traits::*;
use crate::DEFAULT_MAX_RETRIES;

/// In-memory decision queue backed by a `Vec<QueuedDecision>`.
#[derive(Debug)]
pub struct MemoryDecisionQueue {
    rows: Mutex<Vec<QueuedDecision>>,
    max_retries: u32,
}

impl Default for MemoryDecisionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDecisionQueue {
    pub fn new() -> Self {
        Self::with_max_retries(DEFAULT_MAX_RETRIES)
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            max_retries,
        }
    }

    /// Look up a queued decision by id, regardless of status.
    pub fn get(&self, decision_id: &str) -> Option<QueuedDecision> {
        self.rows
            .lock()
            .iter()
            .find(|row| row.decision_id == decision_id)
            .cloned()
    }
}

#[async_trait]
impl DecisionQueue for MemoryDecisionQueue {
    async fn enqueue(&self, decision_id: &str, payload: serde_json::Value) -> QueueResult<bool> {
        let mut rows = self.rows.lock();
        if rows.iter().any(|row| row.decision_id == decision_id) {
            return Ok(false);
        }
        rows.push(QueuedDecision {
            decision_id: decision_id.to_string(),
            payload,
            status: QueueStatus::Pending,
            retry_count: 0,
            max_retries: self.max_retries,
            created_at: Utc::now(),
            delivered_at: None,
            last_error: None,
        });
        Ok(true)
    }

    async fn fetch_pending(&self, limit: usize) -> QueueResult<Vec<QueuedDecision>> {
        let rows = self.rows.lock();
        Ok(rows
            .iter()
            .filter(|row| row.status == QueueStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_delivered(&self, decision_id: &str) -> QueueResult<bool> {
        let mut rows = self.rows.lock();
        match rows
            .iter_mut()
            .find(|row| row.decision_id == decision_id && row.status == QueueStatus::Pending)
        {
            Some(row) => {
                row.status = QueueStatus::Delivered;
                row.delivered_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_failed(&self, decision_id: &str, error: &str) -> QueueResult<bool> {
        let mut rows = self.rows.lock();
        match rows
            .iter_mut()
            .find(|row| row.decision_id == decision_id && row.status == QueueStatus::Pending)
        {
            Some(row) => {
                row.status = QueueStatus::Failed;
                row.retry_count += 1;
                row.last_error = Some(error.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn retry_failed(&self) -> QueueResult<usize> {
        let mut rows = self.rows.lock();
        let mut moved = 0;
        for row in rows
            .iter_mut()
            .filter(|row| row.status == QueueStatus::Failed && row.retry_count < row.max_retries)
        {
            row.status = QueueStatus::Pending;
            moved += 1;
        }
        Ok(moved)
    }

    async fn count_pending(&self) -> QueueResult<usize> {
        let rows = self.rows.lock();
        Ok(rows
            .iter()
            .filter(|row| row.status == QueueStatus::Pending)
            .count())
    }

    async fn count_by_status(&self) -> QueueResult<BTreeMap<QueueStatus, usize>> {
        let rows = self.rows.lock();
        let mut counts = BTreeMap::new();
        for row in rows.iter() {
            *counts.entry(row.status).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
