//! Contract tests for DecisionQueue.
//!
//! Every behaviour is checked against both the in-memory fake and the
//! SurrealDB backend (`mem://`). Any conforming implementation must pass.

use alpha_state::fakes::MemoryDecisionQueue;
use alpha_state::{DecisionQueue, QueueStatus, SurrealDecisionQueue};
use serde_json::json;

fn payload(id: &str) -> serde_json::Value {
    json!({
        "decision_id": id,
        "market": "BTC-100K-DEC",
        "status": "APPROVED",
        "edge_net": 1.2,
    })
}

async fn backends() -> Vec<(&'static str, Box<dyn DecisionQueue>)> {
    vec![
        ("memory", Box::new(MemoryDecisionQueue::new())),
        (
            "surreal",
            Box::new(
                SurrealDecisionQueue::in_memory()
                    .await
                    .expect("in-memory surreal"),
            ),
        ),
    ]
}

// ===========================================================================
// enqueue
// ===========================================================================

#[tokio::test]
async fn enqueue_is_idempotent_on_decision_id() {
    for (name, queue) in backends().await {
        assert!(queue.enqueue("AD-1", payload("AD-1")).await.unwrap(), "{name}");
        assert!(!queue.enqueue("AD-1", json!({"tampered": true})).await.unwrap(), "{name}");

        let pending = queue.fetch_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1, "{name}");
        assert_eq!(pending[0].payload, payload("AD-1"), "{name}: payload must not change");
    }
}

#[tokio::test]
async fn fetch_pending_is_fifo_and_limited() {
    for (name, queue) in backends().await {
        for id in ["AD-a", "AD-b", "AD-c"] {
            queue.enqueue(id, payload(id)).await.unwrap();
        }

        let first_two = queue.fetch_pending(2).await.unwrap();
        let ids: Vec<_> = first_two.iter().map(|d| d.decision_id.as_str()).collect();
        assert_eq!(ids, vec!["AD-a", "AD-b"], "{name}");
        assert!(first_two.iter().all(|d| d.status == QueueStatus::Pending), "{name}");
    }
}

// ===========================================================================
// status transitions
// ===========================================================================

#[tokio::test]
async fn mark_delivered_only_from_pending() {
    for (name, queue) in backends().await {
        queue.enqueue("AD-d", payload("AD-d")).await.unwrap();

        assert!(queue.mark_delivered("AD-d").await.unwrap(), "{name}");
        assert!(!queue.mark_delivered("AD-d").await.unwrap(), "{name}: already delivered");
        assert!(!queue.mark_delivered("AD-missing").await.unwrap(), "{name}");
        assert_eq!(queue.count_pending().await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn failed_decisions_retry_until_budget_spent() {
    for (name, queue) in backends().await {
        queue.enqueue("AD-f", payload("AD-f")).await.unwrap();

        // Default budget is three attempts.
        for attempt in 1..=3 {
            assert!(queue.mark_failed("AD-f", "downstream timeout").await.unwrap(), "{name}");
            let moved = queue.retry_failed().await.unwrap();
            if attempt < 3 {
                assert_eq!(moved, 1, "{name}: attempt {attempt}");
            } else {
                assert_eq!(moved, 0, "{name}: budget exhausted");
            }
        }

        let counts = queue.count_by_status().await.unwrap();
        assert_eq!(counts.get(&QueueStatus::Failed), Some(&1), "{name}");
        assert_eq!(counts.get(&QueueStatus::Pending), None, "{name}");
    }
}

#[tokio::test]
async fn mark_failed_requires_pending() {
    for (name, queue) in backends().await {
        queue.enqueue("AD-g", payload("AD-g")).await.unwrap();
        queue.mark_delivered("AD-g").await.unwrap();

        assert!(!queue.mark_failed("AD-g", "late").await.unwrap(), "{name}");
    }
}

// ===========================================================================
// counters
// ===========================================================================

#[tokio::test]
async fn count_by_status_groups_rows() {
    for (name, queue) in backends().await {
        for id in ["AD-1", "AD-2", "AD-3"] {
            queue.enqueue(id, payload(id)).await.unwrap();
        }
        queue.mark_delivered("AD-1").await.unwrap();
        queue.mark_failed("AD-2", "rejected by broker").await.unwrap();

        let counts = queue.count_by_status().await.unwrap();
        assert_eq!(counts.get(&QueueStatus::Pending), Some(&1), "{name}");
        assert_eq!(counts.get(&QueueStatus::Delivered), Some(&1), "{name}");
        assert_eq!(counts.get(&QueueStatus::Failed), Some(&1), "{name}");
        assert_eq!(queue.count_pending().await.unwrap(), 1, "{name}");
    }
}

#[tokio::test]
async fn memory_queue_records_last_error() {
    let queue = MemoryDecisionQueue::with_max_retries(1);
    queue.enqueue("AD-e", payload("AD-e")).await.unwrap();
    queue.mark_failed("AD-e", "broker offline").await.unwrap();

    let row = queue.get("AD-e").expect("row exists");
    assert_eq!(row.retry_count, 1);
    assert_eq!(row.last_error.as_deref(), Some("broker offline"));
    assert_eq!(queue.retry_failed().await.unwrap(), 0);
}
