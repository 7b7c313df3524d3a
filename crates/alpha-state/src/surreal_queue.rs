//! SurrealDB-backed DecisionQueue implementation
//!
//! Uses `schema::DecisionRow` for persistence, converting to
//! `storage_traits::QueuedDecision` at the boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::QueueError;
use crate::migrations;
use crate::schema::DecisionRow;
use crate::storage_traits::{DecisionQueue, QueueResult, QueueStatus, QueuedDecision};
use crate::DEFAULT_MAX_RETRIES;

const NAMESPACE: &str = "alpha";
const DATABASE: &str = "governance";
const LOCAL_PATH: &str = ".alpha/queue";

#[derive(Debug, Deserialize)]
struct CountRow {
    n: u64,
}

#[derive(Debug, Deserialize)]
struct StatusCountRow {
    status: String,
    n: u64,
}

#[derive(Debug, Deserialize)]
struct SeqRow {
    seq: u64,
}

/// SurrealDB-backed implementation of [`DecisionQueue`].
pub struct SurrealDecisionQueue {
    db: Surreal<Any>,
    max_retries: u32,
    // Serializes seq allocation so FIFO order survives concurrent enqueues.
    enqueue_lock: Mutex<()>,
}

impl SurrealDecisionQueue {
    /// Create an in-memory instance for testing.
    ///
    /// Connects to `mem://`, selects `alpha/governance`, and runs `init_schema`.
    pub async fn in_memory() -> QueueResult<Self> {
        let queue = Self::connect("mem://").await?;
        info!("SurrealDecisionQueue connected (in-memory)");
        Ok(queue)
    }

    /// Create from environment variables.
    ///
    /// `SURREALDB_URL` wins when set; otherwise a local `surrealkv` store is
    /// created under `.alpha/queue`.
    pub async fn from_env() -> QueueResult<Self> {
        if let Ok(url) = std::env::var("SURREALDB_URL") {
            let queue = Self::connect(&url).await?;
            info!("SurrealDecisionQueue connected ({})", url);
            return Ok(queue);
        }

        std::fs::create_dir_all(LOCAL_PATH).map_err(|e| {
            QueueError::Connection(format!(
                "Failed to create queue directory {}: {}",
                LOCAL_PATH, e
            ))
        })?;
        let url = format!("surrealkv://{}", LOCAL_PATH);
        info!("No SURREALDB_URL found, using local persistence: {}", url);
        Self::connect(&url).await
    }

    /// Connect to an explicit endpoint (`mem://`, `surrealkv://path`, `ws://host`).
    pub async fn connect(url: &str) -> QueueResult<Self> {
        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| QueueError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;
        Ok(Self {
            db,
            max_retries: DEFAULT_MAX_RETRIES,
            enqueue_lock: Mutex::new(()),
        })
    }

    /// Override the retry budget applied to newly enqueued decisions.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    // -- private helpers -----------------------------------------------------

    async fn exists(&self, decision_id: &str) -> QueueResult<bool> {
        let mut res = self
            .db
            .query("SELECT count() AS n FROM decisions WHERE decision_id = $did GROUP ALL")
            .bind(("did", decision_id.to_string()))
            .await?;
        let rows: Vec<CountRow> = res.take(0)?;
        Ok(rows.first().map(|r| r.n).unwrap_or(0) > 0)
    }

    async fn next_seq(&self) -> QueueResult<u64> {
        let mut res = self
            .db
            .query("SELECT seq FROM decisions ORDER BY seq DESC LIMIT 1")
            .await?;
        let rows: Vec<SeqRow> = res.take(0)?;
        Ok(rows.first().map(|r| r.seq + 1).unwrap_or(1))
    }

    /// Run an `UPDATE ... RETURN AFTER` statement and report how many rows changed.
    async fn update_count(
        &self,
        sql: &'static str,
        decision_id: Option<&str>,
        error: Option<&str>,
    ) -> QueueResult<usize> {
        let mut query = self.db.query(sql);
        if let Some(did) = decision_id {
            query = query.bind(("did", did.to_string()));
        }
        if let Some(err) = error {
            query = query.bind(("err", err.to_string()));
        }
        let mut res = query.await?;
        let rows: Vec<DecisionRow> = res.take(0)?;
        Ok(rows.len())
    }
}

#[async_trait]
impl DecisionQueue for SurrealDecisionQueue {
    async fn enqueue(&self, decision_id: &str, payload: serde_json::Value) -> QueueResult<bool> {
        let _guard = self.enqueue_lock.lock().await;

        if self.exists(decision_id).await? {
            debug!(decision_id = %decision_id, "decision already queued");
            return Ok(false);
        }

        let seq = self.next_seq().await?;
        let row = DecisionRow::new(decision_id.to_string(), seq, payload, self.max_retries);

        let _created: Option<DecisionRow> = self.db.create("decisions").content(row).await?;
        debug!(decision_id = %decision_id, seq = seq, "decision enqueued");
        Ok(true)
    }

    async fn fetch_pending(&self, limit: usize) -> QueueResult<Vec<QueuedDecision>> {
        let mut res = self
            .db
            .query("SELECT * FROM decisions WHERE status = 'PENDING' ORDER BY seq ASC LIMIT $limit")
            .bind(("limit", limit as u64))
            .await?;
        let rows: Vec<DecisionRow> = res.take(0)?;
        rows.into_iter().map(DecisionRow::into_queued).collect()
    }

    async fn mark_delivered(&self, decision_id: &str) -> QueueResult<bool> {
        let changed = self
            .update_count(
                "UPDATE decisions SET status = 'DELIVERED', delivered_at = time::now() \
                 WHERE decision_id = $did AND status = 'PENDING' RETURN AFTER",
                Some(decision_id),
                None,
            )
            .await?;
        Ok(changed > 0)
    }

    async fn mark_failed(&self, decision_id: &str, error: &str) -> QueueResult<bool> {
        let changed = self
            .update_count(
                "UPDATE decisions SET status = 'FAILED', retry_count += 1, last_error = $err \
                 WHERE decision_id = $did AND status = 'PENDING' RETURN AFTER",
                Some(decision_id),
                Some(error),
            )
            .await?;
        Ok(changed > 0)
    }

    async fn retry_failed(&self) -> QueueResult<usize> {
        self.update_count(
            "UPDATE decisions SET status = 'PENDING' \
             WHERE status = 'FAILED' AND retry_count < max_retries RETURN AFTER",
            None,
            None,
        )
        .await
    }

    async fn count_pending(&self) -> QueueResult<usize> {
        let mut res = self
            .db
            .query("SELECT count() AS n FROM decisions WHERE status = 'PENDING' GROUP ALL")
            .await?;
        let rows: Vec<CountRow> = res.take(0)?;
        Ok(rows.first().map(|r| r.n as usize).unwrap_or(0))
    }

    async fn count_by_status(&self) -> QueueResult<BTreeMap<QueueStatus, usize>> {
        let mut res = self
            .db
            .query("SELECT status, count() AS n FROM decisions GROUP BY status")
            .await?;
        let rows: Vec<StatusCountRow> = res.take(0)?;
        let mut counts = BTreeMap::new();
        for row in rows {
            counts.insert(row.status.parse::<QueueStatus>()?, row.n as usize);
        }
        Ok(counts)
    }
}
