//! SurrealDB schema for the decision queue

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::QueueError;

/// Initialize all queue tables.
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> Result<(), QueueError> {
    info!("Initializing decision queue schema");
    init_decisions_table(db).await?;
    info!("Decision queue schema initialization complete");
    Ok(())
}

/// Initialize the `decisions` table
///
/// Schema:
/// ```text
/// TABLE decisions {
///   decision_id:  STRING (unique)
///   seq:          INT (enqueue order)
///   payload:      OBJECT (immutable)
///   status:       STRING (PENDING | DELIVERED | FAILED)
///   retry_count:  INT
///   max_retries:  INT
///   created_at:   DATETIME
///   delivered_at: DATETIME?
///   last_error:   STRING?
/// }
/// ```
///
/// Rows are never deleted. Payload immutability is enforced by the
/// application: updates only ever touch status and retry bookkeeping.
async fn init_decisions_table(db: &Surreal<Any>) -> Result<(), QueueError> {
    debug!("Initializing decisions table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS decisions AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX IF NOT EXISTS idx_decision_id ON TABLE decisions COLUMNS decision_id UNIQUE;
        DEFINE INDEX IF NOT EXISTS idx_status_seq ON TABLE decisions COLUMNS status, seq;
    "#;

    db.query(sql)
        .await
        .map_err(|e| QueueError::SchemaSetup(e.to_string()))?
        .check()
        .map_err(|e| QueueError::SchemaSetup(e.to_string()))?;
    info!("decisions table initialized");
    Ok(())
}
