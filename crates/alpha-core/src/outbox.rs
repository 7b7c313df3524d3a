//! Hand-off of decision records to the outbound queue.
//!
//! Only records that pass [`validate_against_schema`] are enqueued; anything
//! else is refused before it reaches the queue.

use alpha_state::DecisionQueue;
use serde_json::Value;

use crate::decision::{validate_against_schema, AlphaDecision};
use crate::domain::error::{GovernanceError, Result};
use crate::obs;

/// Enqueue a locally built decision. Returns `false` when a record with the
/// same id was already queued.
pub async fn publish(queue: &dyn DecisionQueue, decision: &AlphaDecision) -> Result<bool> {
    publish_value(queue, decision.to_value()?).await
}

/// Enqueue a decision record from any source after a schema check.
pub async fn publish_value(queue: &dyn DecisionQueue, record: Value) -> Result<bool> {
    let report = validate_against_schema(&record);
    let decision_id = record
        .get("decision_id")
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string();
    if !report.valid {
        tracing::warn!(
            event = "outbox.refused",
            decision_id = %decision_id,
            errors = ?report.errors,
        );
        return Err(GovernanceError::policy(
            "publish_decision",
            format!("schema check failed: {}", report.errors.join("; ")),
        ));
    }

    let enqueued = queue.enqueue(&decision_id, record).await?;
    obs::emit_outbox_published(&decision_id, enqueued);
    Ok(enqueued)
}
