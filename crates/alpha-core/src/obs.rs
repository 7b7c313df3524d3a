//! Structured governance events.
//!
//! Every event carries a stable `event = "..."` field so log pipelines can
//! key on it. Denials and integrity failures are logged above `info`.

use tracing::{error, info, warn};

/// RAII guard that tags everything logged during a per-agent call with the
/// agent id.
pub struct AgentSpan {
    _span: tracing::span::EnteredSpan,
}

impl AgentSpan {
    pub fn enter(agent_id: &str) -> Self {
        let span = tracing::info_span!("alpha.agent", agent_id = %agent_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_ledger_appended(sequence: u64, action: &str, result: &str) {
    tracing::debug!(event = "ledger.appended", sequence = sequence, action = %action, result = %result);
}

pub fn emit_ledger_verified(valid: bool, entry_count: u64, first_invalid: Option<u64>) {
    if valid {
        info!(event = "ledger.verified", valid = true, entry_count = entry_count);
    } else {
        error!(
            event = "ledger.verified",
            valid = false,
            entry_count = entry_count,
            first_invalid = ?first_invalid,
        );
    }
}

pub fn emit_gate_denied(action: &str, actor: &str, reason: &str) {
    warn!(event = "gate.denied", action = %action, actor = %actor, reason = %reason);
}

pub fn emit_gate_deviation(action: &str, actor: &str, flags: &[String]) {
    warn!(event = "gate.deviation", action = %action, actor = %actor, flags = ?flags);
}

pub fn emit_signal_validated(signal_id: &str, valid: bool, error_count: usize, status: &str) {
    info!(
        event = "signal.validated",
        signal_id = %signal_id,
        valid = valid,
        error_count = error_count,
        status = %status,
    );
}

/// Emitted once, when the approval rate first crosses the ceiling.
pub fn emit_governor_blocked(approved: u64, submitted: u64, approval_pct: f64) {
    warn!(
        event = "governor.blocked",
        approved = approved,
        submitted = submitted,
        approval_pct = approval_pct,
    );
}

pub fn emit_governor_unblocked(reviewer: &str) {
    info!(event = "governor.unblocked", reviewer = %reviewer);
}

pub fn emit_decision_built(decision_id: &str, status: &str, rules_failed: &[u8]) {
    info!(
        event = "decision.built",
        decision_id = %decision_id,
        status = %status,
        rules_failed = ?rules_failed,
    );
}

pub fn emit_interview_answered(question_id: &str, score: u32, passed: bool, eliminated: bool) {
    info!(
        event = "interview.answered",
        question_id = %question_id,
        score = score,
        passed = passed,
        eliminated = eliminated,
    );
}

pub fn emit_agent_warned(agent_id: &str, count: u32, reason: &str) {
    warn!(event = "agent.warned", agent_id = %agent_id, count = count, reason = %reason);
}

pub fn emit_agent_excluded(agent_id: &str, reason: &str) {
    warn!(event = "agent.excluded", agent_id = %agent_id, reason = %reason);
}

pub fn emit_outbox_published(decision_id: &str, enqueued: bool) {
    info!(event = "outbox.published", decision_id = %decision_id, enqueued = enqueued);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_span_enters() {
        let _span = AgentSpan::enter("a1b2c3d4");
        emit_agent_warned("a1b2c3d4", 1, "late report");
    }
}
