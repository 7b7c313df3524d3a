//! Error taxonomy for the governance core.
//!
//! Two layers:
//! - [`GovernanceError`] is fatal to the call that raised it (policy
//!   violations, ledger integrity failures, I/O).
//! - [`LifecycleError`] is an expected control-flow outcome (unknown agent,
//!   agent not active, interview closed) and travels as data inside
//!   [`Governed`].

use crate::domain::agent::{AgentId, AgentStatus};

/// Fatal governance errors.
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    #[error("policy violation on '{action}': {reason}")]
    PolicyViolation { action: String, reason: String },

    #[error("ledger integrity failure at sequence {sequence}: {reason}")]
    Integrity { sequence: u64, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decision queue error: {0}")]
    Queue(#[from] alpha_state::QueueError),
}

impl GovernanceError {
    pub fn policy(action: impl Into<String>, reason: impl Into<String>) -> Self {
        GovernanceError::PolicyViolation {
            action: action.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that must stop the process from approving anything further.
    pub fn is_integrity(&self) -> bool {
        matches!(self, GovernanceError::Integrity { .. })
    }
}

/// Result type for governance operations.
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Recoverable lifecycle outcomes reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("agent {agent_id} is not active (status: {status})")]
    AgentNotActive {
        agent_id: AgentId,
        status: AgentStatus,
    },

    #[error("agent {0} is excluded")]
    AgentExcluded(AgentId),

    #[error("agent {agent_id} is not a candidate (status: {status})")]
    NotACandidate {
        agent_id: AgentId,
        status: AgentStatus,
    },

    #[error("agent {0} has not passed the interview")]
    InterviewNotPassed(AgentId),

    #[error("no active interview for agent {0}")]
    NoActiveInterview(AgentId),

    #[error("interview for agent {0} is already closed")]
    InterviewClosed(AgentId),

    #[error("unknown role '{0}'")]
    InvalidRole(String),
}

/// Outcome of a governed call that passed the gate: either the value or a
/// lifecycle refusal.
pub type Governed<T> = std::result::Result<T, LifecycleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_violation_names_action() {
        let err = GovernanceError::policy("approve_signal", "forbidden in restricted mode");
        let msg = err.to_string();
        assert!(msg.contains("approve_signal"));
        assert!(msg.contains("restricted"));
        assert!(!err.is_integrity());
    }

    #[test]
    fn integrity_error_is_flagged() {
        let err = GovernanceError::Integrity {
            sequence: 4,
            reason: "hash mismatch".to_string(),
        };
        assert!(err.is_integrity());
        assert!(err.to_string().contains("sequence 4"));
    }

    #[test]
    fn lifecycle_error_display() {
        let id = AgentId::from("a1b2c3d4");
        let err = LifecycleError::AgentNotActive {
            agent_id: id.clone(),
            status: AgentStatus::Candidate,
        };
        assert_eq!(err.to_string(), "agent a1b2c3d4 is not active (status: candidate)");
        assert_eq!(
            LifecycleError::AgentExcluded(id).to_string(),
            "agent a1b2c3d4 is excluded"
        );
    }
}
