pub mod agent;
pub mod digest;
pub mod error;
pub mod rules;
pub mod signal;

pub use agent::{
    Agent, AgentId, AgentMode, AgentRole, AgentStatus, DecisionEntry, DecisionFlags,
    ExclusionOutcome, WarningOutcome, WarningRecord,
};
pub use error::{Governed, GovernanceError, LifecycleError, Result};
pub use rules::{rule, rulebook, GoldenRule, APPROVAL_RATE_RULE, RULE_RANGE};
pub use signal::{Signal, SignalStatus, SignalType, ValidationResult, REQUIRED_FIELDS};
