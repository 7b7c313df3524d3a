//! Alpha Core Library
//!
//! Decision governance for a trading research desk: a hash-chained audit
//! ledger with a mandatory authorization gate, the golden-rule signal
//! validator, the approval-rate circuit breaker, candidate vetting and the
//! canonical decision record handed to downstream execution.

pub mod config;
pub mod decision;
pub mod domain;
pub mod governor;
pub mod language;
pub mod ledger;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod outbox;
pub mod telemetry;
pub mod validator;
pub mod vetting;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::GovernanceConfig;

pub use domain::{
    rule, rulebook, Agent, AgentId, AgentMode, AgentRole, AgentStatus, DecisionEntry,
    DecisionFlags, ExclusionOutcome, GoldenRule, Governed, GovernanceError, LifecycleError,
    Result, Signal, SignalStatus, SignalType, ValidationResult, WarningOutcome, APPROVAL_RATE_RULE,
    REQUIRED_FIELDS, RULE_RANGE,
};

pub use decision::{
    validate_against_schema, AlphaDecision, ConfidenceLevel, DecisionCanonicalizer,
    DecisionConstraints, SchemaReport, Urgency, SCHEMA_VERSION,
};
pub use governor::{ApprovalGovernor, KpiSnapshot, UnblockOutcome};
pub use language::{
    check_language, FoldingMatcher, ForbiddenPhrase, LanguageReport, LiteralMatcher,
    PhraseCatalog, Severity, TextMatcher,
};
pub use ledger::{
    AccessMode, AuditEntry, AuditLedger, GovernedAction, IntegrityReport, JsonlSink, LedgerSink,
    MemorySink,
};
pub use orchestrator::{
    AgentAuditReport, AgentReview, CallContext, CandidateEvaluation, GovernanceOrchestrator,
    InterviewProgress, InterviewStarted, Recommendation, SubmissionReport,
};
pub use telemetry::init_tracing;
pub use validator::RuleValidator;
pub use vetting::{
    mandatory_questions, InterviewEvaluator, InterviewSession, InterviewVerdict, Question,
    QuestionResult,
};
