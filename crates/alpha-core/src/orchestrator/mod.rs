//! The governance orchestrator.
//!
//! Every mutating method starts with [`gate`]: ledger authorization under
//! the current access mode, then the deviation scan of the call context.
//! Nothing past that line runs unless both succeed.
//!
//! Work on one agent happens under that agent's slot lock, so interview
//! answers and signal submissions for the same agent never interleave.
//! The roster is persisted only after the slot lock is released.

pub mod gate;
pub mod registry;
pub mod review;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

pub use gate::{gate, Authorized, CallContext, DEFAULT_ACTOR, DEVIATION_FLAGS};
pub use registry::{AgentRegistry, AgentSlot, SlotHandle};
pub use review::{audit_decision, review_agent, AgentReview, DecisionAudit, Recommendation};

use crate::config::GovernanceConfig;
use crate::decision::{AlphaDecision, DecisionCanonicalizer};
use crate::domain::error::{GovernanceError, Governed, LifecycleError, Result};
use crate::domain::{
    Agent, AgentId, AgentMode, AgentRole, AgentStatus, DecisionEntry, ExclusionOutcome, Signal,
    SignalStatus, ValidationResult, WarningOutcome,
};
use crate::governor::{ApprovalGovernor, KpiSnapshot, UnblockOutcome};
use crate::ledger::{AccessMode, AuditEntry, AuditLedger, GovernedAction, IntegrityReport};
use crate::metrics::METRICS;
use crate::obs::{self, AgentSpan};
use crate::validator::RuleValidator;
use crate::vetting::{
    AnswerOutcome, InterviewSession, InterviewVerdict, Question, QuestionResult,
};

/// Appended to the errors of an approval refused by the circuit breaker.
pub const BREAKER_REJECTION: &str = "rule 6: approval rate circuit breaker engaged; manual review required";

const SYSTEM_ACTOR: &str = "system";

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewStarted {
    pub agent_id: AgentId,
    pub question: Question,
    pub questions_remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewProgress {
    NextQuestion {
        result: QuestionResult,
        question: Question,
        questions_remaining: usize,
    },
    Eliminated {
        result: QuestionResult,
    },
    Complete {
        result: QuestionResult,
        verdict: InterviewVerdict,
        recruited: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateEvaluation {
    pub agent_id: AgentId,
    pub verdict: InterviewVerdict,
    pub results: Vec<QuestionResult>,
    pub recruited: bool,
}

/// Everything a caller learns from one signal submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub validation: ValidationResult,
    pub clarity_score: u32,
    /// Breaker state after this submission was recorded.
    pub governor_blocked: bool,
    /// This submission pushed the approval rate over the ceiling.
    pub block_tripped: bool,
    pub decision: AlphaDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAuditReport {
    pub review: AgentReview,
    pub warning: Option<WarningOutcome>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct GovernanceOrchestrator {
    config: GovernanceConfig,
    ledger: Arc<AuditLedger>,
    validator: RuleValidator,
    governor: ApprovalGovernor,
    canonicalizer: DecisionCanonicalizer,
    registry: AgentRegistry,
    restricted: AtomicBool,
    roster_path: Option<PathBuf>,
}

impl GovernanceOrchestrator {
    /// Build from configuration: ledger and roster are opened from their
    /// configured paths, or kept in memory.
    pub fn new(config: GovernanceConfig) -> Result<Self> {
        config.validate()?;
        let ledger = Arc::new(AuditLedger::from_config(&config)?);
        let registry = match &config.roster_path {
            Some(path) => AgentRegistry::load_from(path)?,
            None => AgentRegistry::new(),
        };
        Ok(Self::assemble(config, ledger, registry))
    }

    /// Use an existing ledger, with an empty in-memory roster.
    pub fn with_ledger(config: GovernanceConfig, ledger: Arc<AuditLedger>) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, ledger, AgentRegistry::new()))
    }

    /// Defaults throughout, in memory.
    pub fn in_memory() -> Result<Self> {
        Self::with_ledger(GovernanceConfig::default(), Arc::new(AuditLedger::in_memory()?))
    }

    fn assemble(config: GovernanceConfig, ledger: Arc<AuditLedger>, registry: AgentRegistry) -> Self {
        Self {
            validator: RuleValidator::new(config.clone()),
            governor: ApprovalGovernor::new(&config),
            canonicalizer: DecisionCanonicalizer,
            roster_path: config.roster_path.clone(),
            restricted: AtomicBool::new(false),
            config,
            ledger,
            registry,
        }
    }

    /// Configuration this orchestrator was built with.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// The shared audit ledger.
    pub fn ledger(&self) -> &Arc<AuditLedger> {
        &self.ledger
    }

    /// KPI counters and the approval-rate breaker.
    pub fn governor(&self) -> &ApprovalGovernor {
        &self.governor
    }

    /// Rulebook validator applied to every submission.
    pub fn validator(&self) -> &RuleValidator {
        &self.validator
    }

    /// Agent roster.
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Whether restricted (read-only) mode is on.
    pub fn is_restricted(&self) -> bool {
        self.restricted.load(Ordering::SeqCst)
    }

    /// Access mode passed to every authorization.
    pub fn access_mode(&self) -> AccessMode {
        if self.is_restricted() {
            AccessMode::Restricted
        } else {
            AccessMode::Standard
        }
    }

    fn gate(&self, action: GovernedAction, ctx: &CallContext) -> Result<Authorized> {
        gate(&self.ledger, action, ctx, self.access_mode())
    }

    fn slot(&self, agent_id: &AgentId) -> Governed<SlotHandle> {
        self.registry
            .get(agent_id)
            .ok_or_else(|| LifecycleError::AgentNotFound(agent_id.clone()))
    }

    fn persist_roster(&self) -> Result<()> {
        match &self.roster_path {
            Some(path) => self.registry.save_to(path),
            None => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Recruitment
    // -----------------------------------------------------------------------

    /// Register a candidate and open an interview.
    pub fn start_interview(
        &self,
        name: &str,
        role: AgentRole,
        mode: AgentMode,
        ctx: &CallContext,
    ) -> Result<InterviewStarted> {
        let auth = self.gate(GovernedAction::RecruitAgent, ctx)?;

        let agent = Agent::candidate(name, role, mode);
        let agent_id = self.registry.insert(agent);
        let session = InterviewSession::start(agent_id.clone(), mode, &self.config);
        let question = session
            .current_question()
            .cloned()
            .ok_or_else(|| GovernanceError::Config("interview has no questions".into()))?;
        let questions_remaining = session.questions_remaining();

        if let Some(handle) = self.registry.get(&agent_id) {
            handle.lock().interview = Some(session);
        }
        self.ledger.log(
            "start_interview",
            auth.actor(),
            json!({"agent_id": agent_id, "name": name, "role": role, "mode": mode}),
            "STARTED",
        )?;
        info!(event = "interview.started", agent_id = %agent_id, role = %role, mode = %mode);
        self.persist_roster()?;

        Ok(InterviewStarted {
            agent_id,
            question,
            questions_remaining,
        })
    }

    /// Answer the current question of a running interview.
    pub fn answer_interview(
        &self,
        agent_id: &AgentId,
        answer: &str,
        ctx: &CallContext,
    ) -> Result<Governed<InterviewProgress>> {
        self.gate(GovernedAction::RecruitAgent, ctx)?;
        let handle = match self.slot(agent_id) {
            Ok(h) => h,
            Err(e) => return Ok(Err(e)),
        };

        let progress = {
            let mut guard = handle.lock();
            let slot = &mut *guard;
            let _span = AgentSpan::enter(agent_id.as_str());

            let Some(session) = slot.interview.as_mut() else {
                return Ok(Err(LifecycleError::NoActiveInterview(agent_id.clone())));
            };
            let report = match session.submit_answer(answer) {
                Ok(r) => r,
                Err(e) => return Ok(Err(e)),
            };
            self.note_language(&mut slot.agent, answer)?;

            match report.outcome {
                AnswerOutcome::NextQuestion => {
                    let remaining = session.questions_remaining();
                    match report.next_question {
                        Some(question) => InterviewProgress::NextQuestion {
                            result: report.result,
                            question,
                            questions_remaining: remaining,
                        },
                        None => return Ok(Err(LifecycleError::InterviewClosed(agent_id.clone()))),
                    }
                }
                AnswerOutcome::Eliminated => {
                    slot.interview = None;
                    slot.agent.record_interview(false, 0.0);
                    self.ledger.log(
                        "interview_elimination",
                        agent_id.as_str(),
                        json!({"question_id": report.result.question_id, "reasons": report.result.reasons}),
                        "ELIMINATED",
                    )?;
                    InterviewProgress::Eliminated {
                        result: report.result,
                    }
                }
                AnswerOutcome::Complete => {
                    let verdict = session.verdict();
                    slot.interview = None;
                    let recruited = self.conclude_interview(&mut slot.agent, &verdict)?;
                    InterviewProgress::Complete {
                        result: report.result,
                        verdict,
                        recruited,
                    }
                }
            }
        };

        self.persist_roster()?;
        Ok(Ok(progress))
    }

    /// Run a complete interview in one call, typically for an automated
    /// candidate. `responses` are positional over the mandatory questions.
    pub fn evaluate_candidate<S: AsRef<str>>(
        &self,
        name: &str,
        role: AgentRole,
        mode: AgentMode,
        responses: &[S],
        ctx: &CallContext,
    ) -> Result<Governed<CandidateEvaluation>> {
        self.gate(GovernedAction::RecruitAgent, ctx)?;
        let agent = Agent::candidate(name, role, mode);
        let session = InterviewSession::start(agent.id().clone(), mode, &self.config);
        self.evaluate_with(agent, session, responses)
    }

    /// Batch interview on an explicit session. The candidate is registered
    /// only once the session has produced a verdict.
    fn evaluate_with<S: AsRef<str>>(
        &self,
        mut agent: Agent,
        mut session: InterviewSession,
        responses: &[S],
    ) -> Result<Governed<CandidateEvaluation>> {
        let _span = AgentSpan::enter(agent.id().as_str());
        let verdict = match session.run_batch(responses) {
            Ok(v) => v,
            Err(e) => return Ok(Err(e)),
        };

        for response in responses {
            self.note_language(&mut agent, response.as_ref())?;
        }
        let recruited = self.conclude_interview(&mut agent, &verdict)?;
        let results = session.results().to_vec();
        let agent_id = self.registry.insert(agent);
        self.persist_roster()?;

        Ok(Ok(CandidateEvaluation {
            agent_id,
            verdict,
            results,
            recruited,
        }))
    }

    /// Record the verdict, activate on a pass and audit the outcome.
    fn conclude_interview(&self, agent: &mut Agent, verdict: &InterviewVerdict) -> Result<bool> {
        agent.record_interview(verdict.passed, verdict.score);
        let recruited = verdict.passed && agent.activate().is_ok();
        self.ledger.log(
            "recruit_agent",
            agent.id().as_str(),
            json!({
                "score": verdict.score,
                "questions_passed": verdict.questions_passed,
                "questions_total": verdict.questions_total,
                "elimination_reason": verdict.elimination_reason,
            }),
            if recruited { "RECRUITED" } else { "REJECTED" },
        )?;
        info!(event = "interview.concluded", agent_id = %agent.id(), recruited = recruited, score = verdict.score);
        Ok(recruited)
    }

    /// Language scan of free text written by `agent`; hits cost verbal
    /// discipline and are audited.
    fn note_language(&self, agent: &mut Agent, text: &str) -> Result<()> {
        let report = crate::language::check_language(text, agent.mode());
        if report.clean {
            return Ok(());
        }
        self.governor.record_verbal_violation(agent.id());
        agent.apply_verbal_penalty(report.penalty());
        let phrases: Vec<&str> = report.hits.iter().map(|h| h.phrase).collect();
        self.ledger.log("check_language", agent.id().as_str(), json!({"phrases": phrases}), "FAILED")
    }

    // -----------------------------------------------------------------------
    // Signals
    // -----------------------------------------------------------------------

    /// Validate a signal from an active agent and build its decision record.
    pub fn submit_signal(
        &self,
        agent_id: &AgentId,
        signal: Signal,
        ctx: &CallContext,
    ) -> Result<Governed<SubmissionReport>> {
        self.gate(GovernedAction::SubmitSignal, ctx)?;
        let handle = match self.slot(agent_id) {
            Ok(h) => h,
            Err(e) => return Ok(Err(e)),
        };

        let report = {
            let mut slot = handle.lock();
            let _span = AgentSpan::enter(agent_id.as_str());
            if let Err(e) = slot.agent.ensure_active() {
                return Ok(Err(e));
            }
            let mode = slot.agent.mode();
            let signal_id = signal.signal_id();

            let mut validation = self.validator.validate_as(&signal, mode);

            let hits = self.validator.language_hits(&signal, mode);
            if !hits.is_empty() {
                self.governor.record_verbal_violation(agent_id);
                slot.agent
                    .apply_verbal_penalty(hits.iter().map(|h| h.severity.penalty()).sum());
                let phrases: Vec<&str> = hits.iter().map(|h| h.phrase).collect();
                self.ledger.log(
                    "check_language",
                    agent_id.as_str(),
                    json!({"signal_id": signal_id, "phrases": phrases}),
                    "FAILED",
                )?;
            }

            let blocked_before = self.governor.is_blocked();
            if validation.valid && validation.resolved_status == SignalStatus::Approved {
                if blocked_before {
                    validation.valid = false;
                    validation.resolved_status = SignalStatus::Rejected;
                    validation.errors.push(BREAKER_REJECTION.to_string());
                    self.ledger.log(
                        GovernedAction::ApproveSignal.as_str(),
                        SYSTEM_ACTOR,
                        json!({"signal_id": signal_id, "reason": "approval rate circuit breaker engaged"}),
                        "BLOCKED",
                    )?;
                    warn!(event = "signal.approval_blocked", signal_id = %signal_id);
                } else {
                    self.ledger
                        .authorize(GovernedAction::ApproveSignal, &ctx.actor, self.access_mode())?;
                    METRICS.inc_approvals();
                }
            }

            let final_status = if validation.valid {
                validation.resolved_status
            } else {
                SignalStatus::Rejected
            };
            let clarity_score = self.validator.clarity_score(&signal);
            let block_tripped =
                self.governor
                    .record_signal(final_status, clarity_score as f64, &validation.errors);
            self.governor.record_market_analysis(
                final_status == SignalStatus::Rejected,
                validation.errors.first().map(String::as_str),
            );

            slot.agent.log_decision(DecisionEntry::new(
                "submit_signal",
                signal_id.clone(),
                final_status.as_str(),
                signal.text("comment").unwrap_or_default(),
            ));
            self.ledger.log(
                "submit_signal",
                agent_id.as_str(),
                json!({"signal_id": signal_id, "errors": validation.errors}),
                final_status.as_str(),
            )?;

            let decision = self
                .canonicalizer
                .build(&signal, &validation, clarity_score, blocked_before);
            self.ledger.log(
                "alpha_decision_generated",
                agent_id.as_str(),
                json!({"decision_id": decision.decision_id, "rules_failed": decision.rules_failed}),
                decision.status.as_str(),
            )?;

            SubmissionReport {
                validation,
                clarity_score,
                governor_blocked: self.governor.is_blocked(),
                block_tripped,
                decision,
            }
        };

        self.persist_roster()?;
        Ok(Ok(report))
    }

    // -----------------------------------------------------------------------
    // Discipline
    // -----------------------------------------------------------------------

    /// Formal warning; the configured maximum excludes the agent.
    pub fn issue_warning(
        &self,
        agent_id: &AgentId,
        reason: &str,
        ctx: &CallContext,
    ) -> Result<Governed<WarningOutcome>> {
        self.gate(GovernedAction::IssueWarning, ctx)?;
        let handle = match self.slot(agent_id) {
            Ok(h) => h,
            Err(e) => return Ok(Err(e)),
        };
        let outcome = {
            let mut slot = handle.lock();
            let _span = AgentSpan::enter(agent_id.as_str());
            self.warn_agent(&mut slot.agent, reason)?
        };
        self.persist_roster()?;
        Ok(Ok(outcome))
    }

    fn warn_agent(&self, agent: &mut Agent, reason: &str) -> Result<WarningOutcome> {
        let outcome = agent.add_warning(reason, self.config.max_warnings);
        let result = match outcome {
            WarningOutcome::Warned { count, .. } => {
                obs::emit_agent_warned(agent.id().as_str(), count, reason);
                "WARNED"
            }
            WarningOutcome::Excluded { count } => {
                obs::emit_agent_warned(agent.id().as_str(), count, reason);
                obs::emit_agent_excluded(agent.id().as_str(), "warning threshold reached");
                "EXCLUDED"
            }
            WarningOutcome::AlreadyExcluded => "ALREADY_EXCLUDED",
        };
        self.ledger.log(
            "issue_warning",
            agent.id().as_str(),
            json!({"reason": reason, "outcome": outcome}),
            result,
        )?;
        Ok(outcome)
    }

    /// Immediate exclusion, independent of the warning count.
    pub fn exclude_agent(
        &self,
        agent_id: &AgentId,
        reason: &str,
        ctx: &CallContext,
    ) -> Result<Governed<ExclusionOutcome>> {
        self.gate(GovernedAction::ExcludeAgent, ctx)?;
        let handle = match self.slot(agent_id) {
            Ok(h) => h,
            Err(e) => return Ok(Err(e)),
        };
        let outcome = {
            let mut slot = handle.lock();
            let _span = AgentSpan::enter(agent_id.as_str());
            let outcome = slot.agent.exclude();
            let result = match outcome {
                ExclusionOutcome::Excluded => {
                    obs::emit_agent_excluded(agent_id.as_str(), reason);
                    "EXCLUDED"
                }
                ExclusionOutcome::AlreadyExcluded => "ALREADY_EXCLUDED",
            };
            self.ledger
                .log("exclude_agent", agent_id.as_str(), json!({"reason": reason}), result)?;
            outcome
        };
        self.persist_roster()?;
        Ok(Ok(outcome))
    }

    /// Review one agent's decision history; warn when exclusion is
    /// recommended and the agent is still active.
    pub fn audit_agent(&self, agent_id: &AgentId, ctx: &CallContext) -> Result<Governed<AgentAuditReport>> {
        self.gate(GovernedAction::AuditAgent, ctx)?;
        let handle = match self.slot(agent_id) {
            Ok(h) => h,
            Err(e) => return Ok(Err(e)),
        };
        let report = {
            let mut slot = handle.lock();
            let _span = AgentSpan::enter(agent_id.as_str());
            self.review_one(&mut slot.agent)?
        };
        self.persist_roster()?;
        Ok(Ok(report))
    }

    /// Review every active agent.
    pub fn review_all_agents(&self, ctx: &CallContext) -> Result<Vec<AgentAuditReport>> {
        let auth = self.gate(GovernedAction::ReviewAllAgents, ctx)?;
        let mut reports = Vec::new();
        for handle in self.registry.handles() {
            let mut slot = handle.lock();
            if !slot.agent.is_active() {
                continue;
            }
            let _span = AgentSpan::enter(slot.agent.id().as_str());
            reports.push(self.review_one(&mut slot.agent)?);
        }
        let flagged = reports
            .iter()
            .filter(|r| r.review.recommendation == Recommendation::Exclusion)
            .count();
        self.ledger.log(
            "review_all_agents",
            auth.actor(),
            json!({"reviewed": reports.len(), "flagged": flagged}),
            "COMPLETE",
        )?;
        self.persist_roster()?;
        Ok(reports)
    }

    fn review_one(&self, agent: &mut Agent) -> Result<AgentAuditReport> {
        let review = review_agent(agent, &self.config);
        self.ledger.log(
            "review_agent_history",
            agent.id().as_str(),
            json!({
                "total_decisions": review.total_decisions,
                "failed_audits": review.failed_audits,
                "failure_rate": review.failure_rate,
            }),
            match review.recommendation {
                Recommendation::Ok => "OK",
                Recommendation::Exclusion => "EXCLUSION",
            },
        )?;

        let warning = if review.recommendation == Recommendation::Exclusion && agent.is_active() {
            let reason = format!(
                "audit review recommends exclusion: {:.1}% of decisions failed",
                review.failure_rate
            );
            Some(self.warn_agent(agent, &reason)?)
        } else {
            None
        };
        Ok(AgentAuditReport { review, warning })
    }

    // -----------------------------------------------------------------------
    // Modes and breaker
    // -----------------------------------------------------------------------

    /// Switch to read-only operation. Only leaving the mode remains allowed
    /// among mutating actions.
    pub fn enter_restricted_mode(&self, ctx: &CallContext) -> Result<()> {
        let auth = self.gate(GovernedAction::EnterRestrictedMode, ctx)?;
        self.restricted.store(true, Ordering::SeqCst);
        self.ledger
            .log("restricted_mode", auth.actor(), json!({"enabled": true}), "OK")?;
        warn!(event = "mode.restricted", enabled = true, actor = %auth.actor());
        Ok(())
    }

    /// Return to standard operation.
    pub fn exit_restricted_mode(&self, ctx: &CallContext) -> Result<()> {
        let auth = self.gate(GovernedAction::ExitRestrictedMode, ctx)?;
        self.restricted.store(false, Ordering::SeqCst);
        self.ledger
            .log("restricted_mode", auth.actor(), json!({"enabled": false}), "OK")?;
        info!(event = "mode.restricted", enabled = false, actor = %auth.actor());
        Ok(())
    }

    /// Clear the approval-rate block. Reviewer and justification are both
    /// required and both land in the ledger.
    pub fn manual_unblock(&self, reviewer: &str, justification: &str, ctx: &CallContext) -> Result<UnblockOutcome> {
        self.gate(GovernedAction::ManualUnblock, ctx)?;
        match self.governor.manual_unblock(reviewer, justification) {
            Ok(outcome) => {
                let result = match outcome {
                    UnblockOutcome::NotBlocked => "NOT_BLOCKED",
                    UnblockOutcome::Unblocked { .. } => "UNBLOCKED",
                };
                self.ledger.log(
                    "manual_unblock",
                    reviewer,
                    json!({"justification": justification}),
                    result,
                )?;
                Ok(outcome)
            }
            Err(e) => {
                self.ledger.log(
                    "manual_unblock",
                    if reviewer.trim().is_empty() { ctx.actor.as_str() } else { reviewer },
                    json!({"justification": justification, "error": e.to_string()}),
                    "DENIED",
                )?;
                Err(e)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Read-only
    // -----------------------------------------------------------------------

    /// Agents in registration order, optionally filtered by status.
    pub fn list_agents(&self, status: Option<AgentStatus>) -> Vec<Agent> {
        self.registry.list(status)
    }

    /// Snapshot of one agent.
    pub fn agent(&self, agent_id: &AgentId) -> Governed<Agent> {
        self.slot(agent_id).map(|h| h.lock().agent.clone())
    }

    /// Current KPI counters.
    pub fn kpi_snapshot(&self) -> KpiSnapshot {
        self.governor.snapshot()
    }

    /// The last `n` ledger entries, oldest first.
    pub fn view_audit_log(&self, n: usize) -> Result<Vec<AuditEntry>> {
        self.ledger.read_log(n)
    }

    /// Full chain walk. A failure suspends every further authorization.
    pub fn verify_ledger(&self) -> IntegrityReport {
        self.ledger.verify_integrity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> CallContext {
        CallContext::default()
    }

    #[test]
    fn start_interview_registers_candidate() {
        let orch = GovernanceOrchestrator::in_memory().unwrap();
        let started = orch
            .start_interview("Ada", AgentRole::AlphaResearch, AgentMode::Human, &ctx())
            .unwrap();
        assert_eq!(started.question.id, "Q1");
        assert_eq!(started.questions_remaining, 7);

        let agent = orch.agent(&started.agent_id).unwrap();
        assert_eq!(agent.status(), AgentStatus::Candidate);
        assert_eq!(orch.list_agents(Some(AgentStatus::Candidate)).len(), 1);
    }

    #[test]
    fn unknown_agent_is_lifecycle_data() {
        let orch = GovernanceOrchestrator::in_memory().unwrap();
        let missing = AgentId::from("deadbeef");
        let res = orch.submit_signal(&missing, Signal::new(), &ctx()).unwrap();
        assert_eq!(res.unwrap_err(), LifecycleError::AgentNotFound(missing.clone()));
        let res = orch.answer_interview(&missing, "réponse", &ctx()).unwrap();
        assert!(matches!(res, Err(LifecycleError::AgentNotFound(_))));
    }

    #[test]
    fn candidate_cannot_submit() {
        let orch = GovernanceOrchestrator::in_memory().unwrap();
        let id = orch
            .start_interview("Ada", AgentRole::AlphaResearch, AgentMode::Human, &ctx())
            .unwrap()
            .agent_id;
        let res = orch.submit_signal(&id, Signal::new(), &ctx()).unwrap();
        assert!(matches!(res, Err(LifecycleError::AgentNotActive { .. })));
    }

    #[test]
    fn batch_on_a_closed_session_registers_nobody() {
        let orch = GovernanceOrchestrator::in_memory().unwrap();
        let agent = Agent::candidate("bot-1", AgentRole::AlphaResearch, AgentMode::Llm);
        let id = agent.id().clone();
        let session = InterviewSession::with_questions(id.clone(), AgentMode::Llm, orch.config(), Vec::new());
        let entries = orch.ledger().entry_count();

        let res = orch.evaluate_with(agent, session, &["réponse"]).unwrap();
        assert_eq!(res.unwrap_err(), LifecycleError::InterviewClosed(id));
        assert!(orch.list_agents(None).is_empty());
        assert_eq!(orch.ledger().entry_count(), entries);
    }

    #[test]
    fn restricted_mode_forbids_recruitment_until_exit() {
        let orch = GovernanceOrchestrator::in_memory().unwrap();
        orch.enter_restricted_mode(&ctx()).unwrap();
        assert!(orch.is_restricted());

        let err = orch
            .start_interview("Ada", AgentRole::AlphaResearch, AgentMode::Human, &ctx())
            .unwrap_err();
        assert!(matches!(err, GovernanceError::PolicyViolation { .. }));
        assert!(orch.list_agents(None).is_empty());

        orch.exit_restricted_mode(&ctx()).unwrap();
        assert!(orch
            .start_interview("Ada", AgentRole::AlphaResearch, AgentMode::Human, &ctx())
            .is_ok());
    }

    #[test]
    fn manual_unblock_requires_both_fields() {
        let orch = GovernanceOrchestrator::in_memory().unwrap();
        assert!(orch.manual_unblock("", "reviewed", &ctx()).is_err());
        let last = orch.view_audit_log(1).unwrap();
        assert_eq!(last[0].action, "manual_unblock");
        assert_eq!(last[0].result, "DENIED");

        let outcome = orch.manual_unblock("risk-lead", "reviewed", &ctx()).unwrap();
        assert_eq!(outcome, UnblockOutcome::NotBlocked);
    }
}
