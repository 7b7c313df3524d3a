//! Agents: the humans and automated analysts whose work is governed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{Governed, LifecycleError};

// ---------------------------------------------------------------------------
// Identity and enumerations
// ---------------------------------------------------------------------------

/// Opaque agent identifier (8 lowercase hex characters when generated).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn generate() -> Self {
        let simple = uuid::Uuid::new_v4().simple().to_string();
        AgentId(simple[..8].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        AgentId(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        AgentId(s)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed set of desk roles an agent can be recruited into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    DataEngineer,
    AlphaResearch,
    StrategySelector,
    Portfolio,
    Validation,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::DataEngineer,
        AgentRole::AlphaResearch,
        AgentRole::StrategySelector,
        AgentRole::Portfolio,
        AgentRole::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::DataEngineer => "DataEngineer",
            AgentRole::AlphaResearch => "AlphaResearch",
            AgentRole::StrategySelector => "StrategySelector",
            AgentRole::Portfolio => "Portfolio",
            AgentRole::Validation => "Validation",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = LifecycleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| LifecycleError::InvalidRole(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Candidate,
    Active,
    Excluded,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentStatus::Candidate => "candidate",
            AgentStatus::Active => "active",
            AgentStatus::Excluded => "excluded",
        };
        f.write_str(s)
    }
}

/// Human analyst or automated (LLM) analyst. Automated agents are held to
/// stricter language and vetting rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    #[default]
    Human,
    Llm,
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AgentMode::Human => "human",
            AgentMode::Llm => "llm",
        })
    }
}

// ---------------------------------------------------------------------------
// Decision log
// ---------------------------------------------------------------------------

/// Rule-compliance facts attached to a logged decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionFlags {
    /// The agent tried to execute a trade itself.
    #[serde(default)]
    pub executes_trade: bool,
    /// A merely tradable market was presented as a signal.
    #[serde(default)]
    pub tradable_as_signal: bool,
    /// Raw edge was used instead of net edge.
    #[serde(default)]
    pub raw_edge: bool,
    /// The decision was formalised in writing.
    #[serde(default = "default_true")]
    pub written: bool,
    #[serde(default)]
    pub forced_trade: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DecisionFlags {
    fn default() -> Self {
        Self {
            executes_trade: false,
            tradable_as_signal: false,
            raw_edge: false,
            written: true,
            forced_trade: false,
        }
    }
}

/// One entry of an agent's append-only decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEntry {
    pub action: String,
    /// What the decision was about, usually a signal id.
    pub subject: String,
    pub result: String,
    pub justification: String,
    pub agent_mode: AgentMode,
    #[serde(default)]
    pub flags: DecisionFlags,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionEntry {
    pub fn new(
        action: impl Into<String>,
        subject: impl Into<String>,
        result: impl Into<String>,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            subject: subject.into(),
            result: result.into(),
            justification: justification.into(),
            agent_mode: AgentMode::Human,
            flags: DecisionFlags::default(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_flags(mut self, flags: DecisionFlags) -> Self {
        self.flags = flags;
        self
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningRecord {
    pub reason: String,
    pub issued_at: DateTime<Utc>,
}

/// Result of [`Agent::add_warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WarningOutcome {
    /// Warning recorded; the agent is still in place.
    Warned { count: u32, max: u32 },
    /// This warning reached the threshold; the agent is now excluded.
    Excluded { count: u32 },
    /// The agent was already excluded; nothing changed.
    AlreadyExcluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionOutcome {
    Excluded,
    AlreadyExcluded,
}

/// A governed analyst.
///
/// Once excluded, an agent can no longer be warned, activated or submit
/// signals. The decision log only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    id: AgentId,
    name: String,
    role: AgentRole,
    mode: AgentMode,
    status: AgentStatus,
    warnings: Vec<WarningRecord>,
    interview_passed: bool,
    interview_score: f64,
    verbal_discipline_score: f64,
    decision_log: Vec<DecisionEntry>,
    created_at: DateTime<Utc>,
    excluded_at: Option<DateTime<Utc>>,
}

impl Agent {
    /// New candidate with a generated id.
    pub fn candidate(name: impl Into<String>, role: AgentRole, mode: AgentMode) -> Self {
        Self {
            id: AgentId::generate(),
            name: name.into(),
            role,
            mode,
            status: AgentStatus::Candidate,
            warnings: Vec::new(),
            interview_passed: false,
            interview_score: 0.0,
            verbal_discipline_score: 100.0,
            decision_log: Vec::new(),
            created_at: Utc::now(),
            excluded_at: None,
        }
    }

    pub(crate) fn with_id(mut self, id: AgentId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn warning_count(&self) -> u32 {
        self.warnings.len() as u32
    }

    pub fn warnings(&self) -> &[WarningRecord] {
        &self.warnings
    }

    pub fn interview_passed(&self) -> bool {
        self.interview_passed
    }

    pub fn interview_score(&self) -> f64 {
        self.interview_score
    }

    pub fn verbal_discipline_score(&self) -> f64 {
        self.verbal_discipline_score
    }

    pub fn decision_log(&self) -> &[DecisionEntry] {
        &self.decision_log
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn excluded_at(&self) -> Option<DateTime<Utc>> {
        self.excluded_at
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    pub fn is_excluded(&self) -> bool {
        self.status == AgentStatus::Excluded
    }

    /// Record the final interview verdict. Has no effect once excluded.
    pub fn record_interview(&mut self, passed: bool, score: f64) {
        if self.is_excluded() {
            return;
        }
        self.interview_passed = passed;
        self.interview_score = score;
    }

    /// `candidate -> active`, only after a passed interview.
    pub fn activate(&mut self) -> Governed<()> {
        match self.status {
            AgentStatus::Excluded => Err(LifecycleError::AgentExcluded(self.id.clone())),
            AgentStatus::Active => Err(LifecycleError::NotACandidate {
                agent_id: self.id.clone(),
                status: self.status,
            }),
            AgentStatus::Candidate if !self.interview_passed => {
                Err(LifecycleError::InterviewNotPassed(self.id.clone()))
            }
            AgentStatus::Candidate => {
                self.status = AgentStatus::Active;
                Ok(())
            }
        }
    }

    /// Fails unless the agent may submit work right now.
    pub fn ensure_active(&self) -> Governed<()> {
        match self.status {
            AgentStatus::Active => Ok(()),
            AgentStatus::Excluded => Err(LifecycleError::AgentExcluded(self.id.clone())),
            AgentStatus::Candidate => Err(LifecycleError::AgentNotActive {
                agent_id: self.id.clone(),
                status: self.status,
            }),
        }
    }

    /// Add a formal warning; the `max_warnings`-th one excludes the agent.
    pub fn add_warning(&mut self, reason: impl Into<String>, max_warnings: u32) -> WarningOutcome {
        if self.is_excluded() {
            return WarningOutcome::AlreadyExcluded;
        }
        self.warnings.push(WarningRecord {
            reason: reason.into(),
            issued_at: Utc::now(),
        });
        let count = self.warning_count();
        if count >= max_warnings {
            self.mark_excluded();
            WarningOutcome::Excluded { count }
        } else {
            WarningOutcome::Warned {
                count,
                max: max_warnings,
            }
        }
    }

    /// Immediate, irreversible exclusion.
    pub fn exclude(&mut self) -> ExclusionOutcome {
        if self.is_excluded() {
            return ExclusionOutcome::AlreadyExcluded;
        }
        self.mark_excluded();
        ExclusionOutcome::Excluded
    }

    fn mark_excluded(&mut self) {
        self.status = AgentStatus::Excluded;
        self.excluded_at = Some(Utc::now());
    }

    /// Append to the decision log, stamping the entry at insertion.
    pub fn log_decision(&mut self, mut entry: DecisionEntry) {
        entry.agent_mode = self.mode;
        entry.recorded_at = Utc::now();
        self.decision_log.push(entry);
    }

    pub fn apply_verbal_penalty(&mut self, points: f64) {
        self.verbal_discipline_score = (self.verbal_discipline_score - points).max(0.0);
    }
}
