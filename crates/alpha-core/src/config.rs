//! Governance thresholds.
//!
//! Defaults are the built-in rulebook constants. A deployment may override
//! them from a TOML file and then from `ALPHA_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::error::{GovernanceError, Result};
use crate::domain::AgentMode;

/// Every tunable constant of the rulebook, governor and vetting process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Minimum net edge, in percent (rule 4).
    pub min_edge_net: f64,
    /// Maximum time to resolution, in hours (rule 5).
    pub max_time_to_resolution_hours: f64,
    pub late_edge_suspicion_hours: f64,
    pub high_edge_threshold: f64,
    /// Share of comment mentions one metric may hold (rule 2).
    pub metric_dominance_threshold: f64,
    pub min_risk_description_chars: usize,
    pub min_comment_chars: usize,
    pub max_warnings: u32,
    /// Approval-rate ceiling in percent (rule 6).
    pub max_approval_pct: f64,
    pub min_signals_for_blocking: u64,
    pub interview_pass_score_human: u32,
    pub interview_pass_score_llm: u32,
    pub llm_max_answer_words: usize,
    /// Fraction of failed decisions above which a review recommends exclusion.
    pub review_failure_fraction: f64,
    pub decision_audit_pass_score: u32,
    pub queue_max_retries: u32,
    /// JSONL ledger location. `None` keeps the ledger in memory.
    pub ledger_path: Option<PathBuf>,
    /// Agent roster snapshot. `None` keeps the roster in memory.
    pub roster_path: Option<PathBuf>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_edge_net: 0.5,
            max_time_to_resolution_hours: 72.0,
            late_edge_suspicion_hours: 48.0,
            high_edge_threshold: 5.0,
            metric_dominance_threshold: 0.60,
            min_risk_description_chars: 10,
            min_comment_chars: 20,
            max_warnings: 3,
            max_approval_pct: 5.0,
            min_signals_for_blocking: 5,
            interview_pass_score_human: 80,
            interview_pass_score_llm: 90,
            llm_max_answer_words: 150,
            review_failure_fraction: 0.3,
            decision_audit_pass_score: 60,
            queue_max_retries: alpha_state::DEFAULT_MAX_RETRIES,
            ledger_path: None,
            roster_path: None,
        }
    }
}

impl GovernanceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            GovernanceError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `ALPHA_LEDGER_PATH`, `ALPHA_ROSTER_PATH`, `ALPHA_MAX_APPROVAL_PCT`,
    /// `ALPHA_MIN_EDGE_NET` and `ALPHA_QUEUE_MAX_RETRIES` when set.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("ALPHA_LEDGER_PATH") {
            self.ledger_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("ALPHA_ROSTER_PATH") {
            self.roster_path = Some(PathBuf::from(path));
        }
        if let Some(v) = lookup("ALPHA_MAX_APPROVAL_PCT") {
            self.max_approval_pct = parse_env("ALPHA_MAX_APPROVAL_PCT", &v)?;
        }
        if let Some(v) = lookup("ALPHA_MIN_EDGE_NET") {
            self.min_edge_net = parse_env("ALPHA_MIN_EDGE_NET", &v)?;
        }
        if let Some(v) = lookup("ALPHA_QUEUE_MAX_RETRIES") {
            self.queue_max_retries = parse_env("ALPHA_QUEUE_MAX_RETRIES", &v)?;
        }
        Ok(self)
    }

    /// Reject configurations under which the rulebook would be meaningless.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("min_edge_net", self.min_edge_net),
            ("max_time_to_resolution_hours", self.max_time_to_resolution_hours),
            ("late_edge_suspicion_hours", self.late_edge_suspicion_hours),
            ("high_edge_threshold", self.high_edge_threshold),
            ("max_approval_pct", self.max_approval_pct),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GovernanceError::Config(format!("{name} must be positive, got {value}")));
            }
        }

        let fractions = [
            ("metric_dominance_threshold", self.metric_dominance_threshold),
            ("review_failure_fraction", self.review_failure_fraction),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(GovernanceError::Config(format!("{name} must be in (0, 1], got {value}")));
            }
        }

        let scores = [
            ("interview_pass_score_human", self.interview_pass_score_human),
            ("interview_pass_score_llm", self.interview_pass_score_llm),
            ("decision_audit_pass_score", self.decision_audit_pass_score),
        ];
        for (name, value) in scores {
            if value > 100 {
                return Err(GovernanceError::Config(format!("{name} must be at most 100, got {value}")));
            }
        }

        if self.max_warnings == 0 {
            return Err(GovernanceError::Config("max_warnings must be at least 1".into()));
        }
        Ok(())
    }

    pub fn interview_pass_score(&self, mode: AgentMode) -> u32 {
        match mode {
            AgentMode::Human => self.interview_pass_score_human,
            AgentMode::Llm => self.interview_pass_score_llm,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| GovernanceError::Config(format!("{key}: cannot parse '{raw}'")))
}
