//! Replay of an agent's decision log against the rulebook.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::GovernanceConfig;
use crate::domain::{Agent, AgentId, AgentMode, AgentStatus, DecisionEntry};
use crate::language::check_language;

const RULE_VIOLATION_COST: i64 = 30;
const MISSING_JUSTIFICATION_COST: i64 = 20;
const THIN_JUSTIFICATION_COST: i64 = 10;
const LANGUAGE_HIT_COST: i64 = 15;
const MIN_JUSTIFICATION_CHARS: usize = 20;

/// Score of one logged decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionAudit {
    pub subject: String,
    pub score: u32,
    pub violations: Vec<String>,
    pub passed: bool,
}

/// Rulebook violations recorded in the entry's flags and wording.
pub fn rule_violations(entry: &DecisionEntry) -> Vec<String> {
    let mut violations = Vec::new();
    if entry.flags.executes_trade || entry.action == "execute_trade" {
        violations.push("rule 1: the governance desk never trades".to_string());
    }
    if entry.flags.tradable_as_signal {
        violations.push("rule 3: a tradable market is not a signal".to_string());
    }
    if entry.flags.raw_edge {
        violations.push("rule 4: only net edge counts".to_string());
    }
    if !entry.justification.is_empty() {
        let report = check_language(&entry.justification, AgentMode::Human);
        if !report.clean {
            let phrases: Vec<&str> = report.hits.iter().map(|h| h.phrase).collect();
            violations.push(format!("rule 7: vague language in justification: {}", phrases.join(", ")));
        }
    }
    if !entry.flags.written {
        violations.push("rule 8: decision was not formalised in writing".to_string());
    }
    if entry.flags.forced_trade {
        violations.push("rule 9: attempt to force a trade".to_string());
    }
    violations
}

pub fn audit_decision(entry: &DecisionEntry, pass_score: u32) -> DecisionAudit {
    let mut score: i64 = 100;

    let mut violations = rule_violations(entry);
    score -= RULE_VIOLATION_COST * violations.len() as i64;

    let justification = entry.justification.trim();
    if justification.is_empty() {
        score -= MISSING_JUSTIFICATION_COST;
        violations.push("no justification".to_string());
    } else {
        if justification.chars().count() < MIN_JUSTIFICATION_CHARS {
            score -= THIN_JUSTIFICATION_COST;
            violations.push("justification too short".to_string());
        }
        let report = check_language(justification, entry.agent_mode);
        if !report.clean {
            score -= LANGUAGE_HIT_COST * report.hits.len() as i64;
            violations.push(format!("vague language ({} hits)", report.hits.len()));
        }
    }

    let score = score.max(0) as u32;
    DecisionAudit {
        subject: entry.subject.clone(),
        score,
        violations,
        passed: score >= pass_score,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Ok,
    Exclusion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReview {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub status: AgentStatus,
    pub total_decisions: usize,
    pub failed_audits: usize,
    /// Percentage of failed decisions.
    pub failure_rate: f64,
    pub violations: Vec<String>,
    pub warnings: u32,
    pub recommendation: Recommendation,
    pub reviewed_at: DateTime<Utc>,
}

/// Audit every logged decision of `agent`.
pub fn review_agent(agent: &Agent, config: &GovernanceConfig) -> AgentReview {
    let total = agent.decision_log().len();
    let mut failed = 0usize;
    let mut violations = Vec::new();
    for entry in agent.decision_log() {
        let audit = audit_decision(entry, config.decision_audit_pass_score);
        if !audit.passed {
            failed += 1;
            violations.extend(audit.violations);
        }
    }

    let failure_rate = if total == 0 {
        0.0
    } else {
        failed as f64 / total as f64 * 100.0
    };
    let recommendation = if failed as f64 > total as f64 * config.review_failure_fraction {
        Recommendation::Exclusion
    } else {
        Recommendation::Ok
    };

    AgentReview {
        agent_id: agent.id().clone(),
        agent_name: agent.name().to_string(),
        status: agent.status(),
        total_decisions: total,
        failed_audits: failed,
        failure_rate,
        violations,
        warnings: agent.warning_count(),
        recommendation,
        reviewed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentRole, DecisionFlags};

    fn entry(justification: &str) -> DecisionEntry {
        DecisionEntry::new("submit_signal", "S-1", "APPROVED", justification)
    }

    #[test]
    fn clean_decision_scores_full() {
        let audit = audit_decision(&entry("Edge net 1.2% after costs, spread 0.3%."), 60);
        assert_eq!(audit.score, 100);
        assert!(audit.passed);
        assert!(audit.violations.is_empty());
    }

    #[test]
    fn deductions_stack_and_floor_at_zero() {
        let audit = audit_decision(&entry(""), 60);
        assert_eq!(audit.score, 80);

        let audit = audit_decision(&entry("Court."), 60);
        assert_eq!(audit.score, 90);

        let forced = entry("Forced through despite the rules.").with_flags(DecisionFlags {
            executes_trade: true,
            tradable_as_signal: true,
            raw_edge: true,
            written: false,
            forced_trade: true,
        });
        let audit = audit_decision(&forced, 60);
        assert_eq!(audit.score, 0);
        assert!(!audit.passed);
        assert_eq!(audit.violations.len(), 5);
    }

    #[test]
    fn vague_justification_costs_rule_and_hits() {
        let audit = audit_decision(&entry("Je pense que le marché va monter."), 60);
        // rule 7 (-30) plus one language hit (-15)
        assert_eq!(audit.score, 55);
        assert!(!audit.passed);
    }

    #[test]
    fn exclusion_recommended_above_failure_fraction() {
        let config = GovernanceConfig::default();
        let mut agent = Agent::candidate("Ada", AgentRole::AlphaResearch, AgentMode::Human);
        let review = review_agent(&agent, &config);
        assert_eq!(review.recommendation, Recommendation::Ok);
        assert_eq!(review.failure_rate, 0.0);

        agent.log_decision(entry("Edge net 1.2% after costs, spread 0.3%."));
        agent.log_decision(entry("Edge net 0.9% after costs, volume 20k."));
        agent.log_decision(entry("Je pense que oui."));
        let review = review_agent(&agent, &config);
        assert_eq!(review.failed_audits, 1);
        assert_eq!(review.recommendation, Recommendation::Exclusion);
        assert!((review.failure_rate - 33.333).abs() < 0.01);
    }
}
