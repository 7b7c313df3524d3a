//! Approval-rate circuit breaker and KPI counters.
//!
//! Once at least `min_signals_for_blocking` signals have been recorded and
//! the approved share exceeds `max_approval_pct`, the governor is blocked
//! and stays blocked until a justified manual unblock. Blocking is advisory:
//! the orchestrator is the one that refuses approvals while blocked.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::config::GovernanceConfig;
use crate::domain::error::{GovernanceError, Result};
use crate::domain::{AgentId, SignalStatus};
use crate::obs;

#[derive(Debug, Default)]
struct KpiState {
    markets_analyzed: u64,
    markets_rejected: u64,
    signals_submitted: u64,
    signals_approved: u64,
    signals_surveillance: u64,
    signals_rejected: u64,
    /// reason -> (count, order of first appearance)
    rejection_reasons: HashMap<String, (u64, u64)>,
    reasons_seen: u64,
    verbal_violations: BTreeMap<AgentId, u64>,
    clarity_samples: Vec<f64>,
    blocked: bool,
    blocked_at: Option<DateTime<Utc>>,
}

impl KpiState {
    fn note_reason(&mut self, reason: &str) {
        let seen = self.reasons_seen;
        let slot = self.rejection_reasons.entry(reason.to_string()).or_insert((0, seen));
        slot.0 += 1;
        self.reasons_seen += 1;
    }

    fn approval_pct(&self) -> f64 {
        pct(self.signals_approved, self.signals_submitted)
    }
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Result of [`ApprovalGovernor::manual_unblock`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnblockOutcome {
    NotBlocked,
    Unblocked {
        reviewer: String,
        justification: String,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionReasonCount {
    pub reason: String,
    pub count: u64,
}

/// Read-only KPI view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub markets_analyzed: u64,
    pub markets_rejected: u64,
    pub markets_rejected_pct: f64,
    pub signals_submitted: u64,
    pub signals_approved: u64,
    pub signals_surveillance: u64,
    pub signals_rejected: u64,
    pub signals_approved_pct: f64,
    pub signals_rejected_pct: f64,
    pub avg_signal_clarity: f64,
    pub top_rejection_reasons: Vec<RejectionReasonCount>,
    pub approval_blocked: bool,
    pub approval_blocked_at: Option<DateTime<Utc>>,
    pub total_verbal_violations: u64,
    pub verbal_violations_by_agent: BTreeMap<AgentId, u64>,
}

#[derive(Debug)]
pub struct ApprovalGovernor {
    max_approval_pct: f64,
    min_signals: u64,
    state: Mutex<KpiState>,
}

impl Default for ApprovalGovernor {
    fn default() -> Self {
        Self::new(&GovernanceConfig::default())
    }
}

impl ApprovalGovernor {
    /// Unblocked governor using the configured ceiling and sample size.
    pub fn new(config: &GovernanceConfig) -> Self {
        Self {
            max_approval_pct: config.max_approval_pct,
            min_signals: config.min_signals_for_blocking,
            state: Mutex::new(KpiState::default()),
        }
    }

    /// Record a submitted signal's final status. Returns `true` when this
    /// call tripped the breaker.
    pub fn record_signal(&self, status: SignalStatus, clarity_score: f64, rejection_reasons: &[String]) -> bool {
        let mut s = self.state.lock();
        s.signals_submitted += 1;
        match status {
            SignalStatus::Approved => s.signals_approved += 1,
            SignalStatus::Surveillance => s.signals_surveillance += 1,
            SignalStatus::Rejected => {
                s.signals_rejected += 1;
                for reason in rejection_reasons {
                    s.note_reason(reason);
                }
            }
        }
        if clarity_score > 0.0 {
            s.clarity_samples.push(clarity_score);
        }

        let over = s.approval_pct() > self.max_approval_pct && s.signals_submitted >= self.min_signals;
        if over && !s.blocked {
            s.blocked = true;
            s.blocked_at = Some(Utc::now());
            obs::emit_governor_blocked(s.signals_approved, s.signals_submitted, s.approval_pct());
            return true;
        }
        false
    }

    /// Count an analyzed market; rejected ones also tally their reason.
    pub fn record_market_analysis(&self, rejected: bool, reason: Option<&str>) {
        let mut s = self.state.lock();
        s.markets_analyzed += 1;
        if rejected {
            s.markets_rejected += 1;
            if let Some(reason) = reason.filter(|r| !r.is_empty()) {
                s.note_reason(reason);
            }
        }
    }

    /// One more forbidden-language incident for `agent_id`.
    pub fn record_verbal_violation(&self, agent_id: &AgentId) {
        *self.state.lock().verbal_violations.entry(agent_id.clone()).or_insert(0) += 1;
    }

    /// Whether approvals are currently suspended. Advisory: callers refuse
    /// approvals themselves.
    pub fn is_blocked(&self) -> bool {
        self.state.lock().blocked
    }

    /// Clear the block. Both arguments are mandatory; the caller audits the
    /// outcome.
    pub fn manual_unblock(&self, reviewer: &str, justification: &str) -> Result<UnblockOutcome> {
        if reviewer.trim().is_empty() || justification.trim().is_empty() {
            return Err(GovernanceError::policy(
                "manual_unblock",
                "reviewer and justification are both required",
            ));
        }
        let mut s = self.state.lock();
        if !s.blocked {
            return Ok(UnblockOutcome::NotBlocked);
        }
        s.blocked = false;
        s.blocked_at = None;
        drop(s);

        obs::emit_governor_unblocked(reviewer);
        Ok(UnblockOutcome::Unblocked {
            reviewer: reviewer.to_string(),
            justification: justification.to_string(),
            at: Utc::now(),
        })
    }

    /// Point-in-time copy of every counter, for reporting.
    pub fn snapshot(&self) -> KpiSnapshot {
        let s = self.state.lock();

        let mut reasons: Vec<(&String, &(u64, u64))> = s.rejection_reasons.iter().collect();
        reasons.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        let top_rejection_reasons = reasons
            .into_iter()
            .take(10)
            .map(|(reason, (count, _))| RejectionReasonCount {
                reason: reason.clone(),
                count: *count,
            })
            .collect();

        let avg = if s.clarity_samples.is_empty() {
            0.0
        } else {
            s.clarity_samples.iter().sum::<f64>() / s.clarity_samples.len() as f64
        };

        KpiSnapshot {
            markets_analyzed: s.markets_analyzed,
            markets_rejected: s.markets_rejected,
            markets_rejected_pct: round1(pct(s.markets_rejected, s.markets_analyzed)),
            signals_submitted: s.signals_submitted,
            signals_approved: s.signals_approved,
            signals_surveillance: s.signals_surveillance,
            signals_rejected: s.signals_rejected,
            signals_approved_pct: round1(s.approval_pct()),
            signals_rejected_pct: round1(pct(s.signals_rejected, s.signals_submitted)),
            avg_signal_clarity: round1(avg),
            top_rejection_reasons,
            approval_blocked: s.blocked,
            approval_blocked_at: s.blocked_at,
            total_verbal_violations: s.verbal_violations.values().sum(),
            verbal_violations_by_agent: s.verbal_violations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_sample_size_never_blocks() {
        let g = ApprovalGovernor::default();
        for _ in 0..4 {
            assert!(!g.record_signal(SignalStatus::Approved, 100.0, &[]));
        }
        assert!(!g.is_blocked());
    }

    #[test]
    fn trips_at_sample_size_and_stays_blocked() {
        let g = ApprovalGovernor::default();
        for _ in 0..4 {
            g.record_signal(SignalStatus::Rejected, 50.0, &["rule 4: edge".to_string()]);
        }
        assert!(g.record_signal(SignalStatus::Approved, 100.0, &[]));
        assert!(g.is_blocked());

        for _ in 0..100 {
            g.record_signal(SignalStatus::Rejected, 50.0, &[]);
        }
        assert!(g.is_blocked(), "block is sticky even when the ratio recovers");
    }

    #[test]
    fn ratio_at_ceiling_does_not_block() {
        let g = ApprovalGovernor::default();
        g.record_signal(SignalStatus::Approved, 90.0, &[]);
        for _ in 0..19 {
            g.record_signal(SignalStatus::Rejected, 40.0, &[]);
        }
        // 1 / 20 = 5.0%, not above the ceiling
        assert!(!g.is_blocked());
    }

    #[test]
    fn unblock_requires_both_arguments() {
        let g = ApprovalGovernor::default();
        assert!(g.manual_unblock("", "reviewed").is_err());
        assert!(g.manual_unblock("ops-lead", "  ").is_err());
        assert_eq!(g.manual_unblock("ops-lead", "reviewed").unwrap(), UnblockOutcome::NotBlocked);

        for _ in 0..5 {
            g.record_signal(SignalStatus::Approved, 100.0, &[]);
        }
        assert!(g.is_blocked());
        let outcome = g.manual_unblock("ops-lead", "batch reviewed line by line").unwrap();
        assert!(matches!(outcome, UnblockOutcome::Unblocked { ref reviewer, .. } if reviewer == "ops-lead"));
        assert!(!g.is_blocked());
        assert!(g.snapshot().approval_blocked_at.is_none());
    }

    #[test]
    fn snapshot_orders_reasons_by_count_then_first_seen() {
        let g = ApprovalGovernor::default();
        g.record_signal(SignalStatus::Rejected, 0.0, &["b".into()]);
        g.record_signal(SignalStatus::Rejected, 0.0, &["a".into()]);
        g.record_signal(SignalStatus::Rejected, 0.0, &["a".into(), "c".into()]);
        g.record_market_analysis(true, Some("b"));
        g.record_market_analysis(false, None);
        g.record_verbal_violation(&AgentId::from("a1"));
        g.record_verbal_violation(&AgentId::from("a1"));

        let snap = g.snapshot();
        let order: Vec<_> = snap.top_rejection_reasons.iter().map(|r| r.reason.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(snap.markets_analyzed, 2);
        assert_eq!(snap.markets_rejected_pct, 50.0);
        assert_eq!(snap.avg_signal_clarity, 0.0, "zero clarity is not sampled");
        assert_eq!(snap.total_verbal_violations, 2);
    }

    #[test]
    fn percentages_round_to_one_decimal() {
        let g = ApprovalGovernor::default();
        g.record_signal(SignalStatus::Surveillance, 70.0, &[]);
        g.record_signal(SignalStatus::Rejected, 80.0, &[]);
        g.record_signal(SignalStatus::Rejected, 90.0, &[]);
        let snap = g.snapshot();
        assert_eq!(snap.signals_rejected_pct, 66.7);
        assert_eq!(snap.avg_signal_clarity, 80.0);
    }
}
