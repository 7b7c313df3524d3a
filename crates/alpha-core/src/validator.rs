//! Signal validation against the rulebook.
//!
//! Checks run in three groups. Required fields fail fast. The type and
//! status enumerations are both evaluated, then fail fast. The content
//! group (net edge, time decay, language, metric dominance, written
//! substance) always runs to completion so every violation is reported.
//!
//! Messages start with `rule N:` where a golden rule applies; the decision
//! canonicalizer maps them back to rule numbers.

use crate::config::GovernanceConfig;
use crate::domain::{AgentMode, Signal, SignalStatus, SignalType, ValidationResult, REQUIRED_FIELDS};
use crate::language::{FoldingMatcher, ForbiddenPhrase, PhraseCatalog, TextMatcher};
use crate::metrics::METRICS;
use crate::obs;

/// Metrics a balanced comment should discuss, with the words that count as
/// a mention of each.
pub const METRIC_KEYWORDS: [(&str, &[&str]); 5] = [
    ("edge_net", &["edge", "rendement", "profit", "gain", "yield", "return"]),
    ("volume", &["volume", "liquidité", "liquidity", "depth"]),
    ("spread", &["spread", "écart", "bid-ask", "bid ask"]),
    (
        "time_to_resolution",
        &["temps", "time", "résolution", "expiry", "deadline", "délai"],
    ),
    (
        "risks",
        &["risque", "risk", "danger", "exposition", "exposure", "drawdown"],
    ),
];

/// Numeric fields considered when deciding whether a comment ignores
/// supplied figures.
const NUMERIC_METRICS: [&str; 4] = ["edge_net", "volume", "spread", "time_to_resolution"];

pub struct RuleValidator {
    config: GovernanceConfig,
    matcher: Box<dyn TextMatcher>,
}

impl std::fmt::Debug for RuleValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleValidator")
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(GovernanceConfig::default())
    }
}

impl RuleValidator {
    pub fn new(config: GovernanceConfig) -> Self {
        Self {
            config,
            matcher: Box::new(FoldingMatcher),
        }
    }

    /// Swap the phrase/keyword matching strategy.
    pub fn with_matcher(mut self, matcher: Box<dyn TextMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn validate(&self, signal: &Signal) -> ValidationResult {
        self.validate_as(signal, AgentMode::Human)
    }

    /// Validate with the language catalog of `mode`.
    pub fn validate_as(&self, signal: &Signal, mode: AgentMode) -> ValidationResult {
        let errors = self.collect_errors(signal, mode);
        let valid = errors.is_empty();
        let resolved_status = if valid {
            signal
                .text("status")
                .and_then(|s| s.parse().ok())
                .unwrap_or(SignalStatus::Rejected)
        } else {
            SignalStatus::Rejected
        };

        METRICS.inc_signals_validated();
        obs::emit_signal_validated(&signal.signal_id(), valid, errors.len(), resolved_status.as_str());
        ValidationResult {
            valid,
            errors,
            resolved_status,
        }
    }

    fn collect_errors(&self, signal: &Signal, mode: AgentMode) -> Vec<String> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|f| !signal.is_present(f))
            .map(|f| format!("rule 8: required field missing or empty: '{f}'"))
            .collect();
        if !missing.is_empty() {
            return missing;
        }

        let mut errors = Vec::new();
        let sig_type = signal.text("type").unwrap_or_default();
        if sig_type.parse::<SignalType>().is_err() {
            let allowed: Vec<_> = SignalType::ALL.iter().map(|t| t.as_str()).collect();
            errors.push(format!("invalid type '{sig_type}' (allowed: {})", allowed.join(", ")));
        }
        let status = signal.text("status").unwrap_or_default();
        if status.parse::<SignalStatus>().is_err() {
            let allowed: Vec<_> = SignalStatus::ALL.iter().map(|s| s.as_str()).collect();
            errors.push(format!("invalid status '{status}' (allowed: {})", allowed.join(", ")));
        }
        if !errors.is_empty() {
            return errors;
        }

        self.check_edge(signal, &mut errors);
        self.check_time(signal, &mut errors);
        for hit in self.language_hits(signal, mode) {
            errors.push(format!("rule 7: vague language detected: '{}'", hit.phrase));
        }
        self.check_dominance(signal, &mut errors);
        self.check_written_substance(signal, &mut errors);
        errors
    }

    fn check_edge(&self, signal: &Signal, errors: &mut Vec<String>) {
        let min = self.config.min_edge_net;
        match signal.number("edge_net") {
            None => errors.push(format!(
                "rule 4: edge_net must be numeric, got '{}'",
                signal.text("edge_net").unwrap_or_default()
            )),
            Some(edge) if edge < min => {
                errors.push(format!("rule 4: edge_net ({edge}%) below minimum ({min}%)"))
            }
            Some(_) => {}
        }
    }

    fn check_time(&self, signal: &Signal, errors: &mut Vec<String>) {
        let max = self.config.max_time_to_resolution_hours;
        let Some(ttr) = signal.number("time_to_resolution") else {
            errors.push(format!(
                "rule 5: time_to_resolution must be numeric hours, got '{}'",
                signal.text("time_to_resolution").unwrap_or_default()
            ));
            return;
        };
        if ttr <= 0.0 {
            errors.push(format!("rule 5: time_to_resolution ({ttr}h) must be positive"));
        } else if ttr > max {
            errors.push(format!("rule 5: time_to_resolution ({ttr}h) exceeds maximum ({max}h)"));
        }
        if let Some(edge) = signal.number("edge_net") {
            if ttr > self.config.late_edge_suspicion_hours && edge > self.config.high_edge_threshold {
                errors.push(format!(
                    "rule 5: high edge ({edge}%) with late resolution ({ttr}h) is suspect"
                ));
            }
        }
    }

    /// Forbidden phrases found in the comment and risk text.
    pub fn language_hits(&self, signal: &Signal, mode: AgentMode) -> Vec<ForbiddenPhrase> {
        let text = format!(
            "{} {}",
            signal.text("comment").unwrap_or_default(),
            signal.text("risks").unwrap_or_default()
        );
        PhraseCatalog::for_mode(mode).scan(self.matcher.as_ref(), &text)
    }

    fn check_dominance(&self, signal: &Signal, errors: &mut Vec<String>) {
        let comment = signal.text("comment").unwrap_or_default();
        let counts: Vec<(&str, usize)> = METRIC_KEYWORDS
            .iter()
            .map(|(metric, keywords)| {
                let n = keywords
                    .iter()
                    .map(|kw| self.matcher.count_occurrences(&comment, kw))
                    .sum();
                (*metric, n)
            })
            .collect();
        let total: usize = counts.iter().map(|(_, n)| n).sum();
        if total == 0 {
            return;
        }

        let threshold = self.config.metric_dominance_threshold;
        for (metric, n) in &counts {
            let share = *n as f64 / total as f64;
            if share > threshold {
                errors.push(format!(
                    "rule 2: metric dominance: '{metric}' holds {:.0}% of mentions (threshold {:.0}%)",
                    share * 100.0,
                    threshold * 100.0
                ));
            }
        }

        let mentioned: Vec<&str> = counts.iter().filter(|(_, n)| *n > 0).map(|(m, _)| *m).collect();
        let supplied = NUMERIC_METRICS
            .iter()
            .filter(|m| signal.number(m).is_some())
            .count();
        if mentioned.len() == 1 && supplied >= 3 {
            errors.push(format!(
                "rule 2: comment mentions only '{}' while {supplied} metrics are supplied",
                mentioned[0]
            ));
        }
    }

    fn check_written_substance(&self, signal: &Signal, errors: &mut Vec<String>) {
        let risks = signal.text("risks").unwrap_or_default();
        let risks_len = risks.trim().chars().count();
        if risks_len < self.config.min_risk_description_chars {
            errors.push(format!(
                "rule 8: risks description too short ({risks_len} chars, minimum {})",
                self.config.min_risk_description_chars
            ));
        }
        let comment = signal.text("comment").unwrap_or_default();
        let comment_len = comment.trim().chars().count();
        if comment_len < self.config.min_comment_chars {
            errors.push(format!(
                "rule 8: comment too short to justify the signal ({comment_len} chars, minimum {})",
                self.config.min_comment_chars
            ));
        }
    }

    /// 10 points per present required field, capped at 100.
    pub fn clarity_score(&self, signal: &Signal) -> u32 {
        let present = REQUIRED_FIELDS.iter().filter(|f| signal.is_present(f)).count() as u32;
        (present * 10).min(100)
    }
}
