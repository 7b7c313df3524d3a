//! The canonical AlphaDecision record and its structural schema check.
//!
//! [`DecisionCanonicalizer::build`] derives the record from a validation
//! outcome. [`validate_against_schema`] re-checks structure only, so it can
//! gate records that were built elsewhere.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::Result;
use crate::domain::{Signal, SignalStatus, ValidationResult, APPROVAL_RATE_RULE, RULE_RANGE};
use crate::obs;

pub const SCHEMA_VERSION: &str = "1.0.0";
pub const DECISION_ID_PREFIX: &str = "AD-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_clarity(clarity: u32) -> Self {
        match clarity {
            80.. => ConfidenceLevel::High,
            50..=79 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn from_hours(hours: f64) -> Self {
        if hours <= 6.0 {
            Urgency::Critical
        } else if hours <= 24.0 {
            Urgency::High
        } else if hours <= 48.0 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionConstraints {
    pub max_size: f64,
    pub urgency: Urgency,
    pub expiry: DateTime<Utc>,
}

/// The only artifact downstream execution consumes. Never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaDecision {
    pub decision_id: String,
    pub market: String,
    pub status: SignalStatus,
    pub confidence_level: ConfidenceLevel,
    pub edge_net: f64,
    pub constraints: DecisionConstraints,
    pub rules_passed: Vec<u8>,
    pub rules_failed: Vec<u8>,
    pub audit_ref: String,
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
}

impl AlphaDecision {
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Patterns mapping a validation message back to the rule it violates.
fn rule_patterns() -> &'static [(u8, Vec<Regex>)] {
    static PATTERNS: OnceLock<Vec<(u8, Vec<Regex>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: [(u8, &[&str]); 5] = [
            (2, &[r"(?i)rule 2\b", r"(?i)dominance"]),
            (4, &[r"(?i)rule 4\b", r"(?i)edge_net"]),
            (5, &[r"(?i)rule 5\b", r"(?i)exceeds maximum", r"(?i)suspect"]),
            (7, &[r"(?i)rule 7\b", r"(?i)vague language"]),
            (8, &[r"(?i)rule 8\b", r"(?i)required field", r"(?i)too short"]),
        ];
        table
            .iter()
            .map(|(rule, pats)| (*rule, pats.iter().filter_map(|p| Regex::new(p).ok()).collect()))
            .collect()
    })
}

/// Rule numbers violated according to `errors`.
pub fn rules_failed_from(errors: &[String]) -> BTreeSet<u8> {
    let mut failed = BTreeSet::new();
    for error in errors {
        for (rule, patterns) in rule_patterns() {
            if patterns.iter().any(|re| re.is_match(error)) {
                failed.insert(*rule);
            }
        }
    }
    failed
}

/// Build time for a fresh record, strictly later than every earlier one
/// issued by this process at microsecond resolution.
fn issue_time() -> DateTime<Utc> {
    static LAST_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);
    let now = Utc::now();
    let micros = now.timestamp_micros();
    let issued = match LAST_MICROS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(micros.max(last.saturating_add(1)))
    }) {
        Ok(last) | Err(last) => micros.max(last.saturating_add(1)),
    };
    DateTime::from_timestamp_micros(issued).unwrap_or(now)
}

/// Expiry `hours` after `now`. Non-positive horizons expire immediately and
/// horizons past the calendar range saturate at its end.
fn expiry_after(now: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    let millis = (hours.max(0.0) * 3_600_000.0) as i64;
    Duration::try_milliseconds(millis)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DecisionCanonicalizer;

impl DecisionCanonicalizer {
    pub fn build(
        &self,
        signal: &Signal,
        validation: &ValidationResult,
        clarity_score: u32,
        governor_blocked: bool,
    ) -> AlphaDecision {
        self.build_at(signal, validation, clarity_score, governor_blocked, issue_time())
    }

    /// [`build`](Self::build) with an explicit timestamp. Two builds at the
    /// same instant share an id.
    pub fn build_at(
        &self,
        signal: &Signal,
        validation: &ValidationResult,
        clarity_score: u32,
        governor_blocked: bool,
        now: DateTime<Utc>,
    ) -> AlphaDecision {
        let signal_id = signal.signal_id();

        let mut status = if validation.valid {
            validation.resolved_status
        } else {
            SignalStatus::Rejected
        };
        if governor_blocked && status == SignalStatus::Approved {
            status = SignalStatus::Rejected;
        }

        let mut failed = rules_failed_from(&validation.errors);
        if governor_blocked {
            failed.insert(APPROVAL_RATE_RULE);
        }
        let rules_failed: Vec<u8> = failed.iter().copied().collect();
        let rules_passed: Vec<u8> = RULE_RANGE.filter(|r| !failed.contains(r)).collect();

        let hours = signal.number("time_to_resolution").unwrap_or(0.0);
        let expiry = expiry_after(now, hours);

        let decision = AlphaDecision {
            decision_id: format!("{DECISION_ID_PREFIX}{signal_id}-{}", now.format("%Y%m%d%H%M%S%6f")),
            market: signal
                .text("market")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            status,
            confidence_level: ConfidenceLevel::from_clarity(clarity_score),
            edge_net: signal.number("edge_net").unwrap_or(0.0),
            constraints: DecisionConstraints {
                max_size: signal.number("volume").unwrap_or(0.0),
                urgency: Urgency::from_hours(hours),
                expiry,
            },
            rules_passed,
            rules_failed,
            audit_ref: format!(
                "[{}]-{signal_id}",
                now.to_rfc3339_opts(SecondsFormat::Micros, true)
            ),
            schema_version: SCHEMA_VERSION.to_string(),
            generated_at: now,
        };
        obs::emit_decision_built(&decision.decision_id, decision.status.as_str(), &decision.rules_failed);
        decision
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

const REQUIRED_KEYS: [&str; 9] = [
    "decision_id",
    "market",
    "status",
    "confidence_level",
    "edge_net",
    "constraints",
    "rules_passed",
    "rules_failed",
    "audit_ref",
];

fn one_of(value: Option<&Value>, allowed: &[&str]) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| allowed.contains(&s))
}

fn shown(value: Option<&Value>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "null".to_string())
}

/// Structural check of a decision record, wherever it came from.
pub fn validate_against_schema(record: &Value) -> SchemaReport {
    let mut errors = Vec::new();
    let Some(obj) = record.as_object() else {
        return SchemaReport {
            valid: false,
            errors: vec!["decision must be a JSON object".to_string()],
        };
    };

    for key in REQUIRED_KEYS {
        if !obj.contains_key(key) {
            errors.push(format!("missing required key '{key}'"));
        }
    }

    let status = obj.get("status");
    if !one_of(status, &["APPROVED", "SURVEILLANCE", "REJECTED"]) {
        errors.push(format!("invalid status {}", shown(status)));
    }
    let confidence = obj.get("confidence_level");
    if !one_of(confidence, &["LOW", "MEDIUM", "HIGH"]) {
        errors.push(format!("invalid confidence_level {}", shown(confidence)));
    }
    if !obj.get("edge_net").is_some_and(Value::is_number) {
        errors.push("edge_net must be numeric".to_string());
    }

    let constraints = obj.get("constraints").and_then(Value::as_object);
    for key in ["max_size", "urgency", "expiry"] {
        if !constraints.is_some_and(|c| c.contains_key(key)) {
            errors.push(format!("missing constraint '{key}'"));
        }
    }
    let urgency = constraints.and_then(|c| c.get("urgency"));
    if !one_of(urgency, &["LOW", "MEDIUM", "HIGH", "CRITICAL"]) {
        errors.push(format!("invalid urgency {}", shown(urgency)));
    }

    for key in ["rules_passed", "rules_failed"] {
        if !obj.get(key).is_some_and(Value::is_array) {
            errors.push(format!("{key} must be a list"));
        }
    }

    let id_ok = obj
        .get("decision_id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.starts_with(DECISION_ID_PREFIX));
    if !id_ok {
        errors.push(format!("decision_id must start with '{DECISION_ID_PREFIX}'"));
    }

    SchemaReport {
        valid: errors.is_empty(),
        errors,
    }
}
