//! Proposed trade signals and their closed enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields every signal must carry, in validation order.
pub const REQUIRED_FIELDS: [&str; 10] = [
    "signal_id",
    "market",
    "type",
    "edge_net",
    "volume",
    "spread",
    "time_to_resolution",
    "risks",
    "status",
    "comment",
];

/// Flat signal record as submitted by an agent.
///
/// Kept as an open JSON object so that missing and malformed fields can be
/// reported as rule violations instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signal(Map<String, Value>);

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String view of a field. Numbers are rendered, other types yield `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric view of a field: a JSON number or a numeric string. Non-finite
    /// values are treated as absent.
    pub fn number(&self, field: &str) -> Option<f64> {
        let n = match self.0.get(field)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Present means not absent, not null and not a blank string.
    pub fn is_present(&self, field: &str) -> bool {
        match self.0.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    pub fn signal_id(&self) -> String {
        self.text("signal_id")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Signal {
    fn from(map: Map<String, Value>) -> Self {
        Signal(map)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    Arbitrage,
    Proba,
    Momentum,
}

impl SignalType {
    pub const ALL: [SignalType; 3] = [SignalType::Arbitrage, SignalType::Proba, SignalType::Momentum];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Arbitrage => "ARBITRAGE",
            SignalType::Proba => "PROBA",
            SignalType::Momentum => "MOMENTUM",
        }
    }
}

impl FromStr for SignalType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

/// Requested or resolved outcome of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStatus {
    Approved,
    Surveillance,
    Rejected,
}

impl SignalStatus {
    pub const ALL: [SignalStatus; 3] = [
        SignalStatus::Approved,
        SignalStatus::Surveillance,
        SignalStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Approved => "APPROVED",
            SignalStatus::Surveillance => "SURVEILLANCE",
            SignalStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

/// Outcome of validating one signal. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub resolved_status: SignalStatus,
}
