//! The authorization gate every mutating orchestrator call goes through.
//!
//! [`gate`] is the only way to obtain an [`Authorized`] token, and the
//! orchestrator's mutating methods need one before they touch any state.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::domain::error::{GovernanceError, Result};
use crate::ledger::{AccessMode, AuditLedger, AuthGrant, GovernedAction};
use crate::obs;

pub const DEFAULT_ACTOR: &str = "governance";

/// Context flags that signal an attempt to bend the rulebook.
pub const DEVIATION_FLAGS: [(&str, &str); 4] = [
    ("force_trade", "attempt to force a trade"),
    ("minimize_risk", "attempt to minimize a risk"),
    ("bypass_threshold", "attempt to bypass a threshold"),
    ("override_rejection", "attempt to override a rejection"),
];

/// Who is calling and with which free-form flags.
#[derive(Debug, Clone, PartialEq)]
pub struct CallContext {
    pub actor: String,
    pub flags: BTreeMap<String, Value>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::operator(DEFAULT_ACTOR)
    }
}

impl CallContext {
    pub fn operator(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            flags: BTreeMap::new(),
        }
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.flags.insert(key.into(), value.into());
        self
    }

    /// Descriptions of every deviation flag set in this context.
    pub fn deviations(&self) -> Vec<String> {
        DEVIATION_FLAGS
            .iter()
            .filter(|(flag, _)| self.flags.get(*flag).is_some_and(truthy))
            .map(|(_, description)| description.to_string())
            .collect()
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Proof that a call passed the gate.
#[derive(Debug)]
pub struct Authorized {
    grant: AuthGrant,
}

impl Authorized {
    pub fn action(&self) -> GovernedAction {
        self.grant.action()
    }

    pub fn actor(&self) -> &str {
        self.grant.actor()
    }

    pub fn ledger_sequence(&self) -> u64 {
        self.grant.sequence()
    }
}

/// Authorize `action` on the ledger, then refuse any deviation flag.
pub fn gate(
    ledger: &AuditLedger,
    action: GovernedAction,
    ctx: &CallContext,
    mode: AccessMode,
) -> Result<Authorized> {
    let grant = ledger.authorize(action, &ctx.actor, mode)?;

    let deviations = ctx.deviations();
    if !deviations.is_empty() {
        ledger.log(
            "detect_deviation",
            &ctx.actor,
            json!({"action": action, "deviations": deviations}),
            "BLOCKED",
        )?;
        obs::emit_gate_deviation(action.as_str(), &ctx.actor, &deviations);
        return Err(GovernanceError::policy(
            action.as_str(),
            format!("deviation detected: {}", deviations.join(", ")),
        ));
    }

    Ok(Authorized { grant })
}
