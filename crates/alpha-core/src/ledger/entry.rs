use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::digest::chain_digest;
use crate::domain::error::Result;

/// One line of the audit ledger.
///
/// Entries are sealed on creation; the ledger hands out clones only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub actor: String,
    pub details: Value,
    pub result: String,
    pub prior_hash: String,
    pub entry_hash: String,
}

impl AuditEntry {
    /// Build an entry linked to `prior_hash` and compute its hash.
    pub(crate) fn seal(
        sequence: u64,
        timestamp: DateTime<Utc>,
        action: &str,
        actor: &str,
        details: Value,
        result: &str,
        prior_hash: &str,
    ) -> Result<Self> {
        let mut entry = Self {
            sequence,
            timestamp,
            action: action.to_string(),
            actor: actor.to_string(),
            details,
            result: result.to_string(),
            prior_hash: prior_hash.to_string(),
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.compute_hash()?;
        Ok(entry)
    }

    /// Hashed fields: everything except the two hashes themselves.
    fn hashed_fields(&self) -> Value {
        json!({
            "sequence": self.sequence,
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            "action": self.action,
            "actor": self.actor,
            "details": self.details,
            "result": self.result,
        })
    }

    /// `H(prior_hash ∥ canonical(fields))` recomputed from the stored fields.
    pub fn compute_hash(&self) -> Result<String> {
        chain_digest(&self.prior_hash, &self.hashed_fields())
    }

    pub fn hash_matches(&self) -> Result<bool> {
        Ok(self.compute_hash()? == self.entry_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::digest::GENESIS_HASH;

    fn sample() -> AuditEntry {
        AuditEntry::seal(
            0,
            Utc::now(),
            "ledger_initialized",
            "system",
            json!({}),
            "OK",
            GENESIS_HASH,
        )
        .unwrap()
    }

    #[test]
    fn sealed_entry_verifies() {
        assert!(sample().hash_matches().unwrap());
    }

    #[test]
    fn any_field_change_breaks_hash() {
        let mut entry = sample();
        entry.result = "DENIED".into();
        assert!(!entry.hash_matches().unwrap());

        let mut entry = sample();
        entry.details = json!({"note": "edited"});
        assert!(!entry.hash_matches().unwrap());
    }

    #[test]
    fn json_roundtrip_preserves_hash() {
        let entry = sample();
        let line = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&line).unwrap();
        assert!(back.hash_matches().unwrap());
    }
}
