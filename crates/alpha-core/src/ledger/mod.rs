//! Append-only, hash-chained audit ledger.
//!
//! Every entry stores the hash of its predecessor and its own hash over
//! `prior_hash ∥ canonical(fields)`, so the chain can be re-derived from the
//! first entry at any time. The type exposes no way to edit, delete or
//! clear entries; readers only ever receive clones.
//!
//! Appends hold the write lock across read-prior-hash, seal and persist, so
//! concurrent writers cannot fork the chain and readers never observe a
//! half-written entry.

pub mod entry;
pub mod policy;
pub mod sink;

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

pub use entry::AuditEntry;
pub use policy::{AccessMode, GovernedAction, PolicyDecision};
pub use sink::{JsonlSink, LedgerMeta, LedgerSink, MemorySink};

use crate::config::GovernanceConfig;
use crate::domain::digest::GENESIS_HASH;
use crate::domain::error::{GovernanceError, Result};
use crate::metrics::METRICS;
use crate::obs;

/// Action recorded by the bootstrap entry at sequence 0.
pub const BOOTSTRAP_ACTION: &str = "ledger_initialized";

/// Outcome of a full chain walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub entry_count: u64,
    /// Sequence of the first entry that failed to verify.
    pub first_invalid: Option<u64>,
    pub error: Option<String>,
}

/// Proof that the ledger granted an action. Only the ledger can mint one.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    action: GovernedAction,
    actor: String,
    sequence: u64,
}

impl AuthGrant {
    pub(crate) fn new(action: GovernedAction, actor: &str, sequence: u64) -> Self {
        Self {
            action,
            actor: actor.to_string(),
            sequence,
        }
    }

    pub fn action(&self) -> GovernedAction {
        self.action
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Sequence of the ledger entry that recorded the grant.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

struct LedgerState {
    sink: Box<dyn LedgerSink>,
    last_hash: String,
    next_sequence: u64,
}

pub struct AuditLedger {
    state: RwLock<LedgerState>,
    compromised: AtomicBool,
}

impl std::fmt::Debug for AuditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("AuditLedger")
            .field("entry_count", &state.next_sequence)
            .field("last_hash", &state.last_hash)
            .field("compromised", &self.is_compromised())
            .finish()
    }
}

impl AuditLedger {
    /// Volatile ledger, bootstrapped.
    pub fn in_memory() -> Result<Self> {
        Self::bootstrap(Box::new(MemorySink::default()))
    }

    /// Open or create a JSONL ledger at `path`.
    ///
    /// An existing ledger is checked against its sidecar: the last entry's
    /// hash is recomputed and must equal the recorded `last_hash`, and the
    /// line count must equal `entry_count`. Any mismatch is an integrity
    /// failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let sink = JsonlSink::open(path.as_ref())?;
        let entries = sink.entries()?;
        let meta = sink.read_meta()?;

        let Some(last) = entries.last() else {
            if let Some(meta) = meta.filter(|m| m.entry_count > 0) {
                return Err(GovernanceError::Integrity {
                    sequence: 0,
                    reason: format!("ledger is empty but metadata records {} entries", meta.entry_count),
                });
            }
            return Self::bootstrap(Box::new(sink));
        };

        if !last.hash_matches()? {
            return Err(GovernanceError::Integrity {
                sequence: last.sequence,
                reason: "last entry hash does not match its contents".to_string(),
            });
        }
        let meta = meta.ok_or_else(|| GovernanceError::Integrity {
            sequence: last.sequence,
            reason: "ledger metadata missing".to_string(),
        })?;
        if meta.last_hash != last.entry_hash {
            return Err(GovernanceError::Integrity {
                sequence: last.sequence,
                reason: "last hash differs from metadata".to_string(),
            });
        }
        if meta.entry_count != entries.len() as u64 {
            return Err(GovernanceError::Integrity {
                sequence: last.sequence,
                reason: format!(
                    "metadata records {} entries, log holds {}",
                    meta.entry_count,
                    entries.len()
                ),
            });
        }

        info!(path = %path.as_ref().display(), entries = entries.len(), "audit ledger opened");
        Ok(Self {
            state: RwLock::new(LedgerState {
                last_hash: last.entry_hash.clone(),
                next_sequence: last.sequence + 1,
                sink: Box::new(sink),
            }),
            compromised: AtomicBool::new(false),
        })
    }

    /// JSONL ledger when `ledger_path` is set, in-memory otherwise.
    pub fn from_config(config: &GovernanceConfig) -> Result<Self> {
        match &config.ledger_path {
            Some(path) => Self::open(path),
            None => Self::in_memory(),
        }
    }

    fn bootstrap(sink: Box<dyn LedgerSink>) -> Result<Self> {
        let ledger = Self {
            state: RwLock::new(LedgerState {
                sink,
                last_hash: GENESIS_HASH.to_string(),
                next_sequence: 0,
            }),
            compromised: AtomicBool::new(false),
        };
        ledger.append(BOOTSTRAP_ACTION, "system", json!({}), "OK")?;
        Ok(ledger)
    }

    fn append(&self, action: &str, actor: &str, details: Value, result: &str) -> Result<u64> {
        let mut state = self.state.write();
        let sequence = state.next_sequence;
        let entry = AuditEntry::seal(
            sequence,
            Utc::now(),
            action,
            actor,
            details,
            result,
            &state.last_hash,
        )?;
        state.sink.append(&entry)?;
        state.last_hash = entry.entry_hash;
        state.next_sequence += 1;
        drop(state);

        METRICS.inc_ledger_appends();
        obs::emit_ledger_appended(sequence, action, result);
        Ok(sequence)
    }

    /// Append an entry.
    pub fn log(&self, action: &str, actor: &str, details: Value, result: &str) -> Result<()> {
        self.append(action, actor, details, result).map(|_| ())
    }

    /// Gate every governed state change. Records the decision either way.
    pub fn authorize(&self, action: GovernedAction, actor: &str, mode: AccessMode) -> Result<AuthGrant> {
        if self.is_compromised() {
            return Err(GovernanceError::Integrity {
                sequence: self.entry_count().saturating_sub(1),
                reason: "ledger failed verification; authorizations suspended".to_string(),
            });
        }

        match policy::evaluate(action, mode) {
            PolicyDecision::Allow => {
                let seq = self.append(action.as_str(), actor, json!({"mode": mode}), "AUTHORIZED")?;
                debug!(action = %action, actor = %actor, "authorized");
                Ok(AuthGrant::new(action, actor, seq))
            }
            PolicyDecision::Deny(reason) => {
                self.append(
                    action.as_str(),
                    actor,
                    json!({"mode": mode, "reason": reason}),
                    "DENIED",
                )?;
                METRICS.inc_denials();
                obs::emit_gate_denied(action.as_str(), actor, &reason);
                Err(GovernanceError::policy(action.as_str(), reason))
            }
        }
    }

    /// Walk the whole chain from the first entry.
    ///
    /// A failed walk marks the ledger compromised: later calls to
    /// [`authorize`](Self::authorize) return an integrity error.
    pub fn verify_integrity(&self) -> IntegrityReport {
        let report = {
            let state = self.state.read();
            match state.sink.entries() {
                Ok(entries) => walk_chain(&entries),
                Err(e) => IntegrityReport {
                    valid: false,
                    entry_count: state.next_sequence,
                    first_invalid: match &e {
                        GovernanceError::Integrity { sequence, .. } => Some(*sequence),
                        _ => None,
                    },
                    error: Some(e.to_string()),
                },
            }
        };
        if !report.valid {
            self.compromised.store(true, Ordering::SeqCst);
        }
        obs::emit_ledger_verified(report.valid, report.entry_count, report.first_invalid);
        report
    }

    /// The last `n` entries, oldest first.
    pub fn read_log(&self, n: usize) -> Result<Vec<AuditEntry>> {
        self.state.read().sink.tail(n)
    }

    pub fn entry_count(&self) -> u64 {
        self.state.read().next_sequence
    }

    pub fn last_hash(&self) -> String {
        self.state.read().last_hash.clone()
    }

    pub fn is_compromised(&self) -> bool {
        self.compromised.load(Ordering::SeqCst)
    }
}

fn walk_chain(entries: &[AuditEntry]) -> IntegrityReport {
    let mut prior = GENESIS_HASH.to_string();
    for (index, entry) in entries.iter().enumerate() {
        let problem = if entry.sequence != index as u64 {
            Some(format!("expected sequence {index}, found {}", entry.sequence))
        } else if entry.prior_hash != prior {
            Some("prior hash does not link to previous entry".to_string())
        } else {
            match entry.hash_matches() {
                Ok(true) => None,
                Ok(false) => Some("entry hash mismatch".to_string()),
                Err(e) => Some(e.to_string()),
            }
        };
        if let Some(reason) = problem {
            return IntegrityReport {
                valid: false,
                entry_count: entries.len() as u64,
                first_invalid: Some(index as u64),
                error: Some(reason),
            };
        }
        prior = entry.entry_hash.clone();
    }
    IntegrityReport {
        valid: true,
        entry_count: entries.len() as u64,
        first_invalid: None,
        error: None,
    }
}
