//! Process-wide observability counters.
//!
//! These never feed a governance decision. The approval ratio that trips the
//! circuit breaker lives in the injected [`crate::governor::ApprovalGovernor`].

use std::sync::atomic::{AtomicU64, Ordering};

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    signals_validated: AtomicU64,
    approvals_granted: AtomicU64,
    authorizations_denied: AtomicU64,
    ledger_appends: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            signals_validated: AtomicU64::new(0),
            approvals_granted: AtomicU64::new(0),
            authorizations_denied: AtomicU64::new(0),
            ledger_appends: AtomicU64::new(0),
        }
    }

    pub fn inc_signals_validated(&self) {
        self.signals_validated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "signals_validated", "counter incremented");
    }

    pub fn inc_approvals(&self) {
        self.approvals_granted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "approvals_granted", "counter incremented");
    }

    pub fn inc_denials(&self) {
        self.authorizations_denied.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "authorizations_denied", "counter incremented");
    }

    pub fn inc_ledger_appends(&self) {
        self.ledger_appends.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all counters as one `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            signals_validated = self.signals_validated(),
            approvals_granted = self.approvals_granted(),
            authorizations_denied = self.authorizations_denied(),
            ledger_appends = self.ledger_appends(),
        );
    }

    pub fn signals_validated(&self) -> u64 {
        self.signals_validated.load(Ordering::Relaxed)
    }

    pub fn approvals_granted(&self) -> u64 {
        self.approvals_granted.load(Ordering::Relaxed)
    }

    pub fn authorizations_denied(&self) -> u64 {
        self.authorizations_denied.load(Ordering::Relaxed)
    }

    pub fn ledger_appends(&self) -> u64 {
        self.ledger_appends.load(Ordering::Relaxed)
    }

    /// Zero every counter (tests only).
    pub fn reset(&self) {
        self.signals_validated.store(0, Ordering::Relaxed);
        self.approvals_granted.store(0, Ordering::Relaxed);
        self.authorizations_denied.store(0, Ordering::Relaxed);
        self.ledger_appends.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_and_reset() {
        let m = Metrics::new();
        m.inc_signals_validated();
        m.inc_signals_validated();
        m.inc_denials();
        m.inc_ledger_appends();
        assert_eq!(m.signals_validated(), 2);
        assert_eq!(m.authorizations_denied(), 1);
        assert_eq!(m.approvals_granted(), 0);
        assert_eq!(m.ledger_appends(), 1);

        m.reset();
        assert_eq!(m.signals_validated(), 0);
        assert_eq!(m.ledger_appends(), 0);
    }
}
