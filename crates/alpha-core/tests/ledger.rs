//! Audit ledger persistence, tamper detection and gate policy.

use std::sync::Arc;

use alpha_core::ledger::BOOTSTRAP_ACTION;
use alpha_core::{AccessMode, AuditLedger, GovernanceError, GovernedAction};
use serde_json::json;

fn meta_path(path: &std::path::Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".meta.json");
    os.into()
}

#[test]
fn reopened_ledger_continues_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit").join("ledger.jsonl");

    let last_hash = {
        let ledger = AuditLedger::open(&path).unwrap();
        ledger.log("note", "ops", json!({"n": 1}), "OK").unwrap();
        ledger.log("note", "ops", json!({"n": 2}), "OK").unwrap();
        assert_eq!(ledger.entry_count(), 3);
        ledger.last_hash()
    };
    assert!(meta_path(&path).exists());

    let ledger = AuditLedger::open(&path).unwrap();
    assert_eq!(ledger.entry_count(), 3);
    assert_eq!(ledger.last_hash(), last_hash);

    ledger.log("note", "ops", json!({"n": 3}), "OK").unwrap();
    let report = ledger.verify_integrity();
    assert!(report.valid, "{:?}", report.error);
    assert_eq!(report.entry_count, 4);

    let entries = ledger.read_log(100).unwrap();
    assert_eq!(entries[0].action, BOOTSTRAP_ACTION);
    assert_eq!(entries[3].prior_hash, entries[2].entry_hash);

    let lines = std::fs::read_to_string(&path).unwrap();
    assert_eq!(lines.lines().count(), 4);
}

#[test]
fn edited_history_is_detected_and_suspends_authorization() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    {
        let ledger = AuditLedger::open(&path).unwrap();
        for i in 0..4 {
            ledger.log("note", "ops", json!({"i": i}), "OK").unwrap();
        }
    }

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let mut entry: serde_json::Value = serde_json::from_str(&lines[2]).unwrap();
    entry["actor"] = json!("mallory");
    lines[2] = serde_json::to_string(&entry).unwrap();
    std::fs::write(&path, lines.join("\n") + "\n").unwrap();

    let ledger = AuditLedger::open(&path).unwrap();
    let report = ledger.verify_integrity();
    assert!(!report.valid);
    assert_eq!(report.first_invalid, Some(2));
    assert!(ledger.is_compromised());

    let err = ledger
        .authorize(GovernedAction::SubmitSignal, "ops", AccessMode::Standard)
        .unwrap_err();
    assert!(err.is_integrity());
}

#[test]
fn truncated_log_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    {
        let ledger = AuditLedger::open(&path).unwrap();
        ledger.log("note", "ops", json!({}), "OK").unwrap();
        ledger.log("note", "ops", json!({}), "OK").unwrap();
    }
    let text = std::fs::read_to_string(&path).unwrap();
    let kept: Vec<&str> = text.lines().take(2).collect();
    std::fs::write(&path, kept.join("\n") + "\n").unwrap();

    let err = AuditLedger::open(&path).unwrap_err();
    assert!(matches!(err, GovernanceError::Integrity { .. }));
}

#[test]
fn missing_metadata_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.jsonl");
    drop(AuditLedger::open(&path).unwrap());
    std::fs::remove_file(meta_path(&path)).unwrap();

    assert!(AuditLedger::open(&path).unwrap_err().is_integrity());
}

#[test]
fn concurrent_appends_keep_one_chain() {
    let ledger = Arc::new(AuditLedger::in_memory().unwrap());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for i in 0..25 {
                    ledger
                        .log("note", &format!("worker-{t}"), json!({"i": i}), "OK")
                        .unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let report = ledger.verify_integrity();
    assert!(report.valid);
    assert_eq!(report.entry_count, 201);
}

#[test]
fn restricted_mode_policy() {
    let ledger = AuditLedger::in_memory().unwrap();
    for action in [
        GovernedAction::ListAgents,
        GovernedAction::Export,
        GovernedAction::Replay,
        GovernedAction::ViewKpi,
        GovernedAction::ViewAuditLog,
    ] {
        ledger.authorize(action, "ops", AccessMode::Restricted).unwrap();
    }
    for action in [
        GovernedAction::ApproveSignal,
        GovernedAction::RecruitAgent,
        GovernedAction::ModifyAgent,
        GovernedAction::ExcludeAgent,
    ] {
        let err = ledger.authorize(action, "ops", AccessMode::Restricted).unwrap_err();
        assert!(matches!(err, GovernanceError::PolicyViolation { .. }), "{action}");
    }

    let err = ledger
        .authorize(GovernedAction::DisableAudit, "ops", AccessMode::Standard)
        .unwrap_err();
    assert!(err.to_string().contains("cannot be disabled"));

    // 1 bootstrap + 5 grants + 4 denials + 1 denial
    assert_eq!(ledger.entry_count(), 11);
    let denied = ledger
        .read_log(100)
        .unwrap()
        .into_iter()
        .filter(|e| e.result == "DENIED")
        .count();
    assert_eq!(denied, 5);
}
