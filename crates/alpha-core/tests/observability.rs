//! Structured events emitted by governed operations.

mod common;

use alpha_core::obs::{emit_gate_denied, emit_ledger_verified, AgentSpan};
use alpha_core::{AgentMode, CallContext, GovernanceOrchestrator};
use common::{good_signal, recruit, weak_signal};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn emitters_carry_event_names() {
    emit_gate_denied("approve_signal", "desk-1", "forbidden in restricted mode");
    emit_ledger_verified(false, 12, Some(4));
    assert!(logs_contain("gate.denied"));
    assert!(logs_contain("first_invalid=Some(4)"));
}

#[traced_test]
#[test]
fn agent_span_wraps_per_agent_events() {
    let _span = AgentSpan::enter("feedbeef");
    tracing::info!(event = "span.check");
    assert!(logs_contain("alpha.agent"));
    assert!(logs_contain("feedbeef"));
}

#[traced_test]
#[test]
fn submission_logs_validation_and_decision() {
    let orch = GovernanceOrchestrator::in_memory().unwrap();
    let id = recruit(&orch, "Ada", AgentMode::Human);
    orch.submit_signal(&id, weak_signal("S-1"), &CallContext::default())
        .unwrap()
        .unwrap();

    assert!(logs_contain("signal.validated"));
    assert!(logs_contain("decision.built"));
    assert!(logs_contain("status=REJECTED"));
    assert!(logs_contain("interview.concluded"));
}

#[traced_test]
#[test]
fn denials_and_breaker_are_logged() {
    let orch = GovernanceOrchestrator::in_memory().unwrap();
    let id = recruit(&orch, "Ada", AgentMode::Human);
    for i in 0..4 {
        orch.submit_signal(&id, weak_signal(&format!("W-{i}")), &CallContext::default())
            .unwrap()
            .unwrap();
    }
    orch.submit_signal(&id, good_signal("G-1"), &CallContext::default())
        .unwrap()
        .unwrap();
    assert!(logs_contain("governor.blocked"));

    orch.enter_restricted_mode(&CallContext::default()).unwrap();
    assert!(orch
        .submit_signal(&id, good_signal("G-2"), &CallContext::default())
        .is_err());
    assert!(logs_contain("gate.denied"));
    assert!(logs_contain("mode.restricted"));
}

#[traced_test]
#[test]
fn warnings_and_exclusion_are_logged() {
    let orch = GovernanceOrchestrator::in_memory().unwrap();
    let id = recruit(&orch, "Ada", AgentMode::Human);
    for _ in 0..3 {
        orch.issue_warning(&id, "late report", &CallContext::default())
            .unwrap()
            .unwrap();
    }
    assert!(logs_contain("agent.warned"));
    assert!(logs_contain("agent.excluded"));
}
