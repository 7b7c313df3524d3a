//! Rulebook validation of complete signals.

mod common;

use alpha_core::{
    AgentMode, DecisionCanonicalizer, GovernanceConfig, LiteralMatcher, RuleValidator,
    SignalStatus,
};
use common::{good_signal, weak_signal};

#[test]
fn weak_signal_reports_every_content_violation() {
    let validator = RuleValidator::default();
    let signal = weak_signal("S-8");
    let result = validator.validate(&signal);

    assert!(!result.valid);
    assert_eq!(result.resolved_status, SignalStatus::Rejected);
    assert_eq!(
        result.errors,
        vec![
            "rule 4: edge_net (0.1%) below minimum (0.5%)".to_string(),
            "rule 5: time_to_resolution (80h) exceeds maximum (72h)".to_string(),
            "rule 8: risks description too short (2 chars, minimum 10)".to_string(),
            "rule 8: comment too short to justify the signal (14 chars, minimum 20)".to_string(),
        ]
    );

    let clarity = validator.clarity_score(&signal);
    assert_eq!(clarity, 100);
    let decision = DecisionCanonicalizer.build(&signal, &result, clarity, false);
    assert_eq!(decision.status, SignalStatus::Rejected);
    assert_eq!(decision.rules_failed, vec![4, 5, 8]);
}

#[test]
fn injected_phrase_in_risks_is_caught() {
    let signal = good_signal("S-2").with("risks", "Spread could widen, probablement pas.");
    let result = RuleValidator::default().validate(&signal);
    assert_eq!(
        result.errors,
        vec!["rule 7: vague language detected: 'probablement'".to_string()]
    );
}

#[test]
fn accented_phrase_needs_folding() {
    let signal = good_signal("S-3").with(
        "comment",
        "Edge net confirme. Volume suffisant. Spread faible. Temps court. Risque controle, PEUT-ETRE.",
    );
    let folding = RuleValidator::default();
    assert!(!folding.validate(&signal).valid);

    let literal = RuleValidator::default().with_matcher(Box::new(LiteralMatcher));
    assert!(literal.validate(&signal).valid);
}

#[test]
fn thresholds_follow_configuration() {
    let signal = good_signal("S-4").with("edge_net", 0.8);
    assert!(RuleValidator::default().validate(&signal).valid);

    let strict = RuleValidator::new(GovernanceConfig {
        min_edge_net: 1.0,
        ..GovernanceConfig::default()
    });
    let result = strict.validate(&signal);
    assert_eq!(result.errors, vec!["rule 4: edge_net (0.8%) below minimum (1%)".to_string()]);
}

#[test]
fn non_numeric_metrics_are_violations() {
    let signal = good_signal("S-5")
        .with("edge_net", "a lot")
        .with("time_to_resolution", "soon");
    let result = RuleValidator::default().validate(&signal);
    assert!(result.errors.iter().any(|e| e.starts_with("rule 4: edge_net must be numeric")));
    assert!(result.errors.iter().any(|e| e.starts_with("rule 5: time_to_resolution must be numeric")));
}

#[test]
fn surveillance_resolves_when_valid() {
    let signal = good_signal("S-6").with("status", "SURVEILLANCE");
    let result = RuleValidator::default().validate_as(&signal, AgentMode::Llm);
    assert!(result.valid);
    assert_eq!(result.resolved_status, SignalStatus::Surveillance);
}

#[test]
fn non_positive_horizon_is_rejected() {
    for ttr in [serde_json::json!(0), serde_json::json!(-500), serde_json::json!("-0.5")] {
        let signal = good_signal("S-7").with("time_to_resolution", ttr.clone());
        let result = RuleValidator::default().validate(&signal);
        assert!(!result.valid, "{ttr} accepted");
        assert_eq!(result.resolved_status, SignalStatus::Rejected);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert!(result.errors[0].starts_with("rule 5: time_to_resolution"));
        assert!(result.errors[0].ends_with("must be positive"));

        let decision = DecisionCanonicalizer.build(&signal, &result, 100, false);
        assert_eq!(decision.status, SignalStatus::Rejected);
        assert_eq!(decision.rules_failed, vec![5]);
        assert!(decision.constraints.expiry >= decision.generated_at);
    }
}
