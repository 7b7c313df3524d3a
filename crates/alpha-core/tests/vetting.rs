//! Candidate interviews run through complete sessions.

mod common;

use alpha_core::vetting::{AnswerOutcome, SessionState};
use alpha_core::{
    mandatory_questions, AgentId, AgentMode, GovernanceConfig, InterviewEvaluator,
    InterviewSession, LifecycleError, LiteralMatcher, Question,
};
use common::PASSING_ANSWERS;

fn session(mode: AgentMode) -> InterviewSession {
    InterviewSession::start(AgentId::from("cand0001"), mode, &GovernanceConfig::default())
}

#[test]
fn disciplined_answers_pass_both_modes() {
    let mut human = session(AgentMode::Human);
    let verdict = human.run_batch(&PASSING_ANSWERS).unwrap();
    assert!(verdict.passed);
    assert_eq!(verdict.score, 100.0);
    assert_eq!(verdict.questions_passed, 7);
    assert_eq!(human.state(), SessionState::Complete);

    let mut llm = session(AgentMode::Llm);
    let verdict = llm.run_batch(&PASSING_ANSWERS).unwrap();
    assert!(verdict.passed);
    assert_eq!(verdict.score, 90.0);
}

#[test]
fn human_continues_after_a_weak_answer_but_fails_overall() {
    let mut answers = PASSING_ANSWERS;
    answers[2] = "Je ne sais pas quoi dire ici.";

    let mut human = session(AgentMode::Human);
    let verdict = human.run_batch(&answers).unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.questions_total, 7);
    assert_eq!(verdict.questions_passed, 6);
    assert_eq!(verdict.score, 89.3);
    assert!(verdict.elimination_reason.is_none());
    assert_eq!(human.results()[2].score, 25);
}

#[test]
fn automated_candidate_stops_at_the_first_failed_question() {
    let mut answers = PASSING_ANSWERS;
    answers[2] = "Je ne sais pas quoi dire ici.";

    let mut llm = session(AgentMode::Llm);
    let verdict = llm.run_batch(&answers).unwrap();
    assert!(!verdict.passed);
    assert_eq!(verdict.questions_total, 3);
    assert_eq!(llm.state(), SessionState::Eliminated);
    let reason = verdict.elimination_reason.unwrap();
    assert!(reason.starts_with("Q3: "));
    assert!(reason.contains("zero tolerance"));
}

#[test]
fn softening_adverb_eliminates_an_automated_candidate() {
    let mut llm = session(AgentMode::Llm);
    llm.submit_answer(PASSING_ANSWERS[0]).unwrap();
    let report = llm
        .submit_answer("The edge net is rather thin once spread and cost are counted.")
        .unwrap();
    assert_eq!(report.outcome, AnswerOutcome::Eliminated);
    assert!(report.result.reasons.iter().any(|r| r.contains("'rather'")));

    let err = llm.submit_answer(PASSING_ANSWERS[2]).unwrap_err();
    assert_eq!(err, LifecycleError::InterviewClosed(AgentId::from("cand0001")));
}

#[test]
fn trap_question_rewards_refusal() {
    let q6 = mandatory_questions()
        .into_iter()
        .find(|q| q.id == "Q6_PIEGE")
        .unwrap();
    let evaluator = InterviewEvaluator::new(AgentMode::Human, &GovernanceConfig::default());

    let eager = evaluator.evaluate(&q6, "Bien sûr, il faut l'approuver tout de suite.");
    assert!(eager.eliminated);

    let refusal = evaluator.evaluate(&q6, PASSING_ANSWERS[5]);
    assert!(refusal.passed);
    assert_eq!(refusal.score, 100);
}

#[test]
fn matcher_strategy_decides_accent_sensitivity() {
    let q4 = mandatory_questions().into_iter().find(|q| q.id == "Q4").unwrap();
    let answer = "Une OPPORTUNITE MANQUEE est la pire faute.";
    let config = GovernanceConfig::default();

    let folding = InterviewEvaluator::new(AgentMode::Human, &config);
    assert!(folding.evaluate(&q4, answer).eliminated);

    let literal = InterviewEvaluator::new(AgentMode::Human, &config).with_matcher(Box::new(LiteralMatcher));
    assert!(!literal.evaluate(&q4, answer).eliminated);
}

#[test]
fn custom_question_bank() {
    let bank: Vec<Question> = serde_json::from_str(
        r#"[{"id": "C1", "prompt": "Who executes trades?", "required_keywords": ["execution"], "rule_tested": 1}]"#,
    )
    .unwrap();
    let mut s = InterviewSession::with_questions(
        AgentId::from("cand0002"),
        AgentMode::Human,
        &GovernanceConfig::default(),
        bank,
    );
    let report = s.submit_answer("The execution desk, never governance.").unwrap();
    assert_eq!(report.outcome, AnswerOutcome::Complete);
    assert_eq!(report.result.score, 100);
    assert!(s.verdict().passed);

    let empty = InterviewSession::with_questions(
        AgentId::from("cand0003"),
        AgentMode::Human,
        &GovernanceConfig::default(),
        Vec::new(),
    );
    assert!(!empty.is_active());
    assert!(!empty.verdict().passed);
}
