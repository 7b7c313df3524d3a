//! Per-answer scoring.
//!
//! Score = keywords (45) + sentence budget (25) + concepts (30). A forbidden
//! phrase, a question-specific forbidden keyword or, for automated
//! candidates, a strictness violation eliminates immediately with score 0.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::questions::Question;
use crate::config::GovernanceConfig;
use crate::domain::AgentMode;
use crate::language::{
    llm_strictness_violations, soft_hedge_patterns, FoldingMatcher, PhraseCatalog, TextMatcher,
};

const KEYWORD_POINTS: f64 = 45.0;
const SENTENCE_POINTS: i64 = 25;
const CONCEPT_POINTS: f64 = 30.0;
const MIN_ANSWER_CHARS: usize = 10;
const LLM_SCORE_FACTOR: f64 = 0.9;
const SOFT_HEDGE_PENALTY: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub score: u32,
    pub passed: bool,
    pub eliminated: bool,
    pub reasons: Vec<String>,
    pub answered_at: DateTime<Utc>,
}

impl QuestionResult {
    fn eliminated(question: &Question, reason: String) -> Self {
        Self {
            question_id: question.id.clone(),
            score: 0,
            passed: false,
            eliminated: true,
            reasons: vec![reason],
            answered_at: Utc::now(),
        }
    }
}

#[derive(Debug)]
pub struct InterviewEvaluator {
    mode: AgentMode,
    pass_score: u32,
    max_answer_words: usize,
    matcher: Box<dyn TextMatcher>,
}

impl InterviewEvaluator {
    pub fn new(mode: AgentMode, config: &GovernanceConfig) -> Self {
        Self {
            mode,
            pass_score: config.interview_pass_score(mode),
            max_answer_words: config.llm_max_answer_words,
            matcher: Box::new(FoldingMatcher),
        }
    }

    pub fn with_matcher(mut self, matcher: Box<dyn TextMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn pass_score(&self) -> u32 {
        self.pass_score
    }

    pub fn evaluate(&self, question: &Question, answer: &str) -> QuestionResult {
        let m = self.matcher.as_ref();

        if let Some(hit) = PhraseCatalog::for_mode(self.mode).scan(m, answer).first() {
            return QuestionResult::eliminated(question, format!("forbidden phrase: '{}'", hit.phrase));
        }
        if let Some(kw) = question.forbidden_keywords.iter().find(|kw| m.matches_phrase(answer, kw)) {
            return QuestionResult::eliminated(question, format!("forbidden answer keyword: '{kw}'"));
        }
        if self.mode == AgentMode::Llm {
            let violations = llm_strictness_violations(answer, self.max_answer_words);
            if !violations.is_empty() {
                let mut result = QuestionResult::eliminated(question, violations[0].clone());
                result.reasons = violations;
                return result;
            }
        }

        let mut reasons = Vec::new();
        let mut score: i64 = 0;

        if question.required_keywords.is_empty() {
            score += KEYWORD_POINTS as i64;
        } else {
            let found = question
                .required_keywords
                .iter()
                .filter(|kw| m.matches_phrase(answer, kw))
                .count();
            let ratio = found as f64 / question.required_keywords.len() as f64;
            score += (ratio * KEYWORD_POINTS).floor() as i64;
            if ratio < 0.5 {
                reasons.push(format!(
                    "too few keywords: {found}/{}",
                    question.required_keywords.len()
                ));
            }
        }

        let sentences = answer
            .split(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .count();
        if sentences <= question.max_sentences {
            score += SENTENCE_POINTS;
        } else {
            reasons.push(format!("too many sentences: {sentences} > {}", question.max_sentences));
        }

        if question.expected_concepts.is_empty() {
            score += CONCEPT_POINTS as i64;
        } else {
            let found = question
                .expected_concepts
                .iter()
                .filter(|c| m.matches_concept(answer, c))
                .count();
            let ratio = found as f64 / question.expected_concepts.len() as f64;
            score += (ratio * CONCEPT_POINTS).floor() as i64;
            if ratio < 0.5 {
                reasons.push(format!(
                    "too few concepts: {found}/{}",
                    question.expected_concepts.len()
                ));
            }
        }

        if answer.trim().chars().count() < MIN_ANSWER_CHARS {
            score = 0;
            reasons.push("answer too short or empty".to_string());
        }

        if self.mode == AgentMode::Llm {
            score = (score as f64 * LLM_SCORE_FACTOR) as i64;
            let lowered = answer.to_lowercase();
            for re in soft_hedge_patterns() {
                if re.is_match(&lowered) {
                    score -= SOFT_HEDGE_PENALTY;
                    reasons.push(format!("hedging: '{}'", re.as_str()));
                }
            }
        }

        let score = score.clamp(0, 100) as u32;
        let passed = score >= self.pass_score;
        if !passed && reasons.is_empty() {
            reasons.push(format!("score {score} below {}", self.pass_score));
        }

        QuestionResult {
            question_id: question.id.clone(),
            score,
            passed,
            eliminated: false,
            reasons,
            answered_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vetting::questions::mandatory_questions;

    fn q(id: &str) -> Question {
        mandatory_questions().into_iter().find(|q| q.id == id).unwrap()
    }

    fn human() -> InterviewEvaluator {
        InterviewEvaluator::new(AgentMode::Human, &GovernanceConfig::default())
    }

    #[test]
    fn catalog_phrase_eliminates() {
        let r = human().evaluate(&q("Q1"), "Je pense que le signal autorise un trade.");
        assert!(r.eliminated);
        assert_eq!(r.score, 0);
        assert!(r.reasons[0].contains("je pense"));
    }

    #[test]
    fn question_keyword_eliminates_after_folding() {
        let r = human().evaluate(&q("Q4"), "Une OPPORTUNITE MANQUEE est la pire faute.");
        assert!(r.eliminated);
        assert!(r.reasons[0].contains("opportunité manquée"));
    }

    #[test]
    fn short_answer_scores_zero() {
        let r = human().evaluate(&q("Q3"), "Temps.");
        assert_eq!(r.score, 0);
        assert!(!r.passed);
        assert!(!r.eliminated);
    }

    #[test]
    fn sentence_budget_costs_25() {
        let question = Question {
            id: "T".into(),
            prompt: "?".into(),
            required_keywords: vec![],
            forbidden_keywords: vec![],
            trap: false,
            max_sentences: 1,
            rule_tested: 1,
            expected_concepts: vec![],
        };
        let r = human().evaluate(&question, "Une phrase. Deux phrases.");
        assert_eq!(r.score, 75);
        assert!(r.reasons[0].contains("too many sentences"));
    }

    #[test]
    fn llm_hedging_eliminates() {
        let llm = InterviewEvaluator::new(AgentMode::Llm, &GovernanceConfig::default());
        let r = llm.evaluate(&q("Q3"), "Le temps est somewhat un risque de résolution tardif.");
        assert!(r.eliminated);
    }
}
