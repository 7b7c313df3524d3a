use chrono::{DateTime, Utc};
use serde::Serialize;

use super::evaluator::{InterviewEvaluator, QuestionResult};
use super::questions::{mandatory_questions, Question};
use crate::config::GovernanceConfig;
use crate::domain::error::{Governed, LifecycleError};
use crate::domain::{AgentId, AgentMode};
use crate::obs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    InProgress,
    Eliminated,
    Complete,
}

/// What happened after one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerOutcome {
    NextQuestion,
    Eliminated,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerReport {
    pub result: QuestionResult,
    pub outcome: AnswerOutcome,
    pub next_question: Option<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewVerdict {
    pub passed: bool,
    pub score: f64,
    pub questions_total: usize,
    pub questions_passed: usize,
    pub elimination_reason: Option<String>,
}

/// One candidate's questionnaire, answered one question at a time.
///
/// Human candidates continue after a low score; automated candidates end
/// the session on the first failed question.
#[derive(Debug)]
pub struct InterviewSession {
    candidate: AgentId,
    evaluator: InterviewEvaluator,
    questions: Vec<Question>,
    current: usize,
    active: bool,
    eliminated: bool,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    results: Vec<QuestionResult>,
}

impl InterviewSession {
    /// Session over the mandatory question list.
    pub fn start(candidate: AgentId, mode: AgentMode, config: &GovernanceConfig) -> Self {
        Self::with_questions(candidate, mode, config, mandatory_questions())
    }

    pub fn with_questions(
        candidate: AgentId,
        mode: AgentMode,
        config: &GovernanceConfig,
        questions: Vec<Question>,
    ) -> Self {
        let active = !questions.is_empty();
        Self {
            candidate,
            evaluator: InterviewEvaluator::new(mode, config),
            questions,
            current: 0,
            active,
            eliminated: false,
            started_at: Utc::now(),
            finished_at: (!active).then(Utc::now),
            results: Vec::new(),
        }
    }

    pub fn candidate(&self) -> &AgentId {
        &self.candidate
    }

    pub fn mode(&self) -> AgentMode {
        self.evaluator.mode()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> SessionState {
        if self.active {
            SessionState::InProgress
        } else if self.eliminated {
            SessionState::Eliminated
        } else {
            SessionState::Complete
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.active {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    pub fn questions_remaining(&self) -> usize {
        if self.active {
            self.questions.len() - self.current
        } else {
            0
        }
    }

    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Score the answer to the current question and advance.
    pub fn submit_answer(&mut self, answer: &str) -> Governed<AnswerReport> {
        let Some(question) = self.current_question() else {
            return Err(LifecycleError::InterviewClosed(self.candidate.clone()));
        };
        let mut result = self.evaluator.evaluate(question, answer);

        if !result.eliminated && !result.passed && self.mode() == AgentMode::Llm {
            result.eliminated = true;
            result
                .reasons
                .push("zero tolerance: a single failed question ends the interview".to_string());
        }
        obs::emit_interview_answered(&result.question_id, result.score, result.passed, result.eliminated);

        let outcome = if result.eliminated {
            self.eliminated = true;
            self.finish();
            AnswerOutcome::Eliminated
        } else {
            self.current += 1;
            if self.current >= self.questions.len() {
                self.finish();
                AnswerOutcome::Complete
            } else {
                AnswerOutcome::NextQuestion
            }
        };
        self.results.push(result.clone());

        Ok(AnswerReport {
            result,
            outcome,
            next_question: self.current_question().cloned(),
        })
    }

    /// Answer every remaining question in order. `responses` is positional
    /// over the full question list; a missing answer counts as empty.
    pub fn run_batch<S: AsRef<str>>(&mut self, responses: &[S]) -> Governed<InterviewVerdict> {
        if !self.active {
            return Err(LifecycleError::InterviewClosed(self.candidate.clone()));
        }
        while self.active {
            let answer = responses.get(self.current).map(|s| s.as_ref()).unwrap_or("");
            self.submit_answer(answer)?;
        }
        Ok(self.verdict())
    }

    fn finish(&mut self) {
        self.active = false;
        self.finished_at = Some(Utc::now());
    }

    /// Overall result so far.
    pub fn verdict(&self) -> InterviewVerdict {
        let questions_passed = self.results.iter().filter(|r| r.passed).count();
        if let Some(elim) = self.results.iter().find(|r| r.eliminated) {
            return InterviewVerdict {
                passed: false,
                score: 0.0,
                questions_total: self.results.len(),
                questions_passed,
                elimination_reason: Some(format!("{}: {}", elim.question_id, elim.reasons.join("; "))),
            };
        }
        if self.results.is_empty() {
            return InterviewVerdict {
                passed: false,
                score: 0.0,
                questions_total: 0,
                questions_passed: 0,
                elimination_reason: None,
            };
        }

        let mean = self.results.iter().map(|r| r.score as f64).sum::<f64>() / self.results.len() as f64;
        let all_passed = questions_passed == self.results.len();
        InterviewVerdict {
            passed: all_passed
                && self.results.len() == self.questions.len()
                && mean >= self.evaluator.pass_score() as f64,
            score: (mean * 10.0).round() / 10.0,
            questions_total: self.results.len(),
            questions_passed,
            elimination_reason: None,
        }
    }
}
