//! Candidate vetting: an elimination-style interview run before an agent
//! may be activated.

pub mod evaluator;
pub mod questions;
pub mod session;

pub use evaluator::{InterviewEvaluator, QuestionResult};
pub use questions::{mandatory_questions, Question};
pub use session::{AnswerOutcome, AnswerReport, InterviewSession, InterviewVerdict, SessionState};
