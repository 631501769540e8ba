use chrono::{DateTime, Utc};

use super::error::{QuizError, Result};
use super::{Question, Quiz};

/// One finished run through a published quiz.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QuizAttempt {
    pub created_at: DateTime<Utc>,
    /// Aligned with the quiz's question order at the time of the attempt.
    pub question_scores: Vec<u32>,
    pub total_score: u64,
}

/// An attempt in progress. Nothing reaches the quiz until [`AttemptSession::finish`];
/// dropping the session abandons the attempt.
pub struct AttemptSession<'a> {
    quiz: &'a mut Quiz,
    created_at: DateTime<Utc>,
    question_scores: Vec<u32>,
}

impl<'a> AttemptSession<'a> {
    pub(crate) fn new(quiz: &'a mut Quiz) -> Result<Self> {
        if !quiz.is_published() {
            return Err(QuizError::NotPublished(quiz.id));
        }
        let question_scores = Vec::with_capacity(quiz.questions().len());
        Ok(Self {
            quiz,
            created_at: Utc::now(),
            question_scores,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        self.quiz
    }

    /// Zero-based position of the question waiting for an answer.
    pub fn position(&self) -> usize {
        self.question_scores.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.quiz.questions().get(self.position())
    }

    pub fn is_complete(&self) -> bool {
        self.position() >= self.quiz.questions().len()
    }

    /// Grades the current question and moves on. Returns the points earned.
    pub fn answer<S: AsRef<str>>(&mut self, selection: &[S]) -> Result<u32> {
        let question = self.current_question().ok_or(QuizError::NotFound {
            entity: "Question at position",
            id: self.position() as u32,
        })?;
        let score = question.check_answer(selection);
        log::debug!(
            "Quiz {} question {} scored {}",
            self.quiz.id,
            question.id(),
            score
        );
        self.question_scores.push(score);
        Ok(score)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Commits the attempt to the quiz's history.
    pub fn finish(self) -> Result<&'a QuizAttempt> {
        let total = self.quiz.questions().len();
        if self.question_scores.len() < total {
            return Err(QuizError::AttemptIncomplete {
                answered: self.question_scores.len(),
                total,
            });
        }

        let attempt = QuizAttempt {
            created_at: self.created_at,
            total_score: self.question_scores.iter().map(|score| u64::from(*score)).sum(),
            question_scores: self.question_scores,
        };
        log::info!(
            "Quiz {} attempt finished with {} of {} points",
            self.quiz.id,
            attempt.total_score,
            self.quiz.maximum_score()
        );
        log::debug!(
            "Attempt record: {}",
            serde_json::to_string(&attempt).unwrap_or_default()
        );
        let quiz = self.quiz;
        Ok(quiz.push_attempt(attempt))
    }
}
