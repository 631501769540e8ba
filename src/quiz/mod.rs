pub mod attempt;
pub mod error;
pub mod question;
pub mod registry;
pub mod store;

use rand::Rng;

pub use attempt::{AttemptSession, QuizAttempt};
pub use error::{QuizError, Result};
pub use question::{Choice, Question, QuestionKind};
pub use registry::QuizRegistry;
pub use store::QuestionStore;

pub type QuestionId = u32;
pub type QuizId = u32;

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Quiz {
    pub id: QuizId,
    pub title: String,
    maximum_score: u64,
    is_published: bool,
    questions: Vec<Question>,
    attempts: Vec<QuizAttempt>,
}

impl Quiz {
    pub fn new(id: QuizId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sum of the points of every question currently in the quiz. Kept wider
    /// than a single question's points so the sum cannot overflow.
    pub fn maximum_score(&self) -> u64 {
        self.maximum_score
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn attempts(&self) -> &[QuizAttempt] {
        &self.attempts
    }

    pub fn question(&self, question_id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == question_id)
    }

    pub fn add_question(&mut self, question: Question) -> Result<()> {
        self.ensure_unpublished()?;
        self.maximum_score += u64::from(question.points());
        self.questions.push(question);
        Ok(())
    }

    /// Removes the first question with `question_id` and hands it back.
    pub fn remove_question(&mut self, question_id: QuestionId) -> Result<Question> {
        self.ensure_unpublished()?;
        let position = self
            .questions
            .iter()
            .position(|q| q.id() == question_id)
            .ok_or_else(|| QuizError::question_not_found(question_id))?;
        let removed = self.questions.remove(position);
        self.maximum_score -= u64::from(removed.points());
        Ok(removed)
    }

    pub fn edit_prompt(&mut self, question_id: QuestionId, prompt: &str) -> Result<()> {
        self.ensure_unpublished()?;
        self.questions
            .iter_mut()
            .find(|q| q.id() == question_id)
            .ok_or_else(|| QuizError::question_not_found(question_id))?
            .set_prompt(prompt)
    }

    /// Fisher-Yates: walks from the last index down to 1 and swaps each slot
    /// with a uniformly chosen slot at or before it.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        self.ensure_unpublished()?;
        for i in (1..self.questions.len()).rev() {
            let j = rng.gen_range(0..=i);
            self.questions.swap(i, j);
        }
        Ok(())
    }

    /// One-way transition; a published quiz only ever gains attempts.
    pub fn publish(&mut self) -> Result<()> {
        self.ensure_unpublished()?;
        self.is_published = true;
        Ok(())
    }

    pub(crate) fn push_attempt(&mut self, attempt: QuizAttempt) -> &QuizAttempt {
        self.attempts.push(attempt);
        &self.attempts[self.attempts.len() - 1]
    }

    fn ensure_unpublished(&self) -> Result<()> {
        if self.is_published {
            return Err(QuizError::AlreadyPublished(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn mcq(id: QuestionId, points: u32) -> Question {
        Question::multiple_choice(id, format!("Q{}", id), points, vec!["a".into(), "b".into()], 0)
            .unwrap()
    }

    fn quiz_with(ids: &[QuestionId]) -> Quiz {
        let mut quiz = Quiz::new(1, "Sample");
        for id in ids {
            quiz.add_question(mcq(*id, *id)).unwrap();
        }
        quiz
    }

    fn order(quiz: &Quiz) -> Vec<QuestionId> {
        quiz.questions().iter().map(|q| q.id()).collect()
    }

    #[test]
    fn add_then_remove_restores_maximum_score() {
        let mut quiz = quiz_with(&[2, 3]);
        assert_eq!(quiz.maximum_score(), 5);

        quiz.add_question(mcq(7, 7)).unwrap();
        assert_eq!(quiz.maximum_score(), 12);

        let removed = quiz.remove_question(7).unwrap();
        assert_eq!(removed.id(), 7);
        assert_eq!(quiz.maximum_score(), 5);
        assert_eq!(order(&quiz), vec![2, 3]);
    }

    #[test]
    fn maximum_score_holds_sums_beyond_a_single_question() {
        let mut quiz = Quiz::new(1, "Heavy");
        quiz.add_question(mcq(1, u32::MAX)).unwrap();
        quiz.add_question(mcq(2, u32::MAX)).unwrap();
        quiz.add_question(mcq(3, 1)).unwrap();
        assert_eq!(quiz.maximum_score(), 2 * u64::from(u32::MAX) + 1);

        quiz.remove_question(2).unwrap();
        assert_eq!(quiz.maximum_score(), u64::from(u32::MAX) + 1);
        quiz.remove_question(1).unwrap();
        quiz.remove_question(3).unwrap();
        assert_eq!(quiz.maximum_score(), 0);
    }

    #[test]
    fn serializes_to_json() {
        let mut quiz = quiz_with(&[4]);
        quiz.publish().unwrap();
        let json: serde_json::Value = serde_json::to_value(&quiz).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Sample");
        assert_eq!(json["maximum_score"], 4);
        assert_eq!(json["is_published"], true);
        assert_eq!(json["questions"][0]["prompt"], "Q4");
        assert!(json["attempts"].as_array().unwrap().is_empty());
    }

    #[test]
    fn remove_missing_question_is_not_found() {
        let mut quiz = quiz_with(&[1]);
        let err = quiz.remove_question(42).unwrap_err();
        assert!(matches!(err, QuizError::NotFound { id: 42, .. }));
        assert_eq!(quiz.maximum_score(), 1);
    }

    #[test]
    fn remove_takes_first_duplicate_only() {
        let mut quiz = quiz_with(&[4, 4]);
        quiz.remove_question(4).unwrap();
        assert_eq!(order(&quiz), vec![4]);
        assert_eq!(quiz.maximum_score(), 4);
    }

    #[test]
    fn published_quiz_is_read_only() {
        let mut quiz = quiz_with(&[1, 2]);
        quiz.publish().unwrap();

        assert!(matches!(
            quiz.add_question(mcq(3, 3)),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(
            quiz.remove_question(1),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(
            quiz.edit_prompt(1, "new"),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(
            quiz.shuffle(&mut StdRng::seed_from_u64(1)),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(quiz.publish(), Err(QuizError::AlreadyPublished(1))));
        assert_eq!(quiz.maximum_score(), 3);
    }

    #[test]
    fn edit_prompt_changes_only_the_target() {
        let mut quiz = quiz_with(&[1, 2]);
        quiz.edit_prompt(2, "Renamed").unwrap();
        assert_eq!(quiz.question(2).unwrap().prompt(), "Renamed");
        assert_eq!(quiz.question(1).unwrap().prompt(), "Q1");
        assert!(matches!(
            quiz.edit_prompt(9, "x"),
            Err(QuizError::NotFound { id: 9, .. })
        ));
    }

    #[test]
    fn shuffle_keeps_every_question() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut quiz = quiz_with(&[1, 2, 3, 4, 5, 6, 7, 8]);
        for _ in 0..50 {
            quiz.shuffle(&mut rng).unwrap();
            let mut ids = order(&quiz);
            ids.sort_unstable();
            assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        }
        assert_eq!(quiz.maximum_score(), 36);
    }

    #[test]
    fn shuffle_of_tiny_quizzes_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut empty = Quiz::new(1, "Empty");
        empty.shuffle(&mut rng).unwrap();
        assert!(empty.questions().is_empty());

        let mut single = quiz_with(&[5]);
        single.shuffle(&mut rng).unwrap();
        assert_eq!(order(&single), vec![5]);
    }

    #[test]
    fn shuffle_is_uniform_over_permutations() {
        let mut rng = StdRng::seed_from_u64(2024);
        let trials = 60_000;
        let mut seen: HashMap<Vec<QuestionId>, u32> = HashMap::new();
        for _ in 0..trials {
            let mut quiz = quiz_with(&[1, 2, 3]);
            quiz.shuffle(&mut rng).unwrap();
            *seen.entry(order(&quiz)).or_default() += 1;
        }

        assert_eq!(seen.len(), 6);
        let expected = trials as f64 / 6.0;
        for (permutation, count) in seen {
            let deviation = (count as f64 - expected).abs() / expected;
            assert!(
                deviation < 0.05,
                "{:?} seen {} times, expected about {}",
                permutation,
                count,
                expected
            );
        }
    }
}
