use rand::Rng;

use super::attempt::{AttemptSession, QuizAttempt};
use super::error::{QuizError, Result};
use super::{Question, QuestionId, Quiz, QuizId};

/// In-memory collection of every quiz created during the session.
///
/// A quiz is either unpublished (editable) or published (can be taken);
/// the partition is the quiz's own `is_published` flag.
#[derive(Debug, Default)]
pub struct QuizRegistry {
    quizzes: Vec<Quiz>,
}

impl QuizRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_quiz(&mut self, id: QuizId, title: impl Into<String>) -> Result<&Quiz> {
        if self.get(id).is_some() {
            return Err(QuizError::DuplicateId { entity: "Quiz", id });
        }
        let quiz = Quiz::new(id, title);
        log::info!("Created quiz {} ({:?})", quiz.id, quiz.title);
        self.quizzes.push(quiz);
        Ok(&self.quizzes[self.quizzes.len() - 1])
    }

    pub fn quizzes(&self) -> impl Iterator<Item = &Quiz> {
        self.quizzes.iter()
    }

    pub fn unpublished(&self) -> impl Iterator<Item = &Quiz> {
        self.quizzes.iter().filter(|quiz| !quiz.is_published())
    }

    pub fn published(&self) -> impl Iterator<Item = &Quiz> {
        self.quizzes.iter().filter(|quiz| quiz.is_published())
    }

    pub fn get(&self, id: QuizId) -> Option<&Quiz> {
        self.quizzes.iter().find(|quiz| quiz.id == id)
    }

    fn get_mut(&mut self, id: QuizId) -> Result<&mut Quiz> {
        self.quizzes
            .iter_mut()
            .find(|quiz| quiz.id == id)
            .ok_or_else(|| QuizError::quiz_not_found(id))
    }

    pub fn add_question(&mut self, quiz_id: QuizId, question: Question) -> Result<()> {
        let quiz = self.get_mut(quiz_id)?;
        log::debug!("Adding question {} to quiz {}", question.id(), quiz_id);
        quiz.add_question(question)
    }

    pub fn remove_question(&mut self, quiz_id: QuizId, question_id: QuestionId) -> Result<Question> {
        let removed = self.get_mut(quiz_id)?.remove_question(question_id)?;
        log::info!("Removed question {} from quiz {}", question_id, quiz_id);
        Ok(removed)
    }

    pub fn edit_prompt(&mut self, quiz_id: QuizId, question_id: QuestionId, prompt: &str) -> Result<()> {
        self.get_mut(quiz_id)?.edit_prompt(question_id, prompt)
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, quiz_id: QuizId, rng: &mut R) -> Result<()> {
        self.get_mut(quiz_id)?.shuffle(rng)?;
        log::info!("Shuffled questions of quiz {}", quiz_id);
        Ok(())
    }

    pub fn publish(&mut self, quiz_id: QuizId) -> Result<()> {
        let quiz = self.get_mut(quiz_id)?;
        quiz.publish()?;
        log::info!("Published quiz {}", quiz_id);
        log::debug!(
            "Published quiz contents: {}",
            serde_json::to_string(&*quiz).unwrap_or_default()
        );
        Ok(())
    }

    pub fn start_attempt(&mut self, quiz_id: QuizId) -> Result<AttemptSession<'_>> {
        AttemptSession::new(self.get_mut(quiz_id)?)
    }

    /// Attempt history of a published quiz.
    pub fn scores(&self, quiz_id: QuizId) -> Result<&[QuizAttempt]> {
        let quiz = self
            .get(quiz_id)
            .ok_or_else(|| QuizError::quiz_not_found(quiz_id))?;
        if !quiz.is_published() {
            return Err(QuizError::NotPublished(quiz_id));
        }
        Ok(quiz.attempts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Choice;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(id: QuestionId, points: u32) -> Question {
        Question::multiple_response(
            id,
            format!("Question {}", id),
            points,
            vec![Choice::new("right", true), Choice::new("wrong", false)],
        )
        .unwrap()
    }

    fn ids<'a>(quizzes: impl Iterator<Item = &'a Quiz>) -> Vec<QuizId> {
        quizzes.map(|quiz| quiz.id).collect()
    }

    #[test]
    fn create_refuses_duplicate_ids() {
        let mut registry = QuizRegistry::new();
        assert_eq!(registry.create_quiz(1, "First").unwrap().title, "First");
        assert!(matches!(
            registry.create_quiz(1, "Again"),
            Err(QuizError::DuplicateId { id: 1, .. })
        ));
        assert_eq!(registry.get(1).unwrap().title, "First");
    }

    #[test]
    fn every_quiz_is_in_exactly_one_partition() {
        let mut registry = QuizRegistry::new();
        registry.create_quiz(1, "One").unwrap();
        registry.create_quiz(2, "Two").unwrap();
        registry.create_quiz(3, "Three").unwrap();
        registry.publish(2).unwrap();

        assert_eq!(ids(registry.unpublished()), vec![1, 3]);
        assert_eq!(ids(registry.published()), vec![2]);
        assert_eq!(ids(registry.quizzes()), vec![1, 2, 3]);
    }

    #[test]
    fn publish_is_one_way() {
        let mut registry = QuizRegistry::new();
        registry.create_quiz(1, "One").unwrap();
        registry.publish(1).unwrap();
        assert!(matches!(registry.publish(1), Err(QuizError::AlreadyPublished(1))));
        assert!(matches!(
            registry.publish(5),
            Err(QuizError::NotFound { id: 5, .. })
        ));
    }

    #[test]
    fn mutations_require_an_unpublished_quiz() {
        let mut registry = QuizRegistry::new();
        registry.create_quiz(1, "One").unwrap();
        registry.add_question(1, question(10, 5)).unwrap();
        registry.publish(1).unwrap();

        assert!(matches!(
            registry.add_question(1, question(11, 5)),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(
            registry.remove_question(1, 10),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(
            registry.edit_prompt(1, 10, "changed"),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert!(matches!(
            registry.shuffle(1, &mut StdRng::seed_from_u64(3)),
            Err(QuizError::AlreadyPublished(1))
        ));
        assert_eq!(registry.get(1).unwrap().maximum_score(), 5);
    }

    #[test]
    fn operations_on_unknown_quiz_are_not_found() {
        let mut registry = QuizRegistry::new();
        assert!(matches!(
            registry.add_question(4, question(1, 1)),
            Err(QuizError::NotFound { id: 4, .. })
        ));
        assert!(matches!(
            registry.start_attempt(4),
            Err(QuizError::NotFound { id: 4, .. })
        ));
        assert!(matches!(
            registry.scores(4),
            Err(QuizError::NotFound { id: 4, .. })
        ));
    }

    #[test]
    fn attempts_and_scores_need_a_published_quiz() {
        let mut registry = QuizRegistry::new();
        registry.create_quiz(1, "One").unwrap();
        registry.add_question(1, question(10, 5)).unwrap();
        registry.add_question(1, question(11, 5)).unwrap();
        assert!(matches!(registry.start_attempt(1), Err(QuizError::NotPublished(1))));
        assert!(matches!(registry.scores(1), Err(QuizError::NotPublished(1))));

        registry.publish(1).unwrap();
        let mut session = registry.start_attempt(1).unwrap();
        session.answer(&["0"]).unwrap();
        session.answer(&["0", "1"]).unwrap();
        session.finish().unwrap();

        let scores = registry.scores(1).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].question_scores, vec![5, 0]);
        assert_eq!(scores[0].total_score, 5);
        assert_eq!(registry.get(1).unwrap().maximum_score(), 10);
    }

    #[test]
    fn remove_and_edit_go_through_to_the_quiz() {
        let mut registry = QuizRegistry::new();
        registry.create_quiz(1, "One").unwrap();
        registry.add_question(1, question(10, 3)).unwrap();
        registry.add_question(1, question(11, 4)).unwrap();

        registry.edit_prompt(1, 11, "Edited").unwrap();
        assert_eq!(registry.get(1).unwrap().question(11).unwrap().prompt(), "Edited");

        assert_eq!(registry.remove_question(1, 10).unwrap().id(), 10);
        assert_eq!(registry.get(1).unwrap().maximum_score(), 4);
        assert!(matches!(
            registry.remove_question(1, 10),
            Err(QuizError::NotFound { id: 10, .. })
        ));
    }
}
