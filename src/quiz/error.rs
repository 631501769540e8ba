use thiserror::Error;

use super::{QuestionId, QuizId};

pub type Result<T> = std::result::Result<T, QuizError>;

/// Everything that can go wrong inside the quiz core.
///
/// None of these are fatal: the console renders them and returns to the menu.
#[derive(Debug, Error)]
pub enum QuizError {
    /// A stored field or an operator value could not be converted.
    #[error("Could not parse {what}: {value:?}")]
    Parse { what: &'static str, value: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u32 },

    #[error("{entity} with id {id} already exists")]
    DuplicateId { entity: &'static str, id: u32 },

    #[error("Quiz {0} is already published")]
    AlreadyPublished(QuizId),

    #[error("Quiz {0} is not published yet")]
    NotPublished(QuizId),

    /// Authoring input that cannot be represented in the store format.
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Attempt is incomplete: {answered} of {total} questions answered")]
    AttemptIncomplete { answered: usize, total: usize },

    #[error("Question store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl QuizError {
    pub(crate) fn parse(what: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            what,
            value: value.into(),
        }
    }

    pub(crate) fn question_not_found(id: QuestionId) -> Self {
        Self::NotFound {
            entity: "Question",
            id,
        }
    }

    pub(crate) fn quiz_not_found(id: QuizId) -> Self {
        Self::NotFound { entity: "Quiz", id }
    }
}
