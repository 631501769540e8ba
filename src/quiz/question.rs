use std::collections::HashSet;

use super::error::{QuizError, Result};
use super::QuestionId;

/// One option of a multiple-response question.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Choice {
    pub text: String,
    pub is_correct: bool,
}
impl Choice {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum QuestionKind {
    /// Exactly one of `choices` is correct.
    MultipleChoice {
        choices: Vec<String>,
        correct_index: usize,
    },
    /// Any number of choices may be correct, graded all-or-nothing.
    MultipleResponse { choices: Vec<Choice> },
}

/// Only the validating constructors build a question, so every instance
/// can be written to the store as a single line.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    points: u32,
    kind: QuestionKind,
}

impl Question {
    /// Builds a multiple-choice question, checking that it can be written to the store.
    pub fn multiple_choice(
        id: QuestionId,
        prompt: impl Into<String>,
        points: u32,
        choices: Vec<String>,
        correct_index: usize,
    ) -> Result<Self> {
        let prompt = prompt.into();
        validate_text("prompt", &prompt, &[])?;
        if choices.is_empty() {
            return Err(QuizError::InvalidField {
                field: "choices",
                reason: "at least one choice is required".to_string(),
            });
        }
        for choice in &choices {
            validate_text("choice", choice, &[])?;
        }
        if correct_index >= choices.len() {
            return Err(QuizError::InvalidField {
                field: "correct answer",
                reason: format!(
                    "index {} is outside of {} choices",
                    correct_index,
                    choices.len()
                ),
            });
        }

        Ok(Self {
            id,
            prompt,
            points,
            kind: QuestionKind::MultipleChoice {
                choices,
                correct_index,
            },
        })
    }

    /// Builds a multiple-response question. Choice text may not contain `,`
    /// since the store keeps each choice as a `text,bool` pair.
    pub fn multiple_response(
        id: QuestionId,
        prompt: impl Into<String>,
        points: u32,
        choices: Vec<Choice>,
    ) -> Result<Self> {
        let prompt = prompt.into();
        validate_text("prompt", &prompt, &[])?;
        if choices.is_empty() {
            return Err(QuizError::InvalidField {
                field: "choices",
                reason: "at least one choice is required".to_string(),
            });
        }
        for choice in &choices {
            validate_text("choice", &choice.text, &[','])?;
        }

        Ok(Self {
            id,
            prompt,
            points,
            kind: QuestionKind::MultipleResponse { choices },
        })
    }

    pub fn id(&self) -> QuestionId {
        self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    pub fn is_multiple_choice(&self) -> bool {
        matches!(self.kind, QuestionKind::MultipleChoice { .. })
    }

    pub fn is_multiple_response(&self) -> bool {
        matches!(self.kind, QuestionKind::MultipleResponse { .. })
    }

    /// Choice texts in presentation order, regardless of the variant.
    pub fn choice_texts(&self) -> Vec<&str> {
        match &self.kind {
            QuestionKind::MultipleChoice { choices, .. } => {
                choices.iter().map(String::as_str).collect()
            }
            QuestionKind::MultipleResponse { choices } => {
                choices.iter().map(|c| c.text.as_str()).collect()
            }
        }
    }

    /// Replaces the prompt, with the same restrictions as authoring.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<()> {
        let prompt = prompt.into();
        validate_text("prompt", &prompt, &[])?;
        self.prompt = prompt;
        Ok(())
    }

    /// Scores a selection. Returns either `points` or 0, never anything in between.
    ///
    /// Multiple-choice tokens are 1-based, multiple-response tokens are 0-based.
    /// Malformed selections score 0 rather than failing.
    pub fn check_answer<S: AsRef<str>>(&self, selection: &[S]) -> u32 {
        match &self.kind {
            QuestionKind::MultipleChoice {
                choices,
                correct_index,
            } => {
                if selection.len() != 1 {
                    return 0;
                }
                let picked = match selection[0].as_ref().trim().parse::<usize>() {
                    Ok(n) if (1..=choices.len()).contains(&n) => n - 1,
                    _ => return 0,
                };
                if picked == *correct_index {
                    self.points
                } else {
                    0
                }
            }
            QuestionKind::MultipleResponse { choices } => {
                let mut picked = HashSet::new();
                for token in selection {
                    match token.as_ref().trim().parse::<usize>() {
                        Ok(i) if i < choices.len() => {
                            if !choices[i].is_correct {
                                return 0;
                            }
                            picked.insert(i);
                        }
                        _ => return 0,
                    }
                }

                let all_correct_picked = choices
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.is_correct)
                    .all(|(i, _)| picked.contains(&i));
                if all_correct_picked {
                    self.points
                } else {
                    0
                }
            }
        }
    }
}

fn validate_text(field: &'static str, text: &str, extra: &[char]) -> Result<()> {
    let forbidden = text
        .chars()
        .find(|c| *c == ';' || *c == '\n' || *c == '\r' || extra.contains(c));
    match forbidden {
        Some(c) => Err(QuizError::InvalidField {
            field,
            reason: format!("{:?} may not contain {:?}", text, c),
        }),
        None => Ok(()),
    }
}
