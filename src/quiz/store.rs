use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use super::error::{QuizError, Result};
use super::question::{Choice, Question, QuestionKind};
use super::{QuestionId, Quiz};

const FIELD_SEPARATOR: char = ';';
const CHOICE_SEPARATOR: char = ',';
const MULTIPLE_CHOICE_TAG: &str = "MCQ";
const MULTIPLE_RESPONSE_TAG: &str = "MRQ";

// tag;id;prompt;points;choice;correct_index
const MULTIPLE_CHOICE_MIN_FIELDS: usize = 6;
// tag;id;prompt;points;text,bool
const MULTIPLE_RESPONSE_MIN_FIELDS: usize = 5;

/// Append-only, line-per-question file of authored questions.
///
/// Every read scans the whole file; writes only ever append a line.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    path: PathBuf,
}

impl QuestionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every decodable question in file order. Lines that cannot be decoded
    /// are skipped; a missing file is simply an empty store.
    pub fn load_all(&self) -> Result<Vec<Question>> {
        let mut questions = Vec::new();
        for (number, line) in self.lines()?.into_iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match decode_line(&line) {
                Ok(question) => questions.push(question),
                Err(err) => log::warn!(
                    "Skipping line {} of {}: {}",
                    number + 1,
                    self.path.display(),
                    err
                ),
            }
        }

        log::info!(
            "Loaded {} questions from {}",
            questions.len(),
            self.path.display()
        );
        Ok(questions)
    }

    /// Legacy view of the store: one unpublished quiz per distinct question id,
    /// titled `Quiz <id>`, in the order the ids first appear.
    pub fn load_grouped(&self) -> Result<Vec<Quiz>> {
        let mut quizzes: Vec<Quiz> = Vec::new();
        for question in self.load_all()? {
            let position = match quizzes.iter().position(|quiz| quiz.id == question.id()) {
                Some(position) => position,
                None => {
                    quizzes.push(Quiz::new(question.id(), format!("Quiz {}", question.id())));
                    quizzes.len() - 1
                }
            };
            quizzes[position].add_question(question)?;
        }
        Ok(quizzes)
    }

    pub fn list_multiple_choice(&self) -> Result<Vec<Question>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(Question::is_multiple_choice)
            .collect())
    }

    pub fn list_multiple_response(&self) -> Result<Vec<Question>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(Question::is_multiple_response)
            .collect())
    }

    /// Decodes the first line carrying `id`. Later lines with the same id are ignored.
    pub fn find_by_id(&self, id: QuestionId) -> Result<Question> {
        let line = self
            .lines()?
            .into_iter()
            .find(|line| line_id(line) == Some(id))
            .ok_or_else(|| QuizError::question_not_found(id))?;
        decode_line(&line)
    }

    /// True if any line claims `id`, even one that does not fully decode.
    pub fn exists(&self, id: QuestionId) -> Result<bool> {
        Ok(self.lines()?.iter().any(|line| line_id(line) == Some(id)))
    }

    /// Appends a newly authored question, refusing ids already in the file.
    pub fn add(&self, question: &Question) -> Result<()> {
        if self.exists(question.id())? {
            return Err(QuizError::DuplicateId {
                entity: "Question",
                id: question.id(),
            });
        }
        self.append(question)
    }

    /// Appends without any duplicate check.
    pub fn append(&self, question: &Question) -> Result<()> {
        let line = encode(question);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        log::debug!("Appended to {}: {}", self.path.display(), line);
        Ok(())
    }

    fn lines(&self) -> Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("{} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        let reader = BufReader::new(file);
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        Ok(lines)
    }
}

/// Renders a question as a single store line.
pub fn encode(question: &Question) -> String {
    let mut fields = Vec::new();
    match question.kind() {
        QuestionKind::MultipleChoice { .. } => fields.push(MULTIPLE_CHOICE_TAG.to_string()),
        QuestionKind::MultipleResponse { .. } => fields.push(MULTIPLE_RESPONSE_TAG.to_string()),
    }
    fields.push(question.id().to_string());
    fields.push(question.prompt().to_string());
    fields.push(question.points().to_string());

    match question.kind() {
        QuestionKind::MultipleChoice {
            choices,
            correct_index,
        } => {
            fields.extend(choices.iter().cloned());
            fields.push(correct_index.to_string());
        }
        QuestionKind::MultipleResponse { choices } => {
            fields.extend(choices.iter().map(|choice| {
                format!(
                    "{}{}{}",
                    choice.text,
                    CHOICE_SEPARATOR,
                    if choice.is_correct { "True" } else { "False" }
                )
            }));
        }
    }

    fields.join(&FIELD_SEPARATOR.to_string())
}

/// Parses one store line back into a question.
pub fn decode_line(line: &str) -> Result<Question> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(FIELD_SEPARATOR).collect();

    let min_fields = match fields[0] {
        MULTIPLE_CHOICE_TAG => MULTIPLE_CHOICE_MIN_FIELDS,
        MULTIPLE_RESPONSE_TAG => MULTIPLE_RESPONSE_MIN_FIELDS,
        other => return Err(QuizError::parse("question type", other)),
    };
    if fields.len() < min_fields {
        return Err(QuizError::parse("question line (too few fields)", line));
    }

    let id = parse_number(fields[1], "question id")?;
    let prompt = fields[2].to_string();
    let points = parse_number(fields[3], "points")?;

    let question = if fields[0] == MULTIPLE_CHOICE_TAG {
        let choices: Vec<String> = fields[4..fields.len() - 1]
            .iter()
            .map(|choice| choice.to_string())
            .collect();
        let raw_index = fields[fields.len() - 1];
        let correct_index: usize = parse_number(raw_index, "correct answer index")?;
        if correct_index >= choices.len() {
            return Err(QuizError::parse("correct answer index", raw_index));
        }
        Question::multiple_choice(id, prompt, points, choices, correct_index)
    } else {
        let mut choices = Vec::new();
        for field in &fields[4..] {
            match field.split(CHOICE_SEPARATOR).collect::<Vec<_>>()[..] {
                [text, flag] => choices.push(Choice::new(text, parse_bool(flag)?)),
                _ => log::debug!("Ignoring malformed choice {:?} of question {}", field, id),
            }
        }
        Question::multiple_response(id, prompt, points, choices)
    };

    // e.g. an MRQ line whose choice pairs were all malformed
    question.map_err(|err| QuizError::parse("question line", format!("{} ({})", line, err)))
}

/// Just the id field, for the uniqueness and lookup scans.
fn line_id(line: &str) -> Option<QuestionId> {
    line.split(FIELD_SEPARATOR).nth(1)?.trim().parse().ok()
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T> {
    raw.trim().parse().map_err(|_| QuizError::parse(what, raw))
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(QuizError::parse("choice correctness", raw)),
    }
}
