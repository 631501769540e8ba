use std::io::{self, BufRead, Write};

use quiz_admin::config::Config;
use quiz_admin::console::{letter, letters_to_tokens, Console};
use quiz_admin::quiz::{
    Choice, Question, QuestionId, QuestionKind, QuestionStore, Quiz, QuizId, QuizRegistry,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type HandlerResult = Result<(), BoxError>;

fn main() {
    pretty_env_logger::init();
    let config = Config::load();
    log::info!(
        "Starting quiz admin with question store {}",
        config.questions_path.display()
    );

    let stdin = io::stdin();
    let console = Console::new(stdin.lock(), io::stdout());
    let mut app = App::new(QuestionStore::new(&config.questions_path), console);
    if let Err(err) = app.run() {
        log::error!("Console failed: {}", err);
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    ListMultipleChoice,
    ListMultipleResponse,
    AddMultipleChoice,
    AddMultipleResponse,
    LoadQuestions,
    ListQuizzes,
    AddQuiz,
    AddQuestionToQuiz,
    PublishQuiz,
    StartQuiz,
    ListQuizScores,
    Exit,
    EditQuestion,
    RandomizeQuestions,
    RemoveQuestion,
}

impl Command {
    fn from_option(option: u32) -> Option<Self> {
        Some(match option {
            1 => Self::ListMultipleChoice,
            2 => Self::ListMultipleResponse,
            3 => Self::AddMultipleChoice,
            4 => Self::AddMultipleResponse,
            5 => Self::LoadQuestions,
            6 => Self::ListQuizzes,
            7 => Self::AddQuiz,
            8 => Self::AddQuestionToQuiz,
            9 => Self::PublishQuiz,
            10 => Self::StartQuiz,
            11 => Self::ListQuizScores,
            12 => Self::Exit,
            13 => Self::EditQuestion,
            14 => Self::RandomizeQuestions,
            15 => Self::RemoveQuestion,
            _ => return None,
        })
    }
}

const MAIN_MENU: &str = "Main Menu
1. List all multiple-choice questions
2. List all multiple-response questions
3. Add multiple-choice question
4. Add multiple-response question
5. Load questions
6. List all quizzes
7. Add quiz
8. Add question to quiz
9. Publish quiz
10. Start quiz
11. List quiz scores
12. To Exit
13. Edit a question
14. Randomize Questions
15. Remove Question from quiz";

struct App<R, W> {
    console: Console<R, W>,
    store: QuestionStore,
    registry: QuizRegistry,
    questions: Vec<Question>,
}

impl<R: BufRead, W: Write> App<R, W> {
    fn new(store: QuestionStore, console: Console<R, W>) -> Self {
        Self {
            console,
            store,
            registry: QuizRegistry::new(),
            questions: Vec::new(),
        }
    }

    fn run(&mut self) -> io::Result<()> {
        self.reload()?;
        loop {
            self.console.say(MAIN_MENU)?;
            let Some(option) = self.console.ask_number::<u32>("Enter option: ")? else {
                return Ok(());
            };
            let Some(command) = Command::from_option(option) else {
                self.console.say("Invalid option. Please try again.")?;
                continue;
            };
            if command == Command::Exit {
                return Ok(());
            }

            if let Err(err) = self.dispatch(command) {
                log::warn!("{:?} failed: {}", command, err);
                self.console.say(format!("Error: {}", err))?;
            }
            self.console.say("")?;
        }
    }

    fn dispatch(&mut self, command: Command) -> HandlerResult {
        match command {
            Command::ListMultipleChoice => self.list_questions(true),
            Command::ListMultipleResponse => self.list_questions(false),
            Command::AddMultipleChoice => self.add_multiple_choice(),
            Command::AddMultipleResponse => self.add_multiple_response(),
            Command::LoadQuestions => {
                self.reload()?;
                let groups = self.store.load_grouped()?.len();
                self.console.say(format!(
                    "Loaded {} questions ({} distinct ids).",
                    self.questions.len(),
                    groups
                ))?;
                Ok(())
            }
            Command::ListQuizzes => self.list_quizzes(),
            Command::AddQuiz => self.add_quiz(),
            Command::AddQuestionToQuiz => self.add_question_to_quiz(),
            Command::PublishQuiz => self.publish_quiz(),
            Command::StartQuiz => self.start_quiz(),
            Command::ListQuizScores => self.list_quiz_scores(),
            Command::EditQuestion => self.edit_question(),
            Command::RandomizeQuestions => self.randomize_questions(),
            Command::RemoveQuestion => self.remove_question(),
            Command::Exit => Ok(()),
        }
    }

    /// Refreshes the in-memory question pool. A store that cannot be read
    /// leaves the pool empty instead of stopping the program.
    fn reload(&mut self) -> io::Result<()> {
        match self.store.load_all() {
            Ok(questions) => self.questions = questions,
            Err(err) => {
                log::error!(
                    "Could not load questions from {}: {}",
                    self.store.path().display(),
                    err
                );
                self.console
                    .say(format!("Error loading questions from file: {}", err))?;
                self.questions.clear();
            }
        }
        Ok(())
    }

    fn list_questions(&mut self, multiple_choice: bool) -> HandlerResult {
        let questions = if multiple_choice {
            self.store.list_multiple_choice()?
        } else {
            self.store.list_multiple_response()?
        };
        if questions.is_empty() {
            self.console.say("No questions found.")?;
            return Ok(());
        }
        for question in &questions {
            self.show_question(question, true)?;
        }
        Ok(())
    }

    fn show_question(&mut self, question: &Question, with_key: bool) -> io::Result<()> {
        self.console.say(format!(
            "Question ID: {}\nPrompt: {}\nPoints: {}",
            question.id(), question.prompt(), question.points()
        ))?;
        match question.kind() {
            QuestionKind::MultipleChoice {
                choices,
                correct_index,
            } => {
                for (i, choice) in choices.iter().enumerate() {
                    self.console.say(format!("  {}. {}", letter(i), choice))?;
                }
                if with_key {
                    self.console
                        .say(format!("Correct answer: {}", letter(*correct_index)))?;
                }
            }
            QuestionKind::MultipleResponse { choices } => {
                for (i, choice) in choices.iter().enumerate() {
                    if with_key {
                        let mark = if choice.is_correct { "correct" } else { "incorrect" };
                        self.console
                            .say(format!("  {}. {} ({})", letter(i), choice.text, mark))?;
                    } else {
                        self.console.say(format!("  {}. {}", letter(i), choice.text))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn show_quizzes<'a>(&mut self, quizzes: impl Iterator<Item = &'a Quiz>) -> io::Result<()> {
        for quiz in quizzes {
            self.console.say(format!(
                "Quiz ID: {}\nTitle: {}\nMaximum Score: {}\nIs Published: {}",
                quiz.id,
                quiz.title,
                quiz.maximum_score(),
                quiz.is_published()
            ))?;
        }
        Ok(())
    }

    /// Asks for a question id until it is not already in the store.
    fn ask_new_question_id(&mut self) -> Result<Option<QuestionId>, BoxError> {
        loop {
            let Some(id) = self.console.ask_number::<QuestionId>("Enter id: ")? else {
                return Ok(None);
            };
            if self.store.exists(id)? {
                self.console
                    .say("ID already exists. Please enter a different ID.")?;
                continue;
            }
            return Ok(Some(id));
        }
    }

    /// Choices are labelled A..Z, so a question carries between 1 and 26 of them.
    fn ask_choice_count(&mut self) -> io::Result<Option<usize>> {
        loop {
            let Some(count) = self.console.ask_number::<usize>("Enter number of choices: ")? else {
                return Ok(None);
            };
            if (1..=26).contains(&count) {
                return Ok(Some(count));
            }
            self.console.say("Please enter a number between 1 and 26.")?;
        }
    }

    fn add_multiple_choice(&mut self) -> HandlerResult {
        let Some(id) = self.ask_new_question_id()? else {
            return Ok(());
        };
        let Some(prompt) = self.console.ask("Enter prompt: ")? else {
            return Ok(());
        };
        let Some(points) = self.console.ask_number::<u32>("Enter points: ")? else {
            return Ok(());
        };
        let Some(count) = self.ask_choice_count()? else {
            return Ok(());
        };

        let mut choices = Vec::with_capacity(count);
        for i in 0..count {
            let Some(choice) = self.console.ask(&format!("Enter choice {}: ", letter(i)))? else {
                return Ok(());
            };
            choices.push(choice);
        }
        let Some(correct_index) = self
            .console
            .ask_letter("Enter correct answer (A, B, C, ...): ", count)?
        else {
            return Ok(());
        };

        let question = Question::multiple_choice(id, prompt, points, choices, correct_index)?;
        self.store.add(&question)?;
        self.questions.push(question);
        self.console.say("Question has been added.")?;
        Ok(())
    }

    fn add_multiple_response(&mut self) -> HandlerResult {
        let Some(id) = self.ask_new_question_id()? else {
            return Ok(());
        };
        let Some(prompt) = self.console.ask("Enter prompt: ")? else {
            return Ok(());
        };
        let Some(points) = self.console.ask_number::<u32>("Enter points: ")? else {
            return Ok(());
        };
        let Some(count) = self.ask_choice_count()? else {
            return Ok(());
        };

        let mut choices = Vec::with_capacity(count);
        for i in 0..count {
            let Some(text) = self.console.ask(&format!("Enter choice {}: ", letter(i)))? else {
                return Ok(());
            };
            let Some(is_correct) = self
                .console
                .ask_yes_no(&format!("Choice {} is correct (yes/no): ", letter(i)))?
            else {
                return Ok(());
            };
            choices.push(Choice::new(text, is_correct));
        }

        let question = Question::multiple_response(id, prompt, points, choices)?;
        self.store.add(&question)?;
        self.questions.push(question);
        self.console.say("Question has been added.")?;
        Ok(())
    }

    fn list_quizzes(&mut self) -> HandlerResult {
        if self.registry.quizzes().next().is_none() {
            self.console.say("No quizzes found.")?;
            return Ok(());
        }
        let quizzes: Vec<Quiz> = self.registry.quizzes().cloned().collect();
        self.show_quizzes(quizzes.iter())?;

        let Some(id) = self
            .console
            .ask_number::<QuizId>("Enter quiz id to see its questions: ")?
        else {
            return Ok(());
        };
        let Some(quiz) = quizzes.iter().find(|quiz| quiz.id == id) else {
            self.console.say("Quiz not found.")?;
            return Ok(());
        };
        if quiz.questions().is_empty() {
            self.console.say("The quiz has no questions.")?;
        }
        for question in quiz.questions() {
            self.show_question(question, true)?;
        }
        Ok(())
    }

    fn add_quiz(&mut self) -> HandlerResult {
        let id = loop {
            let Some(id) = self.console.ask_number::<QuizId>("Enter id: ")? else {
                return Ok(());
            };
            if self.registry.get(id).is_none() {
                break id;
            }
            self.console
                .say("Quiz with the entered ID already exists. Please enter a different ID.")?;
        };
        let Some(title) = self.console.ask("Enter title: ")? else {
            return Ok(());
        };

        self.registry.create_quiz(id, title)?;
        self.console.say("Quiz has been added.")?;
        Ok(())
    }

    /// Lists unpublished quizzes and asks which one to work on.
    fn choose_unpublished(&mut self) -> Result<Option<QuizId>, BoxError> {
        let quizzes: Vec<Quiz> = self.registry.unpublished().cloned().collect();
        if quizzes.is_empty() {
            self.console.say("No unpublished quizzes available.")?;
            return Ok(None);
        }
        self.show_quizzes(quizzes.iter())?;
        Ok(self.console.ask_number::<QuizId>("Enter quiz id: ")?)
    }

    fn choose_published(&mut self) -> Result<Option<QuizId>, BoxError> {
        let quizzes: Vec<Quiz> = self.registry.published().cloned().collect();
        if quizzes.is_empty() {
            self.console.say("No published quizzes available.")?;
            return Ok(None);
        }
        self.show_quizzes(quizzes.iter())?;
        Ok(self.console.ask_number::<QuizId>("Enter quiz id: ")?)
    }

    fn show_quiz_questions(&mut self, quiz_id: QuizId) -> HandlerResult {
        let questions = self
            .registry
            .get(quiz_id)
            .map(|quiz| quiz.questions().to_vec())
            .unwrap_or_default();
        for question in &questions {
            self.show_question(question, false)?;
        }
        Ok(())
    }

    fn add_question_to_quiz(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_unpublished()? else {
            return Ok(());
        };
        if self.registry.get(quiz_id).is_none() {
            self.console.say("Quiz not found.")?;
            return Ok(());
        }

        loop {
            let pool = self.questions.clone();
            for question in &pool {
                self.show_question(question, false)?;
            }
            let Some(question_id) = self.console.ask_number::<QuestionId>("Enter question id: ")? else {
                return Ok(());
            };

            match self.store.find_by_id(question_id) {
                Ok(question) => {
                    self.registry.add_question(quiz_id, question)?;
                    self.console.say("Question has been added to the quiz.")?;
                }
                Err(err) => self.console.say(format!("Error: {}", err))?,
            }

            match self
                .console
                .ask_yes_no("Do you want to add another question? (yes/no): ")?
            {
                Some(true) => continue,
                _ => return Ok(()),
            }
        }
    }

    fn publish_quiz(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_unpublished()? else {
            return Ok(());
        };
        self.registry.publish(quiz_id)?;
        self.console.say("Quiz has been published.")?;
        Ok(())
    }

    fn start_quiz(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_published()? else {
            return Ok(());
        };

        let mut session = self.registry.start_attempt(quiz_id)?;
        let maximum_score = session.quiz().maximum_score();
        log::debug!("Attempt on quiz {} started at {}", quiz_id, session.created_at());
        while let Some(question) = session.current_question().cloned() {
            self.console
                .say(format!("Question {}: {}", session.position() + 1, question.prompt()))?;
            for (i, text) in question.choice_texts().iter().enumerate() {
                self.console.say(format!("  {}. {}", letter(i), text))?;
            }

            let prompt = if question.is_multiple_choice() {
                "Enter your answer (A, B, ...): "
            } else {
                "Enter your answers separated by commas (A, C, ...): "
            };
            let answer = match self.console.ask(prompt)? {
                Some(answer) if !answer.trim().is_empty() => answer,
                _ => {
                    self.console.say("Attempt abandoned.")?;
                    return Ok(());
                }
            };

            let tokens = letters_to_tokens(
                &answer,
                question.choice_texts().len(),
                question.is_multiple_choice(),
            );
            let score = session.answer(&tokens)?;
            if score == question.points() {
                self.console.say(format!("Correct! {} points.", score))?;
            } else {
                self.console.say("Incorrect. 0 points.")?;
            }
        }

        let attempt = session.finish()?;
        self.console.say(format!(
            "Your score: {} of {}",
            attempt.total_score, maximum_score
        ))?;
        Ok(())
    }

    fn list_quiz_scores(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_published()? else {
            return Ok(());
        };
        let attempts = self.registry.scores(quiz_id)?.to_vec();
        if attempts.is_empty() {
            self.console.say("No attempts found for this quiz.")?;
            return Ok(());
        }
        for attempt in attempts {
            let scores: Vec<String> = attempt
                .question_scores
                .iter()
                .map(|score| score.to_string())
                .collect();
            self.console.say(format!(
                "{}  scores [{}]  total {}",
                attempt
                    .created_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S"),
                scores.join(", "),
                attempt.total_score
            ))?;
        }
        Ok(())
    }

    fn edit_question(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_unpublished()? else {
            return Ok(());
        };
        self.show_quiz_questions(quiz_id)?;
        let Some(question_id) = self.console.ask_number::<QuestionId>("Enter question id: ")? else {
            return Ok(());
        };
        let known = self
            .registry
            .get(quiz_id)
            .is_some_and(|quiz| quiz.question(question_id).is_some());
        if !known {
            self.console.say("Question not found in this quiz.")?;
            return Ok(());
        }
        let Some(prompt) = self.console.ask("Enter new question text: ")? else {
            return Ok(());
        };
        self.registry.edit_prompt(quiz_id, question_id, &prompt)?;
        self.console.say("Question has been updated.")?;
        Ok(())
    }

    fn randomize_questions(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_unpublished()? else {
            return Ok(());
        };
        self.registry.shuffle(quiz_id, &mut rand::thread_rng())?;
        self.console.say("Questions have been shuffled.")?;
        self.show_quiz_questions(quiz_id)
    }

    fn remove_question(&mut self) -> HandlerResult {
        let Some(quiz_id) = self.choose_unpublished()? else {
            return Ok(());
        };
        self.show_quiz_questions(quiz_id)?;
        let Some(question_id) = self.console.ask_number::<QuestionId>("Enter question id: ")? else {
            return Ok(());
        };
        self.registry.remove_question(quiz_id, question_id)?;
        self.console.say("Question has been removed from the quiz.")?;
        Ok(())
    }
}
