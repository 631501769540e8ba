use std::path::PathBuf;

const QUESTIONS_FILE_VAR: &str = "QUIZ_QUESTIONS_FILE";
const DEFAULT_QUESTIONS_FILE: &str = "questions.txt";

#[derive(Debug, Clone)]
pub struct Config {
    pub questions_path: PathBuf,
}

impl Config {
    /// Reads `.env` if there is one, then the environment.
    pub fn load() -> Self {
        if let Err(err) = dotenv::dotenv() {
            log::debug!("No .env loaded: {}", err);
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let questions_path = lookup(QUESTIONS_FILE_VAR)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUESTIONS_FILE.to_string())
            .into();
        Self { questions_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_questions_txt() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.questions_path, PathBuf::from("questions.txt"));

        let config = Config::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.questions_path, PathBuf::from("questions.txt"));
    }

    #[test]
    fn reads_path_from_environment() {
        let config = Config::from_lookup(|key| {
            (key == "QUIZ_QUESTIONS_FILE").then(|| "/tmp/bank.txt".to_string())
        });
        assert_eq!(config.questions_path, PathBuf::from("/tmp/bank.txt"));
    }
}
