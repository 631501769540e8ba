use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Line-oriented prompt/answer channel with the operator.
///
/// Every `ask_*` method returns `Ok(None)` once input is exhausted.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", text.as_ref())
    }

    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Re-prompts until the answer parses.
    pub fn ask_number<T: FromStr>(&mut self, prompt: &str) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match answer.trim().parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => self.say("Invalid input. Please enter a valid number.")?,
            }
        }
    }

    pub fn ask_yes_no(&mut self, prompt: &str) -> io::Result<Option<bool>> {
        Ok(self
            .ask(prompt)?
            .map(|answer| matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")))
    }

    /// Asks for a single letter among the first `count` letters, returning its 0-based index.
    pub fn ask_letter(&mut self, prompt: &str, count: usize) -> io::Result<Option<usize>> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(None);
            };
            match letter_index(answer.trim()) {
                Some(index) if index < count => return Ok(Some(index)),
                _ => self.say("Invalid choice. Please try again.")?,
            }
        }
    }
}

/// `A` -> 0, `b` -> 1, ... Anything that is not a single letter is `None`.
pub fn letter_index(text: &str) -> Option<usize> {
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !letter.is_ascii_uppercase() {
        return None;
    }
    Some((letter as u8 - b'A') as usize)
}

pub fn letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Turns an answer like `A, c` into selection tokens for `check_answer`.
///
/// Letters outside the first `count` are dropped. `one_based` picks the token
/// numbering: multiple-choice questions count from 1, multiple-response from 0.
pub fn letters_to_tokens(input: &str, count: usize, one_based: bool) -> Vec<String> {
    input
        .split(',')
        .filter_map(|part| letter_index(part.trim()))
        .filter(|index| *index < count)
        .map(|index| (index + usize::from(one_based)).to_string())
        .collect()
}
