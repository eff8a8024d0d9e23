//! Operator prompts for the interactive bootstrap.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of operator answers.
pub trait Prompter: Send {
    /// Ask a question and return the trimmed answer.
    fn prompt(&mut self, label: &str) -> io::Result<String>;

    /// Ask for a secret value.
    fn prompt_secret(&mut self, label: &str) -> io::Result<String> {
        self.prompt(label)
    }

    /// Show an informational line.
    fn notice(&mut self, message: &str) -> io::Result<()>;
}

/// Reads answers from stdin, writes prompts to stdout.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}", label)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            ));
        }
        Ok(line.trim().to_string())
    }

    /// Reads from the terminal with echo turned off.
    fn prompt_secret(&mut self, label: &str) -> io::Result<String> {
        let secret = rpassword::prompt_password(label)?;
        Ok(secret.trim().to_string())
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", message)
    }
}

/// Answers from a fixed script, for unattended bootstrap and tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    asked: Vec<String>,
    secrets: Vec<String>,
    notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> &[String] {
        &self.asked
    }

    /// Questions that were asked as secrets.
    pub fn secrets_asked(&self) -> &[String] {
        &self.secrets
    }

    /// Notices shown so far.
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Answers not consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn prompt(&mut self, label: &str) -> io::Result<String> {
        self.asked.push(label.to_string());
        self.answers
            .pop_front()
            .map(|a| a.trim().to_string())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("no scripted answer for {:?}", label),
                )
            })
    }

    fn prompt_secret(&mut self, label: &str) -> io::Result<String> {
        self.secrets.push(label.to_string());
        self.prompt(label)
    }

    fn notice(&mut self, message: &str) -> io::Result<()> {
        self.notices.push(message.to_string());
        Ok(())
    }
}

/// Interpret a yes/no answer. Anything but `y`/`yes` means no.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_in_order() {
        let mut prompter = ScriptedPrompter::new(["admin", " secret "]);
        assert_eq!(prompter.prompt("user: ").unwrap(), "admin");
        assert_eq!(prompter.prompt_secret("pass: ").unwrap(), "secret");
        assert_eq!(prompter.asked(), ["user: ", "pass: "]);
        assert_eq!(prompter.secrets_asked(), ["pass: "]);

        let err = prompter.prompt("host: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes("YES"));
        assert!(is_yes(" Y "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
        assert!(!is_yes("yep"));
    }
}
