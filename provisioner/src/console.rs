//! Operator console
//!
//! Every write is a single locked line on stdout so that the provisioning
//! flow and the background watch loops never interleave mid-line.

use std::io::Write;

use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::errors::ProvisionError;

/// Outcome of a spinner step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    Done,
    Failed,
    Skipped,
}

/// Console trait for testability
#[async_trait]
pub trait Console: Send + Sync {
    /// Print a line
    fn message(&self, text: &str);

    /// Announce the start of a step
    fn show_spinner(&self, text: &str);

    /// Finish a step
    fn stop_spinner(&self, text: &str, result: StepResult);

    /// Ask a yes/no question
    async fn confirm(&self, message: &str, default: bool) -> Result<bool, ProvisionError>;

    /// Ask for free-form input
    async fn prompt(&self, message: &str, default: Option<&str>) -> Result<String, ProvisionError>;
}

pub fn with_warning_format(text: &str) -> String {
    text.yellow().to_string()
}

pub fn with_highlight_format(text: &str) -> String {
    text.cyan().to_string()
}

pub fn with_gray_format(text: &str) -> String {
    text.bright_black().to_string()
}

/// Console bound to the process terminal
pub struct TerminalConsole {
    stdin: Mutex<BufReader<Stdin>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    fn write_prompt(&self, text: &str) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "{}", text);
        let _ = out.flush();
    }

    async fn read_line(&self) -> Result<String, ProvisionError> {
        let mut stdin = self.stdin.lock().await;
        let mut line = String::new();
        let read = stdin
            .read_line(&mut line)
            .await
            .map_err(|e| ProvisionError::PromptError(e.to_string()))?;
        if read == 0 {
            return Err(ProvisionError::PromptError("input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for TerminalConsole {
    fn message(&self, text: &str) {
        self.write_line(text);
    }

    fn show_spinner(&self, text: &str) {
        self.write_line(&format!("  {} {}", "(-)".bright_black(), text));
    }

    fn stop_spinner(&self, text: &str, result: StepResult) {
        let line = match result {
            StepResult::Done => format!("  {} Done: {}", "(✓)".green(), text),
            StepResult::Failed => format!("  {} Failed: {}", "(x)".red(), text),
            StepResult::Skipped => format!("  {} Skipped: {}", "(-)".yellow(), text),
        };
        self.write_line(&line);
    }

    async fn confirm(&self, message: &str, default: bool) -> Result<bool, ProvisionError> {
        let hint = if default { "Y/n" } else { "y/N" };
        self.write_prompt(&format!("? {} ({}) ", message.bold(), hint));

        let answer = self.read_line().await?;
        match answer.to_lowercase().as_str() {
            "" => Ok(default),
            "y" | "yes" => Ok(true),
            "n" | "no" => Ok(false),
            other => Err(ProvisionError::PromptError(format!(
                "unexpected answer '{}'",
                other
            ))),
        }
    }

    async fn prompt(&self, message: &str, default: Option<&str>) -> Result<String, ProvisionError> {
        match default {
            Some(d) => self.write_prompt(&format!("? {} [{}] ", message.bold(), d)),
            None => self.write_prompt(&format!("? {} ", message.bold())),
        }

        let answer = self.read_line().await?;
        match (answer.is_empty(), default) {
            (true, Some(d)) => Ok(d.to_string()),
            _ => Ok(answer),
        }
    }
}
