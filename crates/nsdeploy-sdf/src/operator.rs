//! Answers that need a human

use crate::error::{Result, SdfError};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Source of answers for prompts that must not be automated
#[async_trait]
pub trait Operator: Send {
    /// Ask `question` and return the answer without its line ending
    async fn ask(&mut self, question: &str) -> Result<String>;
}

/// Reads answers from this process's standard input
///
/// The question itself is already on screen because sdfcli output is
/// mirrored, so nothing is printed here.
pub struct TerminalOperator {
    stdin: BufReader<tokio::io::Stdin>,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for TerminalOperator {
    async fn ask(&mut self, question: &str) -> Result<String> {
        tracing::debug!("Waiting for operator answer to: {}", question);

        let mut line = String::new();
        if self.stdin.read_line(&mut line).await? == 0 {
            return Err(SdfError::NoAnswer);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
