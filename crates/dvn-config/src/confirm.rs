//! Confirmation sources for destructive operations.

use std::io::{self, BufRead, Write};

/// Answer that allows a destructive operation to proceed.
pub const AFFIRMATIVE: &str = "Y";

/// Asks the operator a yes/no question.
pub trait Confirm {
    /// Shows `prompt` and returns `true` only for an affirmative answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or the answer cannot be read.
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Blocking text prompt over a reader/writer pair.
///
/// Only the exact answer `Y` is affirmative; end of input counts as a refusal.
#[derive(Debug)]
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    /// Creates a prompt reading answers from `input` and writing questions to `output`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl PromptConfirm<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on the terminal: questions go to stderr, answers come from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        self.output.write_all(prompt.as_bytes())?;
        self.output.flush()?;

        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(answer.trim_end_matches(['\r', '\n']) == AFFIRMATIVE)
    }
}

/// Preset answer for unattended runs (`--yes`) and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedConfirm(pub bool);

impl Confirm for FixedConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        tracing::debug!(answer = self.0, "{prompt}");
        Ok(self.0)
    }
}
