//! Masked password prompt.

use std::borrow::Cow::{self, Owned};

use anyhow::{Context as _, Result};
use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};

/// Renders every typed character as `*`.
struct MaskingHelper;

impl Helper for MaskingHelper {}

impl Completer for MaskingHelper {
    type Candidate = String;
}

impl Hinter for MaskingHelper {
    type Hint = String;
}

impl Validator for MaskingHelper {}

impl Highlighter for MaskingHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

/// Reads a password from the terminal without echoing it.
pub fn read_password(prompt: &str) -> Result<String> {
    let mut rl: Editor<MaskingHelper, DefaultHistory> =
        Editor::new().context("Failed to open terminal for password prompt")?;
    rl.set_helper(Some(MaskingHelper));

    let password = rl.readline(prompt).context("Password prompt aborted")?;
    Ok(password)
}
