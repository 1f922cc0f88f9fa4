//! Interactive drafting session.

use std::borrow::Cow::{self, Owned};

use anyhow::Result;
use colored::Colorize;
use lexa_core::template::find_template;
use lexa_core::{
    AuthService, DraftPhase, DraftingService, ExchangeOutcome, LexaError, Template, Turn,
    VariableState,
};
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use super::templates::print_catalog;
use crate::context::AppContext;
use crate::GlobalArgs;

type LineEditor = Editor<CliHelper, DefaultHistory>;

const COMMANDS: [&str; 4] = ["/download", "/vars", "/new", "/help"];

/// Tab completion and inline hints for REPL commands.
///
/// After `/download ` it offers the latest contract link of the session.
#[derive(Default)]
struct CliHelper {
    latest_link: Option<String>,
}

impl CliHelper {
    /// Full-line completions for what has been typed so far.
    fn candidates(&self, typed: &str) -> Vec<String> {
        if let Some(partial) = typed.strip_prefix("/download ") {
            let partial = partial.trim_start();
            return self
                .latest_link
                .iter()
                .filter(|link| link.starts_with(partial))
                .map(|link| format!("/download {}", link))
                .collect();
        }
        if !typed.starts_with('/') || typed.contains(' ') {
            return Vec::new();
        }
        COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(typed))
            .map(|cmd| cmd.to_string())
            .collect()
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        Ok((0, self.candidates(&line[..pos])))
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        // Only hint at the end of the line.
        if pos < line.len() {
            return None;
        }
        self.candidates(line)
            .into_iter()
            .next()
            .filter(|candidate| candidate.len() > line.len())
            .map(|candidate| candidate[line.len()..].to_string())
    }
}

impl Highlighter for CliHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }
}

impl Validator for CliHelper {}

/// What the REPL should do after handling one line.
enum Flow {
    Continue,
    NewSession,
    Quit,
}

pub async fn run(ctx: &AppContext, args: &GlobalArgs, template_query: Option<&str>) -> Result<()> {
    let credential = ctx.credential(args).await?;

    // The backend rejects fill requests without a Gemini key; say so up front.
    match ctx.auth.current_user(&credential).await {
        Ok(user) if !user.has_gemini_key() => println!(
            "{}",
            "No Gemini API key on your account; the backend will refuse to draft. \
             Run `lexa set-gemini-key <key>` first."
                .yellow()
        ),
        Ok(_) => {}
        Err(e) if e.is_unauthorized() => return Err(e.into()),
        Err(e) => tracing::debug!("[Cli] Could not check profile: {}", e),
    }

    let service = ctx.drafting_service(credential, None);

    let mut rl: LineEditor = Editor::new()?;
    rl.set_helper(Some(CliHelper::default()));

    println!("{}", "=== Lexa contract drafting ===".bright_magenta().bold());
    println!(
        "{}",
        "Type '/help' for commands or 'quit' to exit.".bright_black()
    );
    println!();

    let mut query = template_query.map(str::to_string);
    loop {
        let Some(template) = choose_template(&service, &mut rl, query.take()).await? else {
            break;
        };
        let announcement = service.select_template(template).await?;
        print_turn(&announcement);

        match chat(&service, &mut rl).await? {
            Flow::NewSession => {
                service.reset().await?;
                if let Some(helper) = rl.helper_mut() {
                    helper.latest_link = None;
                }
                println!("{}", "Started a new session.".bright_black());
            }
            Flow::Quit | Flow::Continue => break,
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

/// Picks a template from `query`, or asks until a valid one is entered.
///
/// Returns `None` when the user quits or the catalog is empty.
async fn choose_template(
    service: &DraftingService,
    rl: &mut LineEditor,
    mut query: Option<String>,
) -> Result<Option<Template>> {
    let templates = service.list_templates().await;
    if templates.is_empty() {
        println!(
            "{}",
            "No contract templates available (see logs for details).".yellow()
        );
        return Ok(None);
    }

    if query.is_none() {
        println!("{}", "Choose a contract template:".bright_yellow());
        print_catalog(&templates);
    }

    loop {
        let input = match query.take() {
            Some(q) => q,
            None => match read_line(rl, "template> ")? {
                Some(line) => line,
                None => return Ok(None),
            },
        };
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if is_quit(input) {
            return Ok(None);
        }

        match find_template(&templates, input) {
            Some(template) if template.is_resolvable() => return Ok(Some(template.clone())),
            Some(template) => println!(
                "{}",
                format!("Template '{}' has no file and cannot be used.", template.name).red()
            ),
            None => println!(
                "{}",
                format!("No template matches '{}'. Enter a number, id or name.", input).red()
            ),
        }
    }
}

/// Runs the chat loop for the current session.
async fn chat(service: &DraftingService, rl: &mut LineEditor) -> Result<Flow> {
    if service.phase().await == (DraftPhase::Filling { degraded: true }) {
        println!(
            "{}",
            "The template could not be loaded; you can keep chatting but results may be incomplete."
                .yellow()
        );
    }

    loop {
        let Some(line) = read_line(rl, ">> ")? else {
            return Ok(Flow::Quit);
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(input);

        let flow = if input.starts_with('/') {
            handle_command(service, input).await?
        } else if is_quit(input) {
            Flow::Quit
        } else {
            if let Some(link) = send(service, input).await?
                && let Some(helper) = rl.helper_mut()
            {
                helper.latest_link = Some(link);
            }
            Flow::Continue
        };

        match flow {
            Flow::Continue => continue,
            other => return Ok(other),
        }
    }
}

/// Sends one message and prints the answer; returns the new artifact link, if any.
async fn send(service: &DraftingService, message: &str) -> Result<Option<String>> {
    println!("{}", "...".bright_black());

    match service.send_message(message).await {
        Ok(ExchangeOutcome::Replied(turn)) => {
            print_turn(&turn);
            Ok(turn.artifact_link().map(str::to_string))
        }
        Ok(ExchangeOutcome::Failed { turn, error }) => {
            print_turn(&turn);
            if error.is_unauthorized() {
                return Err(error.into());
            }
            Ok(None)
        }
        Err(e) if e.is_precondition() => {
            println!("{}", e.to_string().yellow());
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn handle_command(service: &DraftingService, input: &str) -> Result<Flow> {
    let (command, arg) = match input.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (input, ""),
    };

    match command {
        "/download" => {
            let result = if arg.is_empty() {
                service.download_latest().await
            } else {
                service.download(arg).await
            };
            match result {
                Ok(path) => println!("{}", format!("✓ Saved {}", path.display()).green()),
                Err(e) if e.is_unauthorized() => return Err(e.into()),
                Err(e) => println!("{}", format!("Download failed: {}", e).red()),
            }
        }
        "/vars" => print_variables(service).await,
        "/new" => {
            if service.is_busy().await {
                println!("{}", LexaError::ExchangeInFlight.to_string().yellow());
            } else {
                return Ok(Flow::NewSession);
            }
        }
        "/help" => print_help(),
        _ => println!(
            "{}",
            format!("Unknown command '{}'. Type /help.", command).bright_black()
        ),
    }
    Ok(Flow::Continue)
}

/// Reads one line; `None` on Ctrl-D.
fn read_line(rl: &mut LineEditor, prompt: &str) -> Result<Option<String>> {
    loop {
        match rl.readline(prompt) {
            Ok(line) => return Ok(Some(line)),
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }
}

fn is_quit(input: &str) -> bool {
    matches!(input, "quit" | "exit")
}

fn print_turn(turn: &Turn) {
    if turn.is_user() {
        println!("{}", format!("> {}", turn.content).green());
        return;
    }

    let error = turn.content.starts_with(lexa_core::transcript::ERROR_TURN_PREFIX);
    for line in turn.content.lines() {
        if error {
            println!("{}", line.red());
        } else {
            println!("{}", line.bright_blue());
        }
    }
    if let Some(link) = turn.artifact_link() {
        println!(
            "{}",
            format!("Contract ready: {} (type /download to save it)", link).bright_yellow()
        );
    }
    println!();
}

async fn print_variables(service: &DraftingService) {
    let session = service.snapshot().await;
    if let Some(template) = session.template() {
        println!(
            "{}",
            format!(
                "Session {} · {} · started {}",
                session.id(),
                template.name,
                session.started_at().format("%Y-%m-%d %H:%M")
            )
            .bright_black()
        );
    }

    match session.variables() {
        VariableState::Unset => println!("{}", "No variables yet.".bright_black()),
        VariableState::Decoded(set) if set.is_empty() => {
            println!("{}", "The template has no variables.".bright_black())
        }
        VariableState::Decoded(set) => {
            for (name, value) in set.iter() {
                if value.trim().is_empty() {
                    println!("  {} = {}", name.bold(), "(empty)".bright_black());
                } else {
                    println!("  {} = {}", name.bold(), value);
                }
            }
            let unfilled = set.unfilled().len();
            if unfilled > 0 {
                println!(
                    "{}",
                    format!("{} of {} still empty", unfilled, set.len()).bright_black()
                );
            }
        }
        VariableState::Raw { raw, error } => {
            println!(
                "{}",
                format!("Variables could not be decoded: {}", error).yellow()
            );
            println!("{}", raw);
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /download [link]  save the latest (or given) contract");
    println!("  /vars             show the current variable values");
    println!("  /new              start over with another template");
    println!("  /help             show this help");
    println!("  quit              leave");
    println!("Anything else is sent to the drafting assistant.");
}
