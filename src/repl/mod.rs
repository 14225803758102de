pub mod highlighter;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::ast::NodeKind;
use crate::errors::pretty;
use crate::symbols::{Access, PIPELINE_VARIABLES};

const MAX_HISTORY_ENTRIES: usize = 500;
const SOURCE_LABEL: &str = "<repl>";

#[derive(Clone)]
struct ReplEditorHelper {
    symbols: Arc<Mutex<Vec<String>>>,
}

impl ReplEditorHelper {
    fn new() -> Self {
        Self {
            symbols: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set_symbols(&self, symbols: Vec<String>) {
        if let Ok(mut guard) = self.symbols.lock() {
            *guard = symbols;
        }
    }

    fn symbols(&self) -> Vec<String> {
        self.symbols
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Helper for ReplEditorHelper {}

impl Hinter for ReplEditorHelper {
    type Hint = String;
}

impl Validator for ReplEditorHelper {
    fn validate(
        &self,
        context: &mut ValidationContext<'_>,
    ) -> Result<ValidationResult, ReadlineError> {
        if highlighter::needs_more_input(context.input()) {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

impl Highlighter for ReplEditorHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(highlighter::colorize(line))
    }
}

impl Completer for ReplEditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let line = &line[..pos.min(line.len())];
        let mut start = line.len();
        for (idx, ch) in line.char_indices().rev() {
            if ch == '_' || ch.is_ascii_alphanumeric() {
                start = idx;
            } else {
                break;
            }
        }

        let prefix = &line[start..];
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }

        let pairs = highlighter::complete(prefix, &self.symbols())
            .into_iter()
            .map(|value| Pair {
                display: value.clone(),
                replacement: value,
            })
            .collect::<Vec<_>>();
        Ok((start, pairs))
    }
}

/// Outcome of checking one REPL entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub text: String,
    pub passed: bool,
    /// Variables the entry declares, for completion.
    pub declared: Vec<String>,
}

/// Parse and check one complete entry and render the result.
pub fn check_entry(source: &str) -> Report {
    let (program, verdict) = match crate::check_source(source) {
        Ok(checked) => checked,
        Err(err) => {
            return Report {
                text: pretty::format_frontend_error(SOURCE_LABEL, source, &err),
                passed: false,
                declared: Vec::new(),
            }
        }
    };

    let mut declared = Vec::new();
    let mut lines = Vec::new();
    for id in program.tree.ids() {
        if let NodeKind::Declaration { .. } = program.tree.kind(id) {
            if let Some(name) = program.tree.name(id) {
                lines.push(format!("  {}: {}", name, program.tree.ty(id)));
                declared.push(name.to_string());
            }
        }
    }

    let text = if verdict.passed() {
        let mut text = String::from("ok");
        for line in lines {
            text.push('\n');
            text.push_str(&line);
        }
        text
    } else {
        let mut rendered = pretty::format_diagnostics(SOURCE_LABEL, source, &verdict.diagnostics);
        if rendered.is_empty() {
            rendered.push("check failed: an if condition has no known type".to_string());
        } else {
            rendered.push(format!(
                "check failed with {} diagnostic(s)",
                verdict.diagnostics.len()
            ));
        }
        rendered.join("\n\n")
    };

    Report {
        text,
        passed: verdict.passed(),
        declared,
    }
}

enum Step {
    Continue,
    Checked(String),
    Exit,
}

struct Session {
    buffer: String,
    history: Vec<String>,
    symbols: Vec<String>,
}

impl Session {
    fn prompt(&self) -> &'static str {
        if self.buffer.is_empty() {
            "glint> "
        } else {
            "....> "
        }
    }

    fn feed(&mut self, raw_line: &str) -> Step {
        if self.buffer.is_empty() {
            match self.handle_meta_command(raw_line.trim()) {
                CommandAction::NotHandled => {}
                CommandAction::Handled => return Step::Continue,
                CommandAction::Exit => return Step::Exit,
            }
        }

        let normalized = highlighter::normalize_line(raw_line);
        if self.buffer.is_empty() && normalized.trim().is_empty() {
            return Step::Continue;
        }

        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(&normalized);

        if highlighter::needs_more_input(&self.buffer) {
            return Step::Continue;
        }

        let input = std::mem::take(&mut self.buffer);
        self.history.push(input.clone());
        trim_history(&mut self.history);

        let report = check_entry(&input);
        if report.passed {
            println!("{}", report.text);
        } else {
            eprintln!("{}", report.text);
        }
        self.symbols = report.declared;
        Step::Checked(input)
    }

    fn handle_meta_command(&self, command: &str) -> CommandAction {
        if command.is_empty() {
            return CommandAction::NotHandled;
        }
        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            return CommandAction::Exit;
        }
        if !command.starts_with(':') {
            return CommandAction::NotHandled;
        }

        let mut parts = command.split_whitespace();
        let directive = parts.next().unwrap_or_default();
        match directive {
            ":quit" | ":exit" => return CommandAction::Exit,
            ":help" => {
                println!(":help                   Show this message");
                println!(":builtins               List pipeline variables");
                println!(":complete <prefix>      Show completion suggestions");
                println!(":history [n]            Show recent history (default 20)");
                println!(":highlight <code>       Render ANSI syntax highlighting preview");
                println!(":quit                   Exit REPL");
            }
            ":builtins" => {
                for var in &PIPELINE_VARIABLES {
                    let access = match var.access {
                        Access::ReadWrite => "read-write",
                        Access::ReadOnly => "read-only",
                        Access::WriteOnly => "write-only",
                    };
                    let constant = if var.constant { ", constant" } else { "" };
                    println!("{:<22} {:<5} {}{}", var.name, var.ty, access, constant);
                }
            }
            ":complete" => {
                let Some(prefix) = parts.next() else {
                    eprintln!("usage: :complete <prefix>");
                    return CommandAction::Handled;
                };
                let suggestions = highlighter::complete(prefix, &self.symbols);
                if suggestions.is_empty() {
                    println!("(no matches)");
                } else {
                    for suggestion in suggestions {
                        println!("{}", suggestion);
                    }
                }
            }
            ":history" => {
                let count = parts
                    .next()
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(20);
                let start = self.history.len().saturating_sub(count);
                for (idx, entry) in self.history.iter().enumerate().skip(start) {
                    println!("{:>4} {}", idx + 1, highlighter::colorize(entry));
                }
            }
            ":highlight" => {
                let code = command.strip_prefix(":highlight").unwrap_or("").trim();
                if code.is_empty() {
                    eprintln!("usage: :highlight <code>");
                } else {
                    println!("{}", highlighter::colorize(code));
                }
            }
            other => {
                eprintln!("unknown command '{}'; use :help", other);
            }
        }

        CommandAction::Handled
    }
}

enum CommandAction {
    NotHandled,
    Handled,
    Exit,
}

pub fn run() -> anyhow::Result<()> {
    let mut session = Session {
        buffer: String::new(),
        history: load_history(),
        symbols: Vec::new(),
    };

    println!("glint shader checker");
    println!("Commands: :help, :builtins, :complete <prefix>, :history, :quit");
    println!("Enter a scope such as {{ vec4 c = gl_Color; gl_FragColor = c; }}");

    if io::stdin().is_terminal() {
        run_editor(&mut session)?;
    } else {
        run_plain(&mut session)?;
    }

    if let Err(err) = save_history(&session.history) {
        tracing::warn!(error = %err, "failed to save repl history");
    }

    Ok(())
}

fn run_editor(session: &mut Session) -> anyhow::Result<()> {
    let helper = ReplEditorHelper::new();
    let mut editor = Editor::<ReplEditorHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(helper.clone()));

    for entry in &session.history {
        let _ = editor.add_history_entry(entry.as_str());
    }

    loop {
        let raw_line = match editor.readline(session.prompt()) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        match session.feed(&raw_line) {
            Step::Continue => {}
            Step::Checked(input) => {
                let _ = editor.add_history_entry(input.as_str());
                helper.set_symbols(session.symbols.clone());
            }
            Step::Exit => break,
        }
    }

    Ok(())
}

fn run_plain(session: &mut Session) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{}", session.prompt());
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        if let Step::Exit = session.feed(raw_line) {
            break;
        }
    }

    Ok(())
}

fn load_history() -> Vec<String> {
    let path = repl_history_path();
    let Ok(contents) = fs::read_to_string(path) else {
        return Vec::new();
    };
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn save_history(history: &[String]) -> io::Result<()> {
    let path = repl_history_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut trimmed = history.to_vec();
    trim_history(&mut trimmed);
    let mut encoded = trimmed
        .iter()
        .map(|entry| entry.replace('\n', " "))
        .collect::<Vec<_>>()
        .join("\n");
    if !encoded.is_empty() {
        encoded.push('\n');
    }
    fs::write(path, encoded)
}

fn trim_history(history: &mut Vec<String>) {
    if history.len() > MAX_HISTORY_ENTRIES {
        let drop_count = history.len() - MAX_HISTORY_ENTRIES;
        history.drain(0..drop_count);
    }
}

fn repl_history_path() -> PathBuf {
    if let Ok(path) = std::env::var("GLINT_REPL_HISTORY") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".glint").join("repl_history");
    }
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".glint").join("repl_history");
    }
    PathBuf::from(".glint_repl_history")
}
