//! Parser for annotated SQL migration files.
//!
//! A migration file carries its forward and reverse statements in sections:
//!
//! ```sql
//! -- +goose Up
//! CREATE TABLE users (id Uint64, PRIMARY KEY (id));
//!
//! -- +goose Down
//! DROP TABLE users;
//! ```
//!
//! Statements end at a line whose trimmed text ends with `;`. Anything between
//! `-- +goose StatementBegin` and `-- +goose StatementEnd` is kept as a single
//! statement. `-- +goose NO TRANSACTION` disables the per-script transaction.

use crate::error::{CoreError, CoreResult};

const ANNOTATION_PREFIX: &str = "-- +goose";

/// Statements extracted from one migration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScript {
    pub up: Vec<String>,
    pub down: Vec<String>,
    pub use_transaction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Up,
    Down,
}

#[derive(Debug)]
enum Annotation {
    Up,
    Down,
    StatementBegin,
    StatementEnd,
    NoTransaction,
}

fn parse_annotation(line: &str) -> Option<Result<Annotation, String>> {
    let rest = line.trim().strip_prefix(ANNOTATION_PREFIX)?;
    let command = rest.trim();
    let annotation = match command.to_ascii_lowercase().as_str() {
        "up" => Annotation::Up,
        "down" => Annotation::Down,
        "statementbegin" => Annotation::StatementBegin,
        "statementend" => Annotation::StatementEnd,
        "no transaction" => Annotation::NoTransaction,
        _ => return Some(Err(format!("unknown annotation '{}'", command))),
    };
    Some(Ok(annotation))
}

fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("--")
}

struct ParseState<'a> {
    path: &'a str,
    section: Section,
    in_block: bool,
    buffer: String,
    script: ParsedScript,
    saw_up: bool,
}

impl ParseState<'_> {
    fn error(&self, reason: impl Into<String>) -> CoreError {
        CoreError::MalformedMigration {
            path: self.path.to_string(),
            reason: reason.into(),
        }
    }

    fn flush(&mut self) {
        let statement = self.buffer.trim().to_string();
        self.buffer.clear();
        if statement.is_empty() {
            return;
        }
        match self.section {
            Section::Up => self.script.up.push(statement),
            Section::Down => self.script.down.push(statement),
            Section::Preamble => {}
        }
    }

    fn switch_section(&mut self, next: Section) -> CoreResult<()> {
        if self.in_block {
            return Err(self.error("section annotation inside a StatementBegin block"));
        }
        if !self.buffer.trim().is_empty() {
            return Err(self.error("statement is missing a terminating ';'"));
        }
        self.buffer.clear();
        self.section = next;
        Ok(())
    }
}

/// Whether `line` terminates a statement. Anything after `--` is a comment,
/// so `-- note;` does not end one and `SELECT 1; -- note` does.
fn ends_with_semicolon(line: &str) -> bool {
    let code = line.split_once("--").map_or(line, |(code, _)| code);
    code.trim_end().ends_with(';')
}

/// Parse the contents of a migration file into up/down statements.
///
/// `path` is only used to give errors a location.
pub fn parse_script(path: &str, content: &str) -> CoreResult<ParsedScript> {
    let mut state = ParseState {
        path,
        section: Section::Preamble,
        in_block: false,
        buffer: String::new(),
        script: ParsedScript {
            use_transaction: true,
            ..ParsedScript::default()
        },
        saw_up: false,
    };

    for (idx, line) in content.lines().enumerate() {
        if let Some(annotation) = parse_annotation(line) {
            let annotation = annotation
                .map_err(|reason| state.error(format!("line {}: {}", idx + 1, reason)))?;
            match annotation {
                Annotation::Up => {
                    if state.saw_up {
                        return Err(state.error("more than one Up section"));
                    }
                    state.saw_up = true;
                    state.switch_section(Section::Up)?;
                }
                Annotation::Down => {
                    if !state.saw_up {
                        return Err(state.error("Down section appears before Up section"));
                    }
                    state.switch_section(Section::Down)?;
                }
                Annotation::StatementBegin => {
                    if state.section == Section::Preamble {
                        return Err(state.error("StatementBegin outside an Up/Down section"));
                    }
                    if state.in_block {
                        return Err(state.error(format!("line {}: nested StatementBegin", idx + 1)));
                    }
                    if !state.buffer.trim().is_empty() {
                        return Err(state.error("statement is missing a terminating ';'"));
                    }
                    state.in_block = true;
                }
                Annotation::StatementEnd => {
                    if !state.in_block {
                        return Err(state.error(format!(
                            "line {}: StatementEnd without StatementBegin",
                            idx + 1
                        )));
                    }
                    state.in_block = false;
                    state.flush();
                }
                Annotation::NoTransaction => state.script.use_transaction = false,
            }
            continue;
        }

        match state.section {
            Section::Preamble => {
                if !is_comment_or_blank(line) {
                    return Err(state.error(format!(
                        "line {}: statement before the '{} Up' annotation",
                        idx + 1,
                        ANNOTATION_PREFIX
                    )));
                }
            }
            Section::Up | Section::Down => {
                if !state.in_block && state.buffer.is_empty() && is_comment_or_blank(line) {
                    continue;
                }
                state.buffer.push_str(line);
                state.buffer.push('\n');
                if !state.in_block && ends_with_semicolon(line) {
                    state.flush();
                }
            }
        }
    }

    if state.in_block {
        return Err(state.error("StatementBegin without matching StatementEnd"));
    }
    if !state.buffer.trim().is_empty() {
        return Err(state.error("statement is missing a terminating ';'"));
    }
    if !state.saw_up {
        return Err(state.error(format!("missing '{} Up' annotation", ANNOTATION_PREFIX)));
    }

    Ok(state.script)
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
