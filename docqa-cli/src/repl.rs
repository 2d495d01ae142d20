//! Terminal chat loop.

use std::path::Path;

use anyhow::{Context, Result};
use docqa_core::TurnStatus;
use docqa_session::{Assistant, Session};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

const HELP: &str = "\
Commands:
  /upload PATH   process a PDF, TXT or DOCX file (replaces the current document)
  /history       show the questions and answers so far
  /help          show this message
  /quit          leave the chat
Anything else is sent as a question.";

/// One line of chat input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Upload(&'a str),
    History,
    Help,
    Quit,
    Question(&'a str),
    Empty,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Question(line);
        };
        let (name, arg) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        match (name, arg.trim()) {
            ("upload", "") => Input::Unknown(line),
            ("upload", path) => Input::Upload(path),
            ("history", _) => Input::History,
            ("help", _) => Input::Help,
            ("quit" | "exit", _) => Input::Quit,
            _ => Input::Unknown(line),
        }
    }
}

/// Read `path` and process it as the session's document, printing a summary.
pub async fn upload_file(assistant: &Assistant, session: &mut Session, path: &Path) -> Result<()> {
    let bytes =
        tokio::fs::read(path).await.with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;

    let summary = assistant.process_upload(session, &file_name, &bytes).await?;
    println!(
        "Processed {} ({} characters, {} chunks). Ask away.",
        summary.file_name, summary.char_count, summary.chunk_count
    );
    Ok(())
}

fn print_history(session: &Session) {
    if session.history().is_empty() {
        println!("No questions yet.");
        return;
    }
    for turn in session.history() {
        let marker = match turn.status {
            TurnStatus::Answered => "",
            TurnStatus::Failed => " [error]",
        };
        println!("#{} Q: {}", turn.order + 1, turn.question);
        println!("   A{marker}: {}", turn.answer);
    }
}

/// Run the chat loop until `/quit`, Ctrl-C or Ctrl-D.
pub async fn run_chat(assistant: &Assistant, initial_file: Option<&Path>) -> Result<()> {
    let mut session = assistant.create_session();
    println!("docqa session {}. Type /help for commands.", session.id());

    if let Some(path) = initial_file {
        if let Err(e) = upload_file(assistant, &mut session, path).await {
            eprintln!("Error: {e:#}");
        }
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let input = Input::parse(&line);
        if !matches!(input, Input::Empty) {
            let _ = rl.add_history_entry(line.trim());
        }

        match input {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::History => print_history(&session),
            Input::Unknown(text) => println!("Unknown command {text}. Type /help for commands."),
            Input::Upload(path) => {
                if let Err(e) = upload_file(assistant, &mut session, Path::new(path)).await {
                    eprintln!("Error: {e:#}");
                }
            }
            Input::Question(question) => match assistant.ask(&mut session, question).await {
                Ok(turn) if turn.is_failed() => eprintln!("Error: {}", turn.answer),
                Ok(turn) => println!("{}", turn.answer),
                Err(e) => eprintln!("{e}"),
            },
        }
    }

    println!("Goodbye.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse("/upload  docs/report.pdf "), Input::Upload("docs/report.pdf"));
        assert_eq!(Input::parse("/history"), Input::History);
        assert_eq!(Input::parse("/help"), Input::Help);
        assert_eq!(Input::parse("/quit"), Input::Quit);
        assert_eq!(Input::parse("/exit"), Input::Quit);
    }

    #[test]
    fn everything_else_is_a_question() {
        assert_eq!(Input::parse("  What is this about? "), Input::Question("What is this about?"));
        assert_eq!(Input::parse("   "), Input::Empty);
    }

    #[test]
    fn malformed_commands_are_unknown() {
        assert_eq!(Input::parse("/upload"), Input::Unknown("/upload"));
        assert_eq!(Input::parse("/frobnicate x"), Input::Unknown("/frobnicate x"));
    }
}
