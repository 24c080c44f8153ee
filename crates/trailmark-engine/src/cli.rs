//! Interactive console attached to a live recording.

use crate::recorder::Recorder;
use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};
use trailmark_common::{Action, ActionKind};

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct ConsoleOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    /// Commands that end the console; the caller then stops the session.
    pub exit_commands: &'a [&'a str],
    pub handle_ctrl_c: bool,
    pub ctrl_c_message: Option<&'a str>,
}

pub const HELP_TEXT: &str = "\
Commands:
  status    Show the session id, state and number of recorded actions
  actions   List the actions recorded so far
  help      Show this help
  stop      Stop recording and write the action log (also: exit, quit)";

/// Run one console command against `recorder`.
pub async fn execute_command(recorder: &Recorder, line: &str) -> Result<String, String> {
    match line {
        "status" => {
            let session = recorder.session();
            Ok(format!(
                "Session {} ({:?}) on {} via {}: {} action(s)",
                session.id,
                recorder.state().await,
                session.base_url,
                session.engine,
                recorder.action_count().await
            ))
        }
        "actions" => {
            let actions = recorder.actions().await;
            if actions.is_empty() {
                return Ok("No actions recorded yet".to_string());
            }
            Ok(actions
                .iter()
                .enumerate()
                .map(|(i, action)| format_action(i, action))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        "help" => Ok(HELP_TEXT.to_string()),
        other => Err(format!("Unknown command '{}'. Type 'help'.", other)),
    }
}

/// One-line summary of an action, numbered like script steps.
pub fn format_action(index: usize, action: &Action) -> String {
    match &action.kind {
        ActionKind::Navigation => format!("{:>3}. navigation {}", index + 1, action.url),
        ActionKind::Click { selector } => format!("{:>3}. click {}", index + 1, selector),
        ActionKind::Input { selector, value } => {
            format!("{:>3}. input {} = {:?}", index + 1, selector, value)
        }
    }
}

/// Possible outcomes from reading a single console line.
enum ReadLineResult {
    Input(String),
    /// Empty line, re-prompt.
    Skip,
    /// EOF or exit command.
    Exit,
    Error(io::Error),
}

async fn read_line(
    reader: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    exit_commands: &[&str],
    handle_ctrl_c: bool,
    ctrl_c_message: Option<&str>,
    output: OutputHandlers,
) -> ReadLineResult {
    if handle_ctrl_c {
        tokio::select! {
            line = reader.next_line() => {
                classify_line(line, exit_commands)
            }
            _ = tokio::signal::ctrl_c() => {
                if let Some(message) = ctrl_c_message {
                    (output.out)(message);
                }
                ReadLineResult::Exit
            }
        }
    } else {
        classify_line(reader.next_line().await, exit_commands)
    }
}

fn classify_line(
    result: Result<Option<String>, io::Error>,
    exit_commands: &[&str],
) -> ReadLineResult {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim().to_lowercase();
            if trimmed.is_empty() {
                ReadLineResult::Skip
            } else if exit_commands.contains(&trimmed.as_str()) {
                ReadLineResult::Exit
            } else {
                ReadLineResult::Input(trimmed)
            }
        }
        Ok(None) => ReadLineResult::Exit,
        Err(e) => ReadLineResult::Error(e),
    }
}

/// Read commands from stdin until an exit command, EOF or Ctrl-C.
pub async fn run_console(
    recorder: &Recorder,
    output: OutputHandlers,
    options: ConsoleOptions<'_>,
) -> Result<(), Box<dyn Error>> {
    for line in options.banner_lines {
        (output.out)(line);
    }

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{}", options.prompt);
        stdout.flush()?;

        match read_line(
            &mut reader,
            options.exit_commands,
            options.handle_ctrl_c,
            options.ctrl_c_message,
            output,
        )
        .await
        {
            ReadLineResult::Input(line) => match execute_command(recorder, &line).await {
                Ok(result) => (output.out)(&result),
                Err(err) => (output.err)(&format!("Error: {}", err)),
            },
            ReadLineResult::Skip => continue,
            ReadLineResult::Exit => break,
            ReadLineResult::Error(e) => return Err(e.into()),
        }
    }
    Ok(())
}
