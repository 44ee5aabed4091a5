//! Command-line interface and REPL
//!
//! Thin console collaborator for the staged connection: each command maps
//! onto one commit operation and renders its outcome. The REPL owns no
//! setup logic of its own and resynchronizes the available commands after
//! every commit.

use anyhow::Result;
use rustyline::DefaultEditor;
use std::fmt;

use crate::connection::{Commit, StagedConnection};
use crate::registry::RecordKey;

const HELP: &str = "\
commands:
  endpoint <addr>      connect to a capture device
  project <id>         select or create a project
  participant <id>     select or create a participant
  calibration [id]     select or create a calibration (blank = new)
  recording [id]       select or create a recording (blank = new)
  status               show committed values and available commands
  help                 show this help
  exit                 quit";

pub async fn run_repl(conn: &mut StagedConnection) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{HELP}");

    loop {
        let readline = rl.readline("gaze> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);
                if line == "exit" || line == "quit" {
                    break;
                }
                dispatch(conn, line).await;
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Run one REPL command against the connection and print the result.
async fn dispatch(conn: &mut StagedConnection, line: &str) {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let outcome = match command {
        "help" => {
            println!("{HELP}");
            return;
        }
        "status" => {
            print_status(conn);
            return;
        }
        "endpoint" if !rest.is_empty() => conn.commit_endpoint(rest).await,
        "project" if !rest.is_empty() => conn.commit_project(RecordKey::parse(rest)).await,
        "participant" if !rest.is_empty() => {
            conn.commit_participant(RecordKey::parse(rest)).await
        }
        "calibration" => conn.commit_calibration(optional_key(rest)).await,
        "recording" => conn.commit_recording(optional_key(rest)).await,
        "endpoint" | "project" | "participant" => {
            println!("usage: {command} <id>");
            return;
        }
        _ => {
            println!("unrecognized command, try 'help'");
            return;
        }
    };

    match outcome {
        Ok(Commit::Advanced { value, options }) => {
            println!("{command} set to {value}");
            if !options.is_empty() {
                let options: Vec<String> = options.iter().map(ToString::to_string).collect();
                println!("  next options: {}", options.join(", "));
            }
        }
        Ok(Commit::Unchanged) => println!("{command} unchanged"),
        // stale values stay on screen; `status` resyncs them
        Err(err) => println!("{err}"),
    }
    print_enabled(conn);
}

fn optional_key(rest: &str) -> Option<RecordKey> {
    if rest.is_empty() {
        None
    } else {
        Some(RecordKey::parse(rest))
    }
}

fn print_status(conn: &StagedConnection) {
    println!("stage: {}", conn.stage());
    println!("  endpoint:    {}", display(conn.endpoint()));
    println!("  project:     {}", display(conn.project()));
    println!("  participant: {}", display(conn.participant()));
    println!("  calibration: {}", display(conn.calibration()));
    println!("  recording:   {}", display(conn.recording()));
    print_enabled(conn);
}

fn print_enabled(conn: &StagedConnection) {
    let enabled = conn.enabled_status();
    let mut available = vec!["endpoint"];
    if enabled.project {
        available.push("project");
    }
    if enabled.participant {
        available.push("participant");
    }
    if enabled.calibration {
        available.push("calibration");
    }
    if enabled.recording {
        available.push("recording");
    }
    println!("  available: {}", available.join(", "));
}

fn display<T: fmt::Display + ?Sized>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}
