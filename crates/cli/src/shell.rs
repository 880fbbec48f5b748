use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use hotline_call_engine::prelude::*;

pub(crate) const HELP: &str = "\
Commands:
  call <id>        a new call arrives
  answer <op>      operator picks up its ringing call
  reject <op>      operator declines its ringing call
  hangup <id>      caller hangs up
  state            show operators, ongoing calls and the waiting queue
  help             show this help
  quit             leave";

pub(crate) const PROMPT: &str = "(hotline) ";

/// What to do with a typed line before it reaches the engine
pub(crate) enum LocalAction {
    Quit,
    Help,
    Skip,
    Forward,
}

pub(crate) fn classify(line: &str) -> LocalAction {
    match line.trim().to_lowercase().as_str() {
        "quit" | "exit" | "q" => LocalAction::Quit,
        "help" | "?" => LocalAction::Help,
        "" => LocalAction::Skip,
        _ => LocalAction::Forward,
    }
}

pub(crate) fn prompt() {
    print!("{}", PROMPT);
    let _ = std::io::stdout().flush();
}

pub(crate) fn print_notification(message: &str) {
    println!("\n{}", message.yellow());
}

pub async fn run(config: &HotlineConfig) -> Result<()> {
    let engine = CallCenterEngine::start(config)?;
    let mut notifications = engine.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Hotline shell with {} operators, ring timeout {}. Type help for commands.",
        config.operators.count,
        match config.routing.ring_timeout() {
            Some(timeout) => format!("{:?}", timeout),
            None => "disabled".to_string(),
        }
    );
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!();
                    break;
                };

                match classify(&line) {
                    LocalAction::Quit => break,
                    LocalAction::Help => println!("{}", HELP),
                    LocalAction::Skip => {}
                    LocalAction::Forward => match Command::parse_line(&line) {
                        Ok(command) => match engine.execute(command).await {
                            Ok(message) => println!("{}", message),
                            Err(e) => println!("{}", e.to_string().red()),
                        },
                        Err(e) => println!("{}", e.to_string().red()),
                    },
                }
                prompt();
            }
            notification = notifications.recv() => match notification {
                Ok(notification) => {
                    print_notification(&notification.message);
                    prompt();
                }
                Err(RecvError::Lagged(skipped)) => {
                    println!("{}", format!("({} notifications dropped)", skipped).red());
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}
