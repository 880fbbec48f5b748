use anyhow::{Context, Result};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use hotline_call_engine::prelude::*;

use crate::shell::{classify, print_notification, prompt, LocalAction, HELP};

/// Interactive client: typed lines go to the server, every frame coming back
/// is printed as it arrives
pub async fn run(addr: &str) -> Result<()> {
    let client = HotlineClient::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;
    let (mut sender, mut receiver) = client.into_split();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Connected to {}. Type help for commands.", addr);
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                match classify(&line) {
                    LocalAction::Quit => break,
                    LocalAction::Help => println!("{}", HELP),
                    LocalAction::Skip => {}
                    LocalAction::Forward => match sender.send_line(&line).await {
                        // The prompt comes back with the response
                        Ok(()) => continue,
                        Err(e) => println!("{}", e.to_string().red()),
                    },
                }
                prompt();
            }
            frame = receiver.next_frame() => match frame? {
                Some(frame) if frame.notification => {
                    print_notification(&frame.message);
                    prompt();
                }
                Some(frame) => {
                    println!("{}", frame.message);
                    prompt();
                }
                None => {
                    println!("\n{}", "Server closed the connection".red());
                    break;
                }
            },
        }
    }

    sender.shutdown().await.ok();
    Ok(())
}
