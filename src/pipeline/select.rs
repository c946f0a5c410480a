//! Interactive candidate selection with a wall-clock timeout.

use crate::cancel::CancelController;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::debug;

/// Present a numbered menu of `candidates` on stdout and read a 1-based
/// choice from stdin.
///
/// Returns `None` when the timeout expires, stdin hits EOF, or a
/// cooperative cancel arrives; the caller treats all three as
/// abandonment. Invalid entries (out of range, not a number) are
/// reported and re-prompted without resetting the deadline; the timeout
/// is wall-clock from the moment the menu is shown.
///
/// Zero candidates short-circuit to `None` and a single candidate is
/// returned without prompting.
pub async fn select_document(
    candidates: &[String],
    timeout: Duration,
    cancel: &CancelController,
) -> Option<String> {
    match candidates.len() {
        0 => return None,
        1 => {
            debug!(candidate = %candidates[0], "single candidate, skipping prompt");
            return Some(candidates[0].clone());
        }
        _ => {}
    }

    println!("\nAvailable PDF files:");
    for (i, name) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, name);
    }
    print_prompt(candidates.len());

    let deadline = Instant::now() + timeout;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    match line.trim().parse::<usize>() {
                        Ok(n) if (1..=candidates.len()).contains(&n) => {
                            return Some(candidates[n - 1].clone());
                        }
                        _ => {
                            println!("Invalid selection.");
                            print_prompt(candidates.len());
                        }
                    }
                }
                // EOF or read error: nobody is answering.
                Ok(None) | Err(_) => return None,
            },
            _ = tokio::time::sleep_until(deadline) => {
                println!("\nSelection timed out.");
                return None;
            }
            _ = poll.tick() => {
                if cancel.poll() {
                    return None;
                }
            }
        }
    }
}

fn print_prompt(count: usize) {
    print!("Select a PDF [1-{count}]: ");
    let _ = std::io::stdout().flush();
}
