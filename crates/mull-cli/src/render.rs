//! Terminal output for turns.

use indicatif::{ProgressBar, ProgressStyle};
use mull_chat::{RecoveryState, SegmentUpdate, StreamEnd, TurnOutcome};
use std::time::Duration;

pub(crate) fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed}] {msg}")
            .expect("Invalid progress bar template"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("waiting for the model...");
    pb
}

/// Spinner message while the reply streams in.
pub(crate) fn show_update(pb: &ProgressBar, update: &SegmentUpdate) {
    let phase = if update.final_answer.is_some() {
        "answering"
    } else {
        "thinking"
    };
    let last_line = update
        .final_answer
        .as_deref()
        .or(update.thinking.as_deref())
        .and_then(|text| text.lines().last())
        .unwrap_or("");
    pb.set_message(format!("{} ({} bytes) {}", phase, update.buffer_len, preview(last_line)));
}

/// Spinner message while recovering.
pub(crate) fn show_state(pb: &ProgressBar, state: &RecoveryState) {
    match state {
        RecoveryState::Streamed | RecoveryState::Done => {}
        other => pb.set_message(format!("{}...", other)),
    }
}

pub(crate) fn print_outcome(outcome: &TurnOutcome) {
    match &outcome.stream_end {
        StreamEnd::Completed => {}
        StreamEnd::Cancelled => eprintln!("(stopped)"),
        StreamEnd::Failed(message) => eprintln!("Request failed: {}", message),
    }

    if let Some(thinking) = &outcome.thinking {
        println!("Thinking:");
        for line in thinking.lines() {
            println!("  | {}", line);
        }
        println!();
    }

    println!("Answer [{}]:", outcome.source);
    println!("{}", outcome.final_answer);
    println!();
}

fn preview(line: &str) -> String {
    const WIDTH: usize = 48;
    let count = line.chars().count();
    if count <= WIDTH {
        line.to_string()
    } else {
        let tail: String = line.chars().skip(count - WIDTH).collect();
        format!("...{}", tail)
    }
}
