//! Parse command - split a saved response offline.

use mull_segments::{extract_answer, is_truncated, parse, ParseMode};
use std::fs;
use std::io::Read;
use std::path::Path;

pub fn run(file: Option<&Path>, tags: bool) -> miette::Result<()> {
    let text = match file {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| miette::miette!("Failed to read file: {}", e))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| miette::miette!("Failed to read stdin: {}", e))?;
            buf
        }
    };

    let mode = if tags { ParseMode::Tags } else { ParseMode::Labels };
    let segments = parse(&text, mode);

    println!("Mode: {}", mode);
    println!("Truncated: {}", if is_truncated(&text) { "yes" } else { "no" });
    println!();

    println!("Thinking:");
    println!("{}", segments.thinking.as_deref().unwrap_or("(none)"));
    println!();

    match segments.answer() {
        Some(answer) => {
            println!("Final Answer:");
            println!("{}", answer);
        }
        None => {
            println!("Final Answer: (none)");
            println!();
            println!("Heuristic answer:");
            println!("{}", extract_answer(segments.thinking.as_deref()));
        }
    }

    Ok(())
}
