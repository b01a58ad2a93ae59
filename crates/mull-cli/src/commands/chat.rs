//! Chat command - interactive session.

use mull_chat::{ChatConfig, ChatEngine, Transcript};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render;

const HELP: &str = "Commands:
  /reset          clear the conversation
  /regenerate     ask the last question again
  /system <text>  replace the system prompt (empty removes it)
  /quit           leave

Ctrl-C stops the current reply.";

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Message(&'a str),
    Reset,
    Regenerate,
    System(&'a str),
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };

    let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match name {
        "reset" | "clear" => Input::Reset,
        "regenerate" | "retry" => Input::Regenerate,
        "system" => Input::System(rest.trim()),
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        _ => Input::Unknown(name),
    }
}

pub(crate) async fn run(config: ChatConfig) -> miette::Result<()> {
    let mut transcript = Transcript::with_system(&config.system_prompt);
    let engine = ChatEngine::new(config.client(), config);

    println!("Chatting with {} (type /help for commands)", engine.config().endpoint);
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout()
            .flush()
            .map_err(|e| miette::miette!("Failed to write prompt: {}", e))?;

        let line = tokio::select! {
            line = lines.next_line() => {
                line.map_err(|e| miette::miette!("Failed to read input: {}", e))?
            }
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match classify(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => println!("{}\n", HELP),
            Input::Reset => {
                transcript.reset();
                println!("Conversation cleared.\n");
            }
            Input::System(prompt) => {
                transcript.set_system_prompt(prompt);
                if prompt.is_empty() {
                    println!("System prompt removed.\n");
                } else {
                    println!("System prompt updated.\n");
                }
            }
            Input::Regenerate => match transcript.pop_last_exchange() {
                Some(question) => {
                    debug!("Regenerating answer for {:?}", question);
                    let outcome = super::run_turn(&engine, &mut transcript, &question).await;
                    render::print_outcome(&outcome);
                }
                None => println!("Nothing to regenerate.\n"),
            },
            Input::Message(text) => {
                let outcome = super::run_turn(&engine, &mut transcript, text).await;
                render::print_outcome(&outcome);
            }
            Input::Unknown(name) => println!("Unknown command /{} (try /help)\n", name),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("  hello there "), Input::Message("hello there"));
        assert_eq!(classify("/reset"), Input::Reset);
        assert_eq!(classify("/regenerate"), Input::Regenerate);
        assert_eq!(classify("/system  Be terse. "), Input::System("Be terse."));
        assert_eq!(classify("/system"), Input::System(""));
        assert_eq!(classify("/quit"), Input::Quit);
        assert_eq!(classify("/nope"), Input::Unknown("nope"));
        assert_eq!(classify("   "), Input::Empty);
    }
}
