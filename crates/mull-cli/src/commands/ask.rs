//! Ask command - one question, one answer.

use mull_chat::{ChatConfig, ChatEngine, Transcript};

use crate::render;

pub(crate) async fn run(prompt: &str, config: ChatConfig) -> miette::Result<()> {
    if prompt.trim().is_empty() {
        return Err(miette::miette!("Prompt must not be empty"));
    }

    let mut transcript = Transcript::with_system(&config.system_prompt);
    let engine = ChatEngine::new(config.client(), config);

    let outcome = super::run_turn(&engine, &mut transcript, prompt).await;
    render::print_outcome(&outcome);

    if !outcome.attempts.is_empty() {
        println!("({} finish attempt(s))", outcome.attempts.len());
    }
    Ok(())
}
