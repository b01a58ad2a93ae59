//! CLI commands.

pub mod ask;
pub mod chat;
pub mod info;
pub mod parse;

use mull_chat::{CancelFlag, ChatEngine, Transcript, TurnContext, TurnOutcome};
use mull_client::GenerationClient;

use crate::render;

/// Run one turn with a spinner, stopping it on Ctrl-C.
pub(crate) async fn run_turn(
    engine: &ChatEngine<GenerationClient>,
    transcript: &mut Transcript,
    input: &str,
) -> TurnOutcome {
    let cancel = CancelFlag::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let pb = render::spinner();
    let outcome = engine
        .run_turn(
            transcript,
            input,
            &TurnContext::new(cancel),
            |update| render::show_update(&pb, update),
            |state| render::show_state(&pb, state),
        )
        .await;
    pb.finish_and_clear();
    watcher.abort();

    outcome
}
