//! # Mull Chat
//!
//! Runs chat turns against a local reasoning model and always ends with a
//! final answer, even when the model runs out of tokens mid-thought.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │  Generation  │ --> │  StreamConsumer  │ --> │   Orchestrator   │
//! │   backend    │     │ (buffer + parse) │     │ (no final answer)│
//! └──────────────┘     └──────────────────┘     └──────────────────┘
//!                                                  finish -> summarize
//!                                                  -> heuristic
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use mull_chat::{ChatConfig, ChatEngine, Transcript, TurnContext};
//!
//! let config = ChatConfig::from_env();
//! let engine = ChatEngine::new(config.client(), config.clone());
//! let mut transcript = Transcript::with_system(&config.system_prompt);
//!
//! let outcome = engine
//!     .run_turn(&mut transcript, "Why is the sky blue?", &TurnContext::default(), |_| {}, |_| {})
//!     .await;
//! println!("{} [{}]", outcome.final_answer, outcome.source);
//! ```

mod cancel;
mod config;
mod consumer;
mod engine;
pub mod prompt;
mod recovery;
mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cancel::CancelFlag;
pub use config::{ChatConfig, ChatConfigBuilder, ConfigError, RecoveryPolicy, DEFAULT_SYSTEM_PROMPT};
pub use consumer::{SegmentUpdate, StreamConsumer, StreamEnd, StreamOutcome};
pub use engine::{ChatEngine, TurnContext, TurnOutcome};
pub use recovery::{
    AnswerSource, AttemptOutcome, Orchestrator, RecoveryAttempt, RecoveryContext, RecoveryState,
    Resolution,
};
pub use session::Transcript;
