//! The Carebell medication assistant.
//!
//! [`DialogueBridge`] turns a user's utterance plus their medication schedule
//! into a reply from a hosted chat-completion model. It also composes the
//! spoken reminder for a dose and the end-of-day adherence summary.

pub mod bridge;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;

pub use bridge::{DialogueBridge, DialogueExchange, ReminderMessage};
pub use completion::{ChatMessage, CompletionClient, CompletionRequest};
pub use config::AssistantConfig;
pub use context::{build_context, build_context_entries, ReminderSource, NO_MEDICATIONS};
pub use error::AssistantError;
