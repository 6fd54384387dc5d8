mod api;
pub mod prompts;
mod provider;

pub use api::ChatClient;
pub use provider::{CompletionOptions, LlmBackend, LlmProvider};
