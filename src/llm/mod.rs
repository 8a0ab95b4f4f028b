pub mod lmstudio;
pub mod ollama;
pub mod provider;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

pub use provider::LlmProvider;
pub use service::LlmService;
pub use types::{ChatMessage, ChatRequest};
