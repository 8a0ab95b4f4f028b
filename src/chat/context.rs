use super::filter::TopicFilter;
use crate::history::HistoryEntry;

/// Recent conversation handed to the RAG pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    /// `User:` / `Assistant:` lines, oldest first.
    pub transcript: String,
    /// Earlier user messages that got past the keyword rules. Topic checks
    /// read only these, never the bot's replies.
    pub user_turns: Vec<String>,
}

impl ChatContext {
    /// `None` when there is no earlier exchange.
    pub fn from_exchanges(exchanges: &[HistoryEntry], filter: &TopicFilter) -> Option<Self> {
        if exchanges.is_empty() {
            return None;
        }
        Some(Self {
            transcript: build_chat_context(exchanges),
            user_turns: exchanges
                .iter()
                .filter(|e| !filter.is_canned(&e.answer))
                .map(|e| e.question.clone())
                .collect(),
        })
    }
}

/// Renders exchanges (oldest first) as `User:` / `Assistant:` lines.
pub fn build_chat_context(exchanges: &[HistoryEntry]) -> String {
    let mut lines = Vec::with_capacity(exchanges.len() * 2);
    for exchange in exchanges {
        lines.push(format!("User: {}", exchange.question));
        lines.push(format!("Assistant: {}", exchange.answer));
    }
    lines.join("\n")
}
