use std::sync::Arc;

use serde::Serialize;

use super::context::ChatContext;
use super::filter::{ReplyKind, TopicFilter};
use crate::core::errors::ApiError;
use crate::history::HistoryStore;
use crate::rag::RagPipeline;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub kind: ReplyKind,
    pub sources: Vec<String>,
}

pub struct ChatService {
    filter: Arc<TopicFilter>,
    pipeline: Arc<RagPipeline>,
    history: HistoryStore,
    context_exchanges: usize,
}

impl ChatService {
    pub fn new(
        filter: Arc<TopicFilter>,
        pipeline: Arc<RagPipeline>,
        history: HistoryStore,
        context_exchanges: usize,
    ) -> Self {
        Self {
            filter,
            pipeline,
            history,
            context_exchanges,
        }
    }

    /// Answers one user message and records the exchange.
    pub async fn handle_message(&self, user_id: i64, input: &str) -> Result<ChatReply, ApiError> {
        if input.trim().is_empty() {
            return Err(ApiError::bad_request("Message cannot be empty."));
        }

        let reply = match self.filter.fast_path(input) {
            Some(canned) => ChatReply {
                reply: canned.text,
                kind: canned.kind,
                sources: Vec::new(),
            },
            None => {
                let recent = self
                    .history
                    .recent_exchanges(user_id, self.context_exchanges)
                    .await?;
                let context = ChatContext::from_exchanges(&recent, &self.filter);

                let response = self.pipeline.respond(input, context.as_ref()).await;
                ChatReply {
                    reply: response.answer,
                    kind: response.kind,
                    sources: response.sources,
                }
            }
        };

        self.history
            .save_chat_history(user_id, input, &reply.reply)
            .await?;
        tracing::debug!("Chat reply for user {} ({:?})", user_id, reply.kind);

        Ok(reply)
    }
}
