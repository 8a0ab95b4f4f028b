use std::sync::Arc;

use serde::Serialize;

use super::prompt::build_prompt;
use super::store::RagStore;
use crate::chat::context::ChatContext;
use crate::chat::filter::{ReplyKind, TopicFilter};
use crate::core::errors::ApiError;
use crate::llm::LlmService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RagResponse {
    pub answer: String,
    /// Distinct source file names of the retrieved chunks.
    pub sources: Vec<String>,
    pub kind: ReplyKind,
}

impl RagResponse {
    fn canned(kind: ReplyKind, answer: String) -> Self {
        Self {
            answer,
            sources: Vec::new(),
            kind,
        }
    }
}

/// Query text sent to retrieval and the model when there is prior conversation.
pub fn combined_query(question: &str, context: Option<&str>) -> String {
    match context {
        Some(ctx) if !ctx.trim().is_empty() => format!(
            "Previous conversation:\n{}\n\nCurrent question:\n{}",
            ctx, question
        ),
        _ => question.to_string(),
    }
}

pub struct RagPipeline {
    store: Arc<dyn RagStore>,
    llm: LlmService,
    filter: Arc<TopicFilter>,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(
        store: Arc<dyn RagStore>,
        llm: LlmService,
        filter: Arc<TopicFilter>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            llm,
            filter,
            top_k: top_k.max(1),
        }
    }

    pub async fn get_rag_response(&self, question: &str) -> RagResponse {
        self.respond(question, None).await
    }

    /// Runs the keyword gate, then retrieval and generation. Never fails:
    /// model or index errors come back as an `Error: ...` answer.
    pub async fn respond(&self, question: &str, context: Option<&ChatContext>) -> RagResponse {
        let question = question.trim();
        let earlier_questions = context.map(|c| c.user_turns.as_slice()).unwrap_or(&[]);

        if let Some(reply) = self.filter.gate(question, earlier_questions) {
            tracing::debug!("Pipeline gate answered with {:?}", reply.kind);
            return RagResponse::canned(reply.kind, reply.text);
        }

        let query = combined_query(question, context.map(|c| c.transcript.as_str()));
        match self.retrieve_and_answer(&query).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("RAG pipeline failed: {}", err);
                RagResponse::canned(ReplyKind::Error, format!("Error: {}", err.user_message()))
            }
        }
    }

    async fn retrieve_and_answer(&self, query: &str) -> Result<RagResponse, ApiError> {
        let embedding = self.llm.embed_query(query).await?;
        let hits = self.store.search(&embedding, self.top_k).await?;

        if hits.is_empty() {
            return Ok(RagResponse::canned(
                ReplyKind::NoInformation,
                self.filter.replies().no_information.clone(),
            ));
        }

        let mut sources: Vec<String> = Vec::new();
        for hit in &hits {
            if !sources.contains(&hit.chunk.source) {
                sources.push(hit.chunk.source.clone());
            }
        }

        let chunks: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
        let prompt = build_prompt(&chunks, query);
        let answer = self.llm.complete(&prompt).await?;

        tracing::info!(
            "Answered from {} chunks ({})",
            hits.len(),
            sources.join(", ")
        );

        Ok(RagResponse {
            answer,
            sources,
            kind: ReplyKind::Answer,
        })
    }
}
