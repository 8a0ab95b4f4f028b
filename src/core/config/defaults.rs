//! Typed configuration and its built-in defaults.
//!
//! `config.yml` only needs to carry the keys it overrides; everything else
//! falls back to the values below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub chat: ChatConfig,
    pub auth: AuthConfig,
    pub topic_filter: TopicFilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `ollama` or `lmstudio`
    pub provider: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            chat_model: "phi3:mini".to_string(),
            embedding_model: "all-minilm".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Overrides `<project_root>/data` when set.
    pub documents_dir: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub embed_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            documents_dir: None,
            chunk_size: 800,
            chunk_overlap: 150,
            top_k: 2,
            embed_batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Stored exchanges replayed to the model as conversation context.
    pub context_exchanges: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_exchanges: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub session_ttl_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: 720,
        }
    }
}

/// Keyword lists and canned replies for the two filter layers.
///
/// The `fast_*`, `help_triggers` and `goodbye_triggers` lists gate the chat
/// endpoint before anything else runs; `greetings`, `pet_keywords`,
/// `non_pet_keywords` and `polite_phrases` gate the RAG pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicFilterConfig {
    pub fast_greetings: Vec<String>,
    pub help_triggers: Vec<String>,
    pub goodbye_triggers: Vec<String>,
    pub fast_non_pet_keywords: Vec<String>,
    pub greetings: Vec<String>,
    pub pet_keywords: Vec<String>,
    pub non_pet_keywords: Vec<String>,
    pub polite_phrases: Vec<String>,
    pub replies: CannedReplies,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedReplies {
    pub fast_greeting: String,
    pub greeting: String,
    pub help: String,
    pub goodbye: String,
    pub polite: String,
    pub off_topic: String,
    pub no_information: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

impl Default for TopicFilterConfig {
    fn default() -> Self {
        Self {
            fast_greetings: strings(&["hi", "hello", "hey", "hai"]),
            help_triggers: strings(&["help", "help please", "please help", "i need help"]),
            goodbye_triggers: strings(&[
                "ok",
                "okay",
                "okay done",
                "done",
                "thank you",
                "thanks",
                "bye",
                "ok bye",
                "okay thank you",
            ]),
            fast_non_pet_keywords: strings(&[
                "capital",
                "president",
                "math",
                "country",
                "physics",
                "chemistry",
                "france",
                "india",
                "history",
                "human anatomy",
                "human brain",
                "computer",
                "machine",
            ]),
            greetings: strings(&["hi", "hello", "hey", "hii", "yo"]),
            pet_keywords: strings(&[
                "dog",
                "dogs",
                "cat",
                "cats",
                "kitten",
                "puppy",
                "parrot",
                "bird",
                "rabbit",
                "hamster",
                "pet",
                "animal",
                "vet",
                "veterinary",
                "clinic",
                "hi",
                "hello",
            ]),
            non_pet_keywords: strings(&[
                "capital",
                "president",
                "math",
                "country",
                "physics",
                "chemistry",
                "france",
                "india",
                "pasta",
                "recipe",
                "human",
                "brain",
                "history",
                "computer",
                "technology",
                "mobile",
                "actor",
                "movie",
            ]),
            polite_phrases: strings(&["ok", "okay", "thanks", "thank you", "done", "ok done"]),
            replies: CannedReplies::default(),
        }
    }
}

impl Default for CannedReplies {
    fn default() -> Self {
        Self {
            fast_greeting: "Hi! How can I help with your pet today? 🐾".to_string(),
            greeting: "Hi! How can I help with your pet today?".to_string(),
            help: "I'm here to help 🐾\n\nPlease tell me what’s happening with your pet — \
                   for example symptoms, behavior changes, or concerns."
                .to_string(),
            goodbye: "I'm glad I could help. Take good care of your pet — feel free to ask anytime! 🐾"
                .to_string(),
            polite: "I'm glad I could help. Take good care of your pet, and feel free to ask if you need anything else."
                .to_string(),
            off_topic:
                "This question is not related to pets or veterinary topics, so I cannot answer it."
                    .to_string(),
            no_information: "I don't have enough information from the documents.".to_string(),
        }
    }
}
