pub mod defaults;
pub mod paths;
pub mod service;
pub mod validation;

pub use defaults::{AppConfig, CannedReplies, LlmConfig, RagConfig, TopicFilterConfig};
pub use paths::AppPaths;
pub use service::ConfigService;
