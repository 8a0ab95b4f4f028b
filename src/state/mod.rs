use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::chat::{ChatService, TopicFilter};
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::db::open_pool;
use crate::core::security::SessionManager;
use crate::history::HistoryStore;
use crate::llm::LlmService;
use crate::rag::{RagIndexer, RagPipeline, RagStore, SqliteRagStore};

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes.
///
/// Contains:
/// - Resolved configuration
/// - User and history stores (one SQLite pool)
/// - Login sessions
/// - LLM service, document index and chat pipeline
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AppConfig>,
    pub accounts: AccountStore,
    pub history: HistoryStore,
    pub sessions: SessionManager,
    pub llm: LlmService,
    pub rag_store: Arc<dyn RagStore>,
    pub indexer: Arc<RagIndexer>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Initializes the application state from the environment.
    ///
    /// 1. Load `config.yml` from the resolved paths
    /// 2. Build the configured LLM provider
    /// 3. Open the databases and wire the chat pipeline
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_config()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let llm =
            LlmService::from_config(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?;

        Self::build(paths, settings, llm).await
    }

    /// Wires every service from already resolved paths, config and LLM.
    pub async fn build(
        paths: Arc<AppPaths>,
        settings: AppConfig,
        llm: LlmService,
    ) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());

        let pool = open_pool(&paths.db_path)
            .await
            .map_err(|e| InitializationError::Database(e.into()))?;
        let accounts = AccountStore::new(pool.clone());
        let history = HistoryStore::new(pool);
        let sessions = SessionManager::new(settings.auth.session_ttl_minutes);

        let rag_store: Arc<dyn RagStore> = Arc::new(
            SqliteRagStore::new(paths.as_ref())
                .await
                .map_err(|e| InitializationError::Rag(e.into()))?,
        );

        let documents_dir = config.documents_dir(&settings);
        let indexer = Arc::new(RagIndexer::new(
            rag_store.clone(),
            llm.clone(),
            documents_dir,
            &settings.rag,
        ));

        let filter = Arc::new(TopicFilter::new(&settings.topic_filter));
        let pipeline = Arc::new(RagPipeline::new(
            rag_store.clone(),
            llm.clone(),
            filter.clone(),
            settings.rag.top_k,
        ));
        let chat = Arc::new(ChatService::new(
            filter,
            pipeline,
            history.clone(),
            settings.chat.context_exchanges,
        ));

        Ok(Arc::new(AppState {
            settings: Arc::new(settings),
            accounts,
            history,
            sessions,
            llm,
            rag_store,
            indexer,
            chat,
        }))
    }
}
