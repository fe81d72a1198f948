//! The campus assistant service.
//!
//! A standalone HTTP service exposing a single chat endpoint. Each request
//! loads the user's conversation history, classifies the message into
//! data-fetch intents, inlines the fetched campus data as a context block,
//! forwards the conversation to the configured LLM, and persists the reply.

mod chat;
mod context;
mod fallback;
mod history;
mod intent;

pub use chat::routes;
pub use context::{AssembledContext, ContextFetch, ContextFetcher};
pub use fallback::{
    FallbackData, FALLBACK_ANNOUNCEMENTS, FALLBACK_LOSTFOUND, FALLBACK_TIMETABLE, STUDY_TIPS,
    SYSTEM_PROMPT,
};
pub use history::HistoryStore;
pub use intent::{classify, Intent, LostFoundQuery};

use crate::db::DbPool;
use crate::services::LlmService;
use crate::{config, Result};

/// Shared state for the assistant service.
#[derive(Clone)]
pub struct AssistantState {
    pub history: HistoryStore,
    pub fetcher: ContextFetcher,
    pub llm: LlmService,
    pub max_image_size: usize,
}

impl AssistantState {
    /// Create assistant state from the global configuration.
    pub async fn new() -> Result<Self> {
        let config = config::config();

        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Ok(Self::with_parts(
            db,
            config.assistant.api_base_url.clone(),
            FallbackData::default(),
            LlmService::new(&config.llm),
            config.assistant.history_max_turns,
            config.storage.max_upload_size,
        ))
    }

    /// Create assistant state from explicit parts (used by tests to swap
    /// the fallback datasets, API endpoint, and LLM provider).
    pub fn with_parts(
        db: DbPool,
        api_base_url: String,
        fallback: FallbackData,
        llm: LlmService,
        history_max_turns: usize,
        max_image_size: usize,
    ) -> Self {
        let history = HistoryStore::new(db.clone(), SYSTEM_PROMPT.to_string(), history_max_turns);
        let fetcher = ContextFetcher::new(api_base_url, fallback, db);

        Self {
            history,
            fetcher,
            llm,
            max_image_size,
        }
    }
}
