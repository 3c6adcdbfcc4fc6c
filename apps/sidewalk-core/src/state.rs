use crate::config::CoreConfig;
use crate::services::completion::CompletionClient;
use crate::services::live::LiveFeed;
use crate::services::readings::PgReadingStore;
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: CoreConfig,
    pub db: PgPool,
    pub readings: Arc<PgReadingStore>,
    pub live: LiveFeed,
    pub completions: Arc<CompletionClient>,
}

impl AppState {
    pub fn new(config: CoreConfig, db: PgPool, http: Client) -> Self {
        let readings = Arc::new(PgReadingStore::new(db.clone()));
        let live = LiveFeed::new(config.live_broadcast_capacity);
        let completions = Arc::new(CompletionClient::from_config(&config, http));
        Self {
            config,
            db,
            readings,
            live,
            completions,
        }
    }
}
