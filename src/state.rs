use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::memory::MemoryStore;
use crate::database::ScoringStore;
use crate::services::innings_service::InningsService;
use crate::services::match_service::MatchService;
use crate::services::read_models::ReadModels;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ScoringStore>,
    pub matches: MatchService,
    pub innings: InningsService,
    pub views: ReadModels,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn ScoringStore>) -> Self {
        let matches = MatchService::new(store.clone(), config.max_write_retries);
        let innings = InningsService::new(store.clone(), matches.clone(), config.max_write_retries);
        let views = ReadModels::new(store.clone(), config.recent_balls_window);

        AppState {
            config: Arc::new(config),
            store,
            matches,
            innings,
            views,
        }
    }

    /// Default configuration over a fresh in-memory store.
    pub fn in_memory() -> Self {
        AppState::new(AppConfig::default(), Arc::new(MemoryStore::new()))
    }
}
