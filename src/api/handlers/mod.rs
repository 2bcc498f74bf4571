use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::settings::AppConfig;
use crate::domain::ItemId;
use crate::prediction::PredictionEngine;

pub mod survey;

pub struct AppState {
    pub engine: PredictionEngine,
    pub config: AppConfig,
    /// Items asked of each open survey session, keyed by session id.
    /// Entries are dropped once the session's predictions are served.
    pub sessions: Mutex<HashMap<u64, Vec<ItemId>>>,
    /// Source of session ids and of per-request query tokens. Query
    /// respondents get a fresh token on every prediction request so
    /// similarity cache entries are never reused with different content.
    next_token: AtomicU64,
}

impl AppState {
    pub fn new(engine: PredictionEngine, config: AppConfig) -> Self {
        Self {
            engine,
            config,
            sessions: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(0),
        }
    }

    /// Next id from the shared sequence. Session ids and query tokens
    /// are drawn from the same counter, so they never collide.
    pub fn mint_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::panel::PanelRepository;

    #[test]
    fn minted_tokens_are_unique_and_increasing() {
        let panel = PanelRepository::from_respondents(vec![]);
        let state = AppState::new(
            PredictionEngine::new(panel, EngineSettings::default()),
            AppConfig::new(),
        );
        let first = state.mint_token();
        let second = state.mint_token();
        assert!(first >= 1);
        assert_eq!(second, first + 1);
    }
}
