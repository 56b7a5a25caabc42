use std::sync::Mutex;

use crate::config::AppConfig;
use crate::domain::model::Article;

/// Shared application state. The last aggregate is kept in memory so a
/// search request can run against it without re-reading the export files.
pub struct AppState {
    pub config: AppConfig,
    pub aggregate: Mutex<Option<Vec<Article>>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            aggregate: Mutex::new(None),
        }
    }

    pub fn store_aggregate(&self, articles: Vec<Article>) {
        let mut guard = self.aggregate.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(articles);
    }

    pub fn stored_aggregate(&self) -> Option<Vec<Article>> {
        let guard = self.aggregate.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }
}
