use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    db::RatingStore,
    services::{providers::MetadataProvider, recommendations::RecommenderEngine},
};

/// Recommendation knobs taken from [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct RecommendationSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub fetch_timeout: Duration,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Config> for RecommendationSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_limit: config.default_recommendation_limit,
            max_limit: config.max_recommendation_limit,
            fetch_timeout: config.metadata_timeout(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rating_store: Arc<dyn RatingStore>,
    pub metadata_provider: Arc<dyn MetadataProvider>,
    pub engine: Arc<RecommenderEngine>,
    pub settings: RecommendationSettings,
}

impl AppState {
    pub fn new(
        rating_store: Arc<dyn RatingStore>,
        metadata_provider: Arc<dyn MetadataProvider>,
        settings: RecommendationSettings,
    ) -> Self {
        let engine = RecommenderEngine::new(
            Arc::clone(&rating_store),
            Arc::clone(&metadata_provider),
            settings.fetch_timeout,
        );

        Self {
            rating_store,
            metadata_provider,
            engine: Arc::new(engine),
            settings,
        }
    }
}
