use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::classifier::Classifier;
use crate::config::Config;
use crate::instagram::{PostCache, PostFetcher};
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// `None` when the model failed to load; classification requests are
    /// then refused.
    pub classifier: Option<Arc<dyn Classifier>>,
    pub fetcher: Arc<dyn PostFetcher>,
    pub posts: PostCache,
    pub metrics: Metrics,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: Config,
        classifier: Option<Arc<dyn Classifier>>,
        fetcher: Arc<dyn PostFetcher>,
    ) -> Self {
        Self {
            config,
            classifier,
            fetcher,
            posts: PostCache::new(),
            metrics: Metrics::new(),
            started_at: Utc::now(),
        }
    }
}
