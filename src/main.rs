use std::sync::Arc;
use tracing::{error, info, warn};

use ai_or_human::classifier::{Classifier, ModelDescriptor, OnnxClassifier};
use ai_or_human::config::Config;
use ai_or_human::instagram::HttpPostFetcher;
use ai_or_human::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!("[ai-or-human] Starting ai-or-human server");
    info!("[ai-or-human] Models directory: {:?}", config.models_dir);
    info!("[ai-or-human] Static directory: {:?}", config.static_dir);

    // A missing model is not fatal: the page still loads and classification
    // requests get a "model not loaded" error.
    let classifier: Option<Arc<dyn Classifier>> = match ModelDescriptor::load(&config.models_dir) {
        Ok(descriptor) => {
            let loaded = tokio::task::spawn_blocking(move || OnnxClassifier::load(descriptor)).await?;
            match loaded {
                Ok(c) => Some(Arc::new(c) as Arc<dyn Classifier>),
                Err(e) => {
                    error!("[ai-or-human] Error loading model: {:#}", e);
                    None
                }
            }
        }
        Err(e) => {
            error!("[ai-or-human] Invalid model descriptor: {:#}", e);
            None
        }
    };
    if classifier.is_none() {
        warn!("[ai-or-human] Serving without a model; /upload and /instagram will fail");
    }

    let fetcher = Arc::new(HttpPostFetcher::new()?);
    let state = AppState::new(config.clone(), classifier, fetcher);

    // Periodic eviction of downloaded Instagram posts
    let posts = state.posts.clone();
    let ttl = config.instagram_cache_ttl;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            posts.cleanup(ttl);
        }
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("[ai-or-human] Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
