use std::sync::Arc;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use url_inspector::api::{self, AppState};
use url_inspector::{Config, HttpAnalyzer, TaskQueue, UrlRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "url_inspector=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();

    let registry = Arc::new(UrlRegistry::new());
    let analyzer = Arc::new(HttpAnalyzer::new(config.http_timeout())?);
    let queue = Arc::new(TaskQueue::new(config.workers, registry.clone(), analyzer)?);

    let app = api::router(AppState { registry, queue })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(bind = %config.bind, workers = config.workers, "url-inspector listening");
    axum::serve(listener, app).await?;

    Ok(())
}
