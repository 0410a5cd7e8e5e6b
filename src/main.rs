mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod repository;
mod scrape;
mod service;

use std::{sync::Arc, time::Duration};

use handlers::rest;
use repository::{MemoryRepository, PgRepository, Repository, Unavailable};
use scrape::{Extractor, HttpFetcher};

use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use service::ScraperService;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load config
    let cfg = config::load_config().expect("failed to locate or load config");
    tracing::info!("Successfully loaded scraper config");

    // Repository creation and migration
    let repo = connect_repository(cfg.database_dsn.as_deref()).await;

    // Scraper setup
    let fetcher = HttpFetcher::new(
        cfg.scrape_url.clone(),
        cfg.user_agent.as_deref(),
        cfg.timeout_secs.map(Duration::from_secs),
    )
    .expect("failed to build HTTP client");
    let extractor = Extractor::new(&cfg.heading_selector).expect("invalid heading selector");
    tracing::info!(
        "Scraping '{}' for '{}'",
        cfg.scrape_url,
        cfg.heading_selector
    );

    // Service creation
    let service = Arc::new(ScraperService::new(
        repo,
        Arc::new(fetcher),
        extractor,
        cfg.default_user.clone(),
    ));

    // Seed the default user
    if let Err(e) = service.default_user_id().await {
        tracing::error!("Failed to create default user '{}': {e}", cfg.default_user);
    }

    // Router config
    let mut router = rest::router(service);
    if let Some(dir) = &cfg.public_dir {
        tracing::info!("Serving static files from '{}'", dir);
        router = router.fallback_service(ServeDir::new(dir));
    }
    let router = router.layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("listener has no local address");

    // Starting router
    tracing::info!("App running, listening on {}", addr);
    axum::serve(listener, router)
        .await
        .expect("failed to start server");
}

/// Connects to Postgres when a DSN is set. An unreachable database leaves the
/// server running with every store call failing.
async fn connect_repository(database_dsn: Option<&str>) -> Arc<dyn Repository> {
    let Some(dsn) = database_dsn else {
        tracing::warn!("No database DSN configured, records are kept in memory");
        return Arc::new(MemoryRepository::new());
    };

    let mut repo = match PgRepository::new(dsn).await {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("Failed to establish database connection: {e}");
            return Arc::new(Unavailable);
        }
    };

    if let Err(e) = repo.migrate().await {
        tracing::error!("Failed to migrate database: {e}");
    }

    Arc::new(repo)
}
