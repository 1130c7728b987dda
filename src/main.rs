#[cfg(feature = "http-server")]
mod api;
mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;

use config::AppConfig;
use handlers::MenuAnalysisService;
use services::{AnalysisStore, Database, InMemoryStore, OpenRouterService, VisionAnalysisClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting Menu Drink Selector...");

    let config = AppConfig::from_env()?;

    let store: Arc<dyn AnalysisStore> = match &config.database_url {
        Some(database_url) => {
            let db = Database::new(database_url).await?;
            log::info!("✅ PostgreSQL database initialized");
            Arc::new(db)
        }
        None => {
            log::warn!("⚠️ DATABASE_URL not set, analyses are kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    let vision: Arc<dyn VisionAnalysisClient> = Arc::new(OpenRouterService::new(
        config.openrouter_api_key.clone(),
        config.openrouter_model.clone(),
        config.openrouter_base_url.clone(),
        config.vision_max_tokens,
        config.vision_timeout,
    )?);
    log::info!("✅ OpenRouter service initialized with model: {}", config.openrouter_model);

    let menu_service = Arc::new(MenuAnalysisService::new(store, vision, config.vision_timeout));

    #[cfg(feature = "http-server")]
    {
        let app = api::create_router(menu_service, config.max_upload_bytes);
        let addr = config.bind_addr();

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        log::info!("🌐 Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                log::info!("🛑 Shutting down...");
            })
            .await?;
    }

    #[cfg(not(feature = "http-server"))]
    {
        let _ = menu_service;
        log::warn!("⚠️ Built without the http-server feature, nothing to serve");
    }

    Ok(())
}
