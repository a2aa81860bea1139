use anyhow::{Context, Result};
use cv_builder::ai::DraftService;
use cv_builder::app_log;
use cv_builder::core::{ConfigManager, ServiceClient};
use cv_builder::web::ServerConfig;
use cv_builder::{graph, start_web_server};
use std::fs::OpenOptions;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "cv_builder=info,rocket=warn";

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json_layer = match std::env::var("LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(json_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging()?;

    let config = ConfigManager::load()?;
    config.ensure_directories().await?;

    app_log!(info, "Environment: {}", config.environment.name);

    let store = graph::open_store(&config.database).await?;
    let drafts = DraftService::new(ServiceClient::from_settings(&config.ai)?);
    if !drafts.ai_enabled() {
        app_log!(info, "No AI provider configured, drafts use heuristics only");
    }

    let server_config = ServerConfig {
        output_dir: config.environment.output_path.clone(),
        templates_dir: config.environment.templates_path.clone(),
    };

    start_web_server(
        config.server.port,
        store,
        server_config,
        drafts,
        config.server.cors_origins.clone(),
    )
    .await
}
