use anyhow::Result;
use clap::Parser;
use cv_builder::cli::{handle_command, Cli};
use cv_builder::core::ConfigManager;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cv_builder=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigManager::load()?;
    handle_command(cli, &config).await
}
