// src/core/config_manager.rs
//! Process configuration gathered from the environment (and `.env`) in one place

use anyhow::{Context, Result};
use std::str::FromStr;

use crate::app_log;
use crate::environment::EnvironmentConfig;

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub database: DatabaseSettings,
    pub ai: AiSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Neo4j,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "neo4j" => Ok(StoreBackend::Neo4j),
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("Unknown STORE_BACKEND '{}'. Expected neo4j or memory", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub backend: StoreBackend,
    pub uri: String,
    pub user: String,
    pub password: String,
    pub connect_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

impl AiSettings {
    /// A provider is usable only with both an endpoint and a key
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.api_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ConfigManager {
    /// Load all configurations from the process environment
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = EnvironmentConfig::from_lookup(&lookup)?;
        let database = Self::load_database(&lookup)?;
        let ai = Self::load_ai(&lookup)?;
        let server = Self::load_server(&lookup)?;

        app_log!(
            info,
            "Configuration loaded: env={}, store={:?}, ai={}",
            environment.name,
            database.backend,
            if ai.is_configured() { "provider" } else { "heuristic" }
        );

        Ok(Self {
            environment,
            database,
            ai,
            server,
        })
    }

    fn load_database<F>(lookup: &F) -> Result<DatabaseSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Neo4j,
        };

        Ok(DatabaseSettings {
            backend,
            uri: lookup("NEO4J_URI").unwrap_or_else(|| "bolt://localhost:7687".to_string()),
            user: lookup("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string()),
            password: lookup("NEO4J_PASSWORD").unwrap_or_else(|| "neo4j".to_string()),
            connect_attempts: parse_or(lookup, "NEO4J_CONNECT_ATTEMPTS", 5)?,
            retry_delay_secs: parse_or(lookup, "NEO4J_RETRY_DELAY_SECS", 2)?,
        })
    }

    fn load_ai<F>(lookup: &F) -> Result<AiSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(AiSettings {
            base_url: non_empty("AI_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            api_key: non_empty("AI_API_KEY"),
            model: non_empty("AI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            timeout_seconds: parse_or(lookup, "AI_TIMEOUT_SECONDS", 30)?,
        })
    }

    fn load_server<F>(lookup: &F) -> Result<ServerSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(ServerSettings {
            port: parse_or(lookup, "ROCKET_PORT", 8000)?,
            cors_origins,
        })
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        self.environment.ensure_directories().await
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} must be a number, got '{}'", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ConfigManager> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry("CV_BUILDER_CONFIG".to_string())
            .or_insert_with(|| "/nonexistent/config.yaml".to_string());
        ConfigManager::from_lookup(move |key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.database.backend, StoreBackend::Neo4j);
        assert_eq!(config.database.uri, "bolt://localhost:7687");
        assert_eq!(config.database.connect_attempts, 5);
        assert_eq!(config.database.retry_delay_secs, 2);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.timeout_seconds, 30);
        assert!(!config.ai.is_configured());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = config_from(&[
            ("STORE_BACKEND", "memory"),
            ("NEO4J_CONNECT_ATTEMPTS", "9"),
            ("ROCKET_PORT", "9100"),
            ("CORS_ORIGINS", "https://a.example/, https://b.example"),
            ("AI_BASE_URL", "https://llm.example/v1/"),
            ("AI_API_KEY", "secret"),
        ])
        .unwrap();

        assert_eq!(config.database.backend, StoreBackend::Memory);
        assert_eq!(config.database.connect_attempts, 9);
        assert_eq!(config.server.port, 9100);
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.ai.base_url.as_deref(), Some("https://llm.example/v1"));
        assert!(config.ai.is_configured());
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(config_from(&[("ROCKET_PORT", "eighty")]).is_err());
        assert!(config_from(&[("STORE_BACKEND", "sqlite")]).is_err());
    }

    #[test]
    fn blank_ai_key_means_unconfigured() {
        let config = config_from(&[("AI_BASE_URL", "https://llm.example"), ("AI_API_KEY", " ")]).unwrap();
        assert!(!config.ai.is_configured());
    }
}
