// src/environment.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::app_log;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Filesystem locations for the current environment
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub name: String,
    pub output_path: PathBuf,
    pub templates_path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct PathSection {
    output_path: Option<PathBuf>,
    templates_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: PathSection,
    #[serde(default)]
    production: PathSection,
}

impl EnvironmentConfig {
    /// Resolve paths from `OUTPUT_DIR`/`TEMPLATES_DIR`, then the optional YAML
    /// file section for `ENVIRONMENT`, then `<base>/out` and `<base>/templates`.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup("ENVIRONMENT").unwrap_or_else(|| "local".to_string());
        app_log!(info, "Loading environment configuration for: {}", name);

        let base_dir = if name == "production" {
            PathBuf::from("/app")
        } else {
            std::env::current_dir().context("Failed to get current directory")?
        };

        let config_path = lookup("CV_BUILDER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let section = Self::load_section(&config_path, &name)?;

        let output_path = lookup("OUTPUT_DIR")
            .map(PathBuf::from)
            .or(section.output_path)
            .unwrap_or_else(|| PathBuf::from("out"));
        let templates_path = lookup("TEMPLATES_DIR")
            .map(PathBuf::from)
            .or(section.templates_path)
            .unwrap_or_else(|| PathBuf::from("templates"));

        Ok(Self {
            name,
            output_path: Self::resolve_path(&base_dir, &output_path),
            templates_path: Self::resolve_path(&base_dir, &templates_path),
        })
    }

    fn load_section(config_path: &Path, environment: &str) -> Result<PathSection> {
        if !config_path.exists() {
            return Ok(PathSection::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(match environment {
            "production" => file.production,
            _ => file.local,
        })
    }

    fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Ensure all configured directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.output_path, &self.templates_path] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        app_log!(info, "All configured directories ensured to exist");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_resolve_under_base_dir() {
        let lookup = lookup_from(&[("CV_BUILDER_CONFIG", "/nonexistent/config.yaml")]);
        let env = EnvironmentConfig::from_lookup(&lookup).unwrap();

        assert_eq!(env.name, "local");
        assert!(env.output_path.ends_with("out"));
        assert!(env.output_path.is_absolute());
        assert!(env.templates_path.ends_with("templates"));
    }

    #[test]
    fn yaml_section_is_picked_by_environment() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(
            &config,
            "local:\n  output_path: /tmp/cv-local\nproduction:\n  output_path: /srv/cv\n  templates_path: /srv/templates\n",
        )
        .unwrap();
        let config = config.to_string_lossy().to_string();

        let local = EnvironmentConfig::from_lookup(&lookup_from(&[("CV_BUILDER_CONFIG", &config)])).unwrap();
        assert_eq!(local.output_path, PathBuf::from("/tmp/cv-local"));

        let production = EnvironmentConfig::from_lookup(&lookup_from(&[
            ("CV_BUILDER_CONFIG", &config),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert_eq!(production.output_path, PathBuf::from("/srv/cv"));
        assert_eq!(production.templates_path, PathBuf::from("/srv/templates"));
    }

    #[test]
    fn env_vars_override_the_file() {
        let lookup = lookup_from(&[
            ("CV_BUILDER_CONFIG", "/nonexistent/config.yaml"),
            ("OUTPUT_DIR", "/var/cv-out"),
        ]);
        let env = EnvironmentConfig::from_lookup(&lookup).unwrap();
        assert_eq!(env.output_path, PathBuf::from("/var/cv-out"));
    }
}
