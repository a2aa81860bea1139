// src/core/template_engine.rs
//! Print-template discovery and `{{var}}` substitution

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::core::FsOps;

const MANIFEST_FILE: &str = "manifest.toml";
const DEFAULT_PRINT_FILE: &str = "print.html";

// ===== Template Models =====

#[derive(Debug, Clone)]
pub struct TemplateInfo {
    pub id: String,
    pub path: PathBuf,
    pub manifest: TemplateManifest,
}

impl TemplateInfo {
    pub fn print_file(&self) -> PathBuf {
        self.path.join(
            self.manifest
                .print_file
                .as_deref()
                .unwrap_or(DEFAULT_PRINT_FILE),
        )
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub print_file: Option<String>,
}

// ===== Main Template Engine =====

/// Print templates found under `templates_dir/<theme>/`. A theme without a
/// directory renders with the built-in layout.
pub struct TemplateEngine {
    templates_dir: PathBuf,
    templates: Vec<TemplateInfo>,
}

impl TemplateEngine {
    /// Create new template engine with automatic discovery
    pub fn new(templates_dir: PathBuf) -> Result<Self> {
        let mut engine = Self {
            templates_dir,
            templates: Vec::new(),
        };
        engine.discover_templates()?;
        Ok(engine)
    }

    fn discover_templates(&mut self) -> Result<()> {
        self.templates.clear();

        if !self.templates_dir.exists() {
            app_log!(
                debug,
                "Templates directory does not exist: {}",
                self.templates_dir.display()
            );
            return Ok(());
        }

        let entries = std::fs::read_dir(&self.templates_dir).with_context(|| {
            format!(
                "Failed to read templates directory: {}",
                self.templates_dir.display()
            )
        })?;

        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(template_name) = path.file_name().and_then(|n| n.to_str()) {
                match Self::load_template_info(template_name, &path) {
                    Ok(template) => {
                        app_log!(
                            trace,
                            "Loaded template: {} from {}",
                            template.id,
                            template.path.display()
                        );
                        self.templates.push(template);
                    }
                    Err(e) => {
                        app_log!(warn, "Failed to load template {}: {}", template_name, e)
                    }
                }
            }
        }

        self.templates.sort_by(|a, b| a.id.cmp(&b.id));
        app_log!(info, "Discovered {} templates", self.templates.len());
        Ok(())
    }

    fn load_template_info(template_id: &str, template_path: &Path) -> Result<TemplateInfo> {
        let manifest_path = template_path.join(MANIFEST_FILE);

        let manifest = if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)
                .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse manifest: {}", manifest_path.display()))?
        } else {
            TemplateManifest {
                name: template_id.to_string(),
                ..TemplateManifest::default()
            }
        };

        Ok(TemplateInfo {
            id: template_id.to_string(),
            path: template_path.to_path_buf(),
            manifest,
        })
    }

    pub fn list_templates(&self) -> Vec<String> {
        self.templates.iter().map(|t| t.id.clone()).collect()
    }

    pub fn get_template(&self, template_id: &str) -> Option<&TemplateInfo> {
        self.templates.iter().find(|t| t.id == template_id)
    }

    pub fn template_exists(&self, template_id: &str) -> bool {
        self.get_template(template_id).is_some()
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Content of a theme's print template, `None` when the theme has no override
    pub async fn print_template(&self, template_id: &str) -> Result<Option<String>> {
        match self.get_template(template_id) {
            Some(template) => FsOps::read_optional(&template.print_file()).await,
            None => Ok(None),
        }
    }

    // ===== Variable Processing =====

    /// Process template variables in content (supports both {{var}} and ${var} syntax)
    pub fn process_variables(content: &str, variables: &HashMap<String, String>) -> String {
        let mut result = content.to_string();
        for (key, value) in variables {
            let placeholder_mustache = format!("{{{{{}}}}}", key);
            let placeholder_shell = format!("${{{}}}", key);
            result = result.replace(&placeholder_mustache, value);
            result = result.replace(&placeholder_shell, value);
        }
        result
    }
}
