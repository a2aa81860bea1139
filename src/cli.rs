// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::app_log;
use crate::core::{ConfigManager, FsOps};
use crate::documents::{DocumentFormat, DocumentGenerator};
use crate::graph::{self, RootKind};
use crate::types::{CvData, CvPayload};

#[derive(Parser)]
#[command(name = "cv-cli")]
#[command(about = "Validate, render and manage stored CVs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Check a JSON payload without saving it
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
    /// Render a JSON payload into the output directory
    Render {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "odt")]
        format: String,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List stored CVs (or profiles), newest first
    List {
        #[arg(long)]
        profiles: bool,
    },
    /// Print a stored record as JSON
    Export {
        #[arg(long)]
        id: String,
        #[arg(long)]
        profile: bool,
    },
    /// Delete a stored record and everything it owns
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long)]
        profile: bool,
    },
}

fn root_kind(profile: bool) -> RootKind {
    if profile {
        RootKind::Profile
    } else {
        RootKind::Cv
    }
}

/// Read and validate a payload file, reporting every field error
pub async fn load_payload(path: &Path) -> Result<CvData> {
    let content = FsOps::read_file_safe(path).await?;
    let payload: CvPayload = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    payload.into_cv_data().map_err(|errors| {
        let details: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::anyhow!("Validation failed:\n  {}", details.join("\n  "))
    })
}

pub async fn handle_command(cli: Cli, config: &ConfigManager) -> Result<()> {
    match cli.command {
        CliCommand::Validate { input } => {
            let data = load_payload(&input).await?;
            app_log!(
                info,
                "{} is valid: {} experience(s), {} education entr(ies), {} skill(s)",
                input.display(),
                data.experience.len(),
                data.education.len(),
                data.skills.len()
            );
        }

        CliCommand::Render {
            input,
            format,
            output_dir,
        } => {
            let format = DocumentFormat::parse(&format)
                .ok_or_else(|| anyhow::anyhow!("Unsupported format: {} (use odt, docx or html)", format))?;
            let data = load_payload(&input).await?;

            let generator = DocumentGenerator::new(
                output_dir.unwrap_or_else(|| config.environment.output_path.clone()),
                config.environment.templates_path.clone(),
            )?;
            let file = generator
                .generate(&Uuid::new_v4().to_string(), &data, format)
                .await?;
            println!("{}", file.path.display());
        }

        CliCommand::List { profiles } => {
            let store = graph::open_store(&config.database).await?;
            let summaries = store.list(root_kind(profiles)).await?;
            if summaries.is_empty() {
                app_log!(info, "No records found");
            }
            for summary in summaries {
                println!(
                    "{}  {}  {}{}",
                    summary.id,
                    summary.updated_at,
                    summary.name,
                    summary
                        .title
                        .map(|t| format!(" ({})", t))
                        .unwrap_or_default()
                );
            }
        }

        CliCommand::Export { id, profile } => {
            let store = graph::open_store(&config.database).await?;
            let record = store.get(root_kind(profile), &id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }

        CliCommand::Delete { id, profile } => {
            let store = graph::open_store(&config.database).await?;
            let root = root_kind(profile);
            if store.delete(root, &id).await? {
                app_log!(info, "Deleted {} {}", root.label(), id);
            } else {
                anyhow::bail!("{} {} not found", root.label(), id);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_payload_accepts_flat_form_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.json");
        std::fs::write(
            &path,
            r#"{"name": "Jane Doe", "email": "jane@example.com", "work_experience": [{"title": "Engineer", "company": "Acme"}]}"#,
        )
        .unwrap();

        let data = load_payload(&path).await.unwrap();
        assert_eq!(data.personal_info.name, "Jane Doe");
        assert_eq!(data.experience.len(), 1);
    }

    #[tokio::test]
    async fn load_payload_reports_field_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv.json");
        std::fs::write(&path, r#"{"name": "", "email": "not-an-email"}"#).unwrap();

        let message = load_payload(&path).await.unwrap_err().to_string();
        assert!(message.contains("personal_info.name"));
        assert!(message.contains("personal_info.email"));
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["cv-cli", "export", "--id", "abc", "--profile"]).unwrap();
        assert!(matches!(cli.command, CliCommand::Export { ref id, profile: true } if id == "abc"));
    }
}
