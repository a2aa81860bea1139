// src/documents/generator.rs
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{docx, html, odt, DocumentOutline};
use crate::app_log;
use crate::core::{FsOps, TemplateEngine};
use crate::types::CvData;
use crate::utils::{output_file_path, output_filename};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Odt,
    Docx,
    Html,
}

impl DocumentFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "odt" => Some(Self::Odt),
            "docx" => Some(Self::Docx),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Odt => "odt",
            Self::Docx => "docx",
            Self::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Odt => odt::MIMETYPE,
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Html => "text/html; charset=utf-8",
        }
    }

    /// Route that serves files of this format, if any
    pub fn download_route(&self) -> Option<&'static str> {
        match self {
            Self::Odt => Some("/api/download"),
            Self::Docx => Some("/api/download-docx"),
            Self::Html => None,
        }
    }
}

/// A document written into the output directory
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedFile {
    pub id: String,
    pub filename: String,
    pub format: DocumentFormat,
    pub download_url: Option<String>,
    #[serde(skip)]
    pub path: PathBuf,
}

pub struct DocumentGenerator {
    output_dir: PathBuf,
    templates: TemplateEngine,
}

impl DocumentGenerator {
    pub fn new(output_dir: PathBuf, templates_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            output_dir,
            templates: TemplateEngine::new(templates_dir)?,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Print-HTML, using the theme's override template when one exists
    pub async fn render_html(&self, data: &CvData) -> Result<String> {
        let outline = DocumentOutline::from_cv(data);
        let template = self.templates.print_template(data.theme.as_str()).await?;
        Ok(html::render(&outline, template.as_deref()))
    }

    pub async fn render(&self, data: &CvData, format: DocumentFormat) -> Result<Vec<u8>> {
        match format {
            DocumentFormat::Odt => odt::render(&DocumentOutline::from_cv(data)),
            DocumentFormat::Docx => docx::render(&DocumentOutline::from_cv(data)),
            DocumentFormat::Html => Ok(self.render_html(data).await?.into_bytes()),
        }
    }

    /// Render and write `cv_{id8}.{ext}` into the output directory
    pub async fn generate(
        &self,
        id: &str,
        data: &CvData,
        format: DocumentFormat,
    ) -> Result<GeneratedFile> {
        let bytes = self.render(data, format).await?;
        let path = output_file_path(&self.output_dir, id, format.extension());
        let filename = output_filename(id, format.extension());

        FsOps::ensure_dir_exists(&self.output_dir).await?;
        FsOps::write_bytes(&path, &bytes).await?;

        app_log!(
            info,
            "Generated {} document {} ({} bytes)",
            format.extension(),
            filename,
            bytes.len()
        );

        Ok(GeneratedFile {
            id: id.to_string(),
            download_url: format
                .download_route()
                .map(|route| format!("{}/{}", route, filename)),
            filename,
            format,
            path,
        })
    }

    /// Bytes of a previously generated file. The name must already be validated.
    pub async fn read_output(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        FsOps::read_bytes(&self.output_dir.join(filename)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::test_support::first_entry;
    use crate::types::PersonalInfo;

    fn jane() -> CvData {
        CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                ..PersonalInfo::default()
            },
            ..CvData::default()
        }
    }

    #[test]
    fn formats_parse_and_describe_themselves() {
        assert_eq!(DocumentFormat::parse("DOCX"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::parse("pdf"), None);
        assert_eq!(DocumentFormat::Odt.content_type(), "application/vnd.oasis.opendocument.text");
        assert_eq!(DocumentFormat::Html.download_route(), None);
    }

    #[tokio::test]
    async fn generate_writes_named_file() {
        let out = tempfile::tempdir().unwrap();
        let generator =
            DocumentGenerator::new(out.path().join("out"), out.path().join("templates")).unwrap();

        let file = generator
            .generate("0123456789abcdef", &jane(), DocumentFormat::Odt)
            .await
            .unwrap();

        assert_eq!(file.filename, "cv_01234567.odt");
        assert_eq!(file.download_url.as_deref(), Some("/api/download/cv_01234567.odt"));
        let bytes = generator.read_output("cv_01234567.odt").await.unwrap().unwrap();
        assert_eq!(first_entry(&bytes).0, "mimetype");
        assert!(generator.read_output("cv_missing.odt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn html_uses_theme_override() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(templates.join("classic")).unwrap();
        std::fs::write(templates.join("classic").join("print.html"), "<b>{{name}}</b>").unwrap();

        let generator = DocumentGenerator::new(dir.path().join("out"), templates).unwrap();
        assert_eq!(generator.render_html(&jane()).await.unwrap(), "<b>Jane Doe</b>");
    }
}
