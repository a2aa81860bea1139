// src/utils.rs
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Escape text for embedding in HTML or XML documents
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Name of the rendered file for a record: `cv_{first 8 chars of id}.{ext}`
pub fn output_filename(id: &str, extension: &str) -> String {
    let short: String = id.chars().take(8).collect();
    format!("cv_{}.{}", short, extension)
}

/// Build output file path
pub fn output_file_path(base: &Path, id: &str, extension: &str) -> PathBuf {
    base.join(output_filename(id, extension))
}

/// Get file extension in lowercase
pub fn get_file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Validate file extension against allowed types
pub fn validate_file_extension(filename: &str, allowed: &[&str]) -> Result<()> {
    let ext = get_file_extension(filename)
        .ok_or_else(|| anyhow::anyhow!("File has no extension: {}", filename))?;

    if !allowed.contains(&ext.as_str()) {
        anyhow::bail!(
            "Unsupported file extension: {}. Allowed: {:?}",
            ext,
            allowed
        );
    }

    Ok(())
}

/// Check a requested download name before it is joined onto the output directory.
/// Only bare file names with the expected extension pass.
pub fn validate_download_filename(filename: &str, extension: &str) -> Result<()> {
    if filename.trim().is_empty() {
        anyhow::bail!("Empty filename");
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        anyhow::bail!("Filename must not contain path components: {}", filename);
    }

    if filename.contains('\0') {
        anyhow::bail!("Filename contains a NUL byte");
    }

    validate_file_extension(filename, &[extension])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
        );
        assert_eq!(escape_markup("plain"), "plain");
    }

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename("3f2a9c1e-0000-4000-8000-000000000000", "odt"),
            "cv_3f2a9c1e.odt"
        );
        assert_eq!(output_filename("abc", "docx"), "cv_abc.docx");
    }

    #[test]
    fn test_get_file_extension() {
        assert_eq!(get_file_extension("test.odt"), Some("odt".to_string()));
        assert_eq!(
            get_file_extension("document.DOCX"),
            Some("docx".to_string())
        );
        assert_eq!(get_file_extension("noext"), None);
    }

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension("test.odt", &["odt", "docx"]).is_ok());
        assert!(validate_file_extension("test.txt", &["odt", "docx"]).is_err());
        assert!(validate_file_extension("noext", &["odt"]).is_err());
    }

    #[test]
    fn test_validate_download_filename() {
        assert!(validate_download_filename("cv_3f2a9c1e.odt", "odt").is_ok());
        assert!(validate_download_filename("cv_3f2a9c1e.docx", "odt").is_err());
        assert!(validate_download_filename("../../etc/passwd", "odt").is_err());
        assert!(validate_download_filename("../cv.odt", "odt").is_err());
        assert!(validate_download_filename("sub/cv.odt", "odt").is_err());
        assert!(validate_download_filename("..\\cv.odt", "odt").is_err());
        assert!(validate_download_filename("", "odt").is_err());
    }

    proptest! {
        #[test]
        fn names_with_path_components_are_rejected(
            prefix in "[a-zA-Z0-9_]{0,8}",
            separator in prop::sample::select(vec!["/", "\\", ".."]),
            suffix in "[a-zA-Z0-9_]{0,8}",
            ext in prop::sample::select(vec!["odt", "docx"]),
        ) {
            let name = format!("{}{}{}.{}", prefix, separator, suffix, ext);
            prop_assert!(validate_download_filename(&name, ext).is_err());
        }

        #[test]
        fn generated_names_are_accepted(id in "[a-f0-9]{8}[a-f0-9-]{0,28}") {
            let name = output_filename(&id, "docx");
            prop_assert!(validate_download_filename(&name, "docx").is_ok());
        }
    }
}
