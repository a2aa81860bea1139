// src/documents/odt.rs
//! OpenDocument Text package writer

use anyhow::Result;
use chrono::Utc;

use super::outline::{DocumentOutline, Entry};
use super::{group_blocks, write_package, BlockGroup, PackageEntry};
use crate::richtext::{Block, BlockKind, Run};
use crate::types::Theme;
use crate::utils::escape_markup;

pub const MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

const MANIFEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">
<manifest:file-entry manifest:full-path="/" manifest:version="1.3" manifest:media-type="application/vnd.oasis.opendocument.text"/>
<manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
<manifest:file-entry manifest:full-path="styles.xml" manifest:media-type="text/xml"/>
<manifest:file-entry manifest:full-path="meta.xml" manifest:media-type="text/xml"/>
</manifest:manifest>"#;

const NAMESPACES: &str = concat!(
    r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
    r#"xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" "#,
    r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" "#,
    r#"xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" "#,
    r#"xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0" "#,
    r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
    r#"office:version="1.3""#
);

/// Text styles for every bold/italic/underline combination, named `T` + flags
const AUTOMATIC_STYLES: &str = concat!(
    r#"<style:style style:name="Tb" style:family="text"><style:text-properties fo:font-weight="bold"/></style:style>"#,
    r#"<style:style style:name="Ti" style:family="text"><style:text-properties fo:font-style="italic"/></style:style>"#,
    r#"<style:style style:name="Tu" style:family="text"><style:text-properties style:text-underline-style="solid" style:text-underline-width="auto" style:text-underline-color="font-color"/></style:style>"#,
    r#"<style:style style:name="Tbi" style:family="text"><style:text-properties fo:font-weight="bold" fo:font-style="italic"/></style:style>"#,
    r#"<style:style style:name="Tbu" style:family="text"><style:text-properties fo:font-weight="bold" style:text-underline-style="solid" style:text-underline-width="auto" style:text-underline-color="font-color"/></style:style>"#,
    r#"<style:style style:name="Tiu" style:family="text"><style:text-properties fo:font-style="italic" style:text-underline-style="solid" style:text-underline-width="auto" style:text-underline-color="font-color"/></style:style>"#,
    r#"<style:style style:name="Tbiu" style:family="text"><style:text-properties fo:font-weight="bold" fo:font-style="italic" style:text-underline-style="solid" style:text-underline-width="auto" style:text-underline-color="font-color"/></style:style>"#,
    r#"<text:list-style style:name="LBullet"><text:list-level-style-bullet text:level="1" text:bullet-char="•"><style:list-level-properties text:list-level-position-and-space-mode="label-alignment"><style:list-level-label-alignment text:label-followed-by="listtab" fo:text-indent="-0.25in" fo:margin-left="0.5in"/></style:list-level-properties></text:list-level-style-bullet></text:list-style>"#,
    r#"<text:list-style style:name="LNumber"><text:list-level-style-number text:level="1" style:num-format="1" style:num-suffix="."><style:list-level-properties text:list-level-position-and-space-mode="label-alignment"><style:list-level-label-alignment text:label-followed-by="listtab" fo:text-indent="-0.25in" fo:margin-left="0.5in"/></style:list-level-properties></text:list-level-style-number></text:list-style>"#
);

pub fn render(outline: &DocumentOutline) -> Result<Vec<u8>> {
    write_package(vec![
        PackageEntry::stored("mimetype", MIMETYPE.to_string()),
        PackageEntry::deflated("META-INF/manifest.xml", MANIFEST.to_string()),
        PackageEntry::deflated("content.xml", content_xml(outline)),
        PackageEntry::deflated("styles.xml", styles_xml(outline.theme)),
        PackageEntry::deflated("meta.xml", meta_xml(&outline.name)),
    ])
}

fn text_style(run: &Run) -> Option<String> {
    let mut flags = String::new();
    if run.bold {
        flags.push('b');
    }
    if run.italic {
        flags.push('i');
    }
    if run.underline {
        flags.push('u');
    }
    (!flags.is_empty()).then(|| format!("T{}", flags))
}

fn runs_xml(runs: &[Run]) -> String {
    runs.iter()
        .map(|run| {
            let text = escape_markup(&run.text);
            match text_style(run) {
                Some(style) => format!("<text:span text:style-name=\"{}\">{}</text:span>", style, text),
                None => text,
            }
        })
        .collect()
}

fn paragraph(style: &str, content: &str) -> String {
    format!("<text:p text:style-name=\"{}\">{}</text:p>", style, content)
}

fn heading(level: u8, text: &str) -> String {
    format!(
        "<text:h text:style-name=\"Heading_20_{level}\" text:outline-level=\"{level}\">{}</text:h>",
        escape_markup(text)
    )
}

fn blocks_xml(blocks: &[Block], out: &mut String) {
    for group in group_blocks(blocks) {
        match group {
            BlockGroup::Paragraph(block) => out.push_str(&paragraph("Text_20_body", &runs_xml(&block.runs))),
            BlockGroup::List(kind, items) => {
                let style = if kind == BlockKind::Numbered {
                    "LNumber"
                } else {
                    "LBullet"
                };
                out.push_str(&format!("<text:list text:style-name=\"{}\">", style));
                for item in items {
                    out.push_str("<text:list-item>");
                    out.push_str(&paragraph("List_20_Paragraph", &runs_xml(&item.runs)));
                    out.push_str("</text:list-item>");
                }
                out.push_str("</text:list>");
            }
        }
    }
}

fn entry_xml(entry: &Entry, level: u8, out: &mut String) {
    out.push_str(&heading(level, &entry.heading));

    let meta: Vec<&str> = [entry.subheading.as_deref(), entry.dates.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !meta.is_empty() {
        out.push_str(&paragraph("Meta", &escape_markup(&meta.join(" | "))));
    }
    blocks_xml(&entry.body, out);
    for detail in &entry.details {
        out.push_str(&paragraph("Text_20_body", &escape_markup(detail)));
    }
    for child in &entry.children {
        entry_xml(child, (level + 1).min(3), out);
    }
}

fn content_xml(outline: &DocumentOutline) -> String {
    let mut body = String::new();

    body.push_str(&paragraph("Title", &escape_markup(&outline.name)));
    if let Some(headline) = &outline.headline {
        body.push_str(&paragraph("Subtitle", &escape_markup(headline)));
    }
    if !outline.contact.is_empty() {
        body.push_str(&paragraph("Meta", &escape_markup(&outline.contact.join(" | "))));
    }
    if !outline.summary.is_empty() {
        body.push_str(&heading(1, "Summary"));
        blocks_xml(&outline.summary, &mut body);
    }
    for section in &outline.sections {
        body.push_str(&heading(1, section.title));
        for entry in &section.entries {
            entry_xml(entry, 2, &mut body);
        }
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<office:document-content {}><office:automatic-styles>{}</office:automatic-styles><office:body><office:text>{}</office:text></office:body></office:document-content>",
        NAMESPACES, AUTOMATIC_STYLES, body
    )
}

fn paragraph_style(name: &str, display: &str, text_props: &str, paragraph_props: &str) -> String {
    format!(
        "<style:style style:name=\"{name}\" style:display-name=\"{display}\" style:family=\"paragraph\" style:parent-style-name=\"Standard\"><style:paragraph-properties {paragraph_props}/><style:text-properties {text_props}/></style:style>"
    )
}

fn styles_xml(theme: Theme) -> String {
    let font = theme.font_family();
    let primary = theme.primary_color();
    let secondary = theme.secondary_color();

    let styles = [
        paragraph_style(
            "Title",
            "Title",
            &format!("fo:font-size=\"24pt\" fo:font-weight=\"bold\" fo:color=\"#{primary}\""),
            "fo:margin-bottom=\"0.04in\"",
        ),
        paragraph_style(
            "Subtitle",
            "Subtitle",
            &format!("fo:font-size=\"14pt\" fo:color=\"#{secondary}\""),
            "fo:margin-bottom=\"0.08in\"",
        ),
        paragraph_style(
            "Heading_20_1",
            "Heading 1",
            &format!("fo:font-size=\"14pt\" fo:font-weight=\"bold\" fo:color=\"#{primary}\""),
            &format!(
                "fo:margin-top=\"0.17in\" fo:margin-bottom=\"0.06in\" fo:keep-with-next=\"always\" fo:border-bottom=\"0.5pt solid #{primary}\""
            ),
        ),
        paragraph_style(
            "Heading_20_2",
            "Heading 2",
            "fo:font-size=\"12pt\" fo:font-weight=\"bold\"",
            "fo:margin-top=\"0.11in\" fo:margin-bottom=\"0.03in\" fo:keep-with-next=\"always\"",
        ),
        paragraph_style(
            "Heading_20_3",
            "Heading 3",
            "fo:font-size=\"11pt\" fo:font-weight=\"bold\"",
            "fo:margin-top=\"0.08in\" fo:margin-bottom=\"0.03in\" fo:keep-with-next=\"always\"",
        ),
        paragraph_style(
            "Meta",
            "Meta",
            &format!("fo:font-style=\"italic\" fo:color=\"#{secondary}\""),
            "fo:margin-bottom=\"0.04in\"",
        ),
        paragraph_style("Text_20_body", "Text body", "", "fo:margin-bottom=\"0.06in\""),
        paragraph_style("List_20_Paragraph", "List Paragraph", "", "fo:margin-bottom=\"0.03in\""),
    ];

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<office:document-styles {ns}><office:font-face-decls><style:font-face style:name=\"{font}\" svg:font-family=\"{font}\" xmlns:svg=\"urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0\"/></office:font-face-decls><office:styles><style:style style:name=\"Standard\" style:family=\"paragraph\"><style:text-properties style:font-name=\"{font}\" fo:font-size=\"11pt\"/></style:style>{styles}</office:styles></office:document-styles>",
        ns = NAMESPACES,
        font = font,
        styles = styles.concat()
    )
}

fn meta_xml(name: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<office:document-meta {}><office:meta><meta:generator>cv-builder</meta:generator><dc:title>{}</dc:title><meta:creation-date>{}</meta:creation-date></office:meta></office:document-meta>",
        NAMESPACES,
        escape_markup(&format!("{} - CV", name)),
        Utc::now().format("%Y-%m-%dT%H:%M:%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::test_support::{entry_names, first_entry, read_entry};
    use crate::types::{CvData, Education, PersonalInfo};

    fn sample() -> DocumentOutline {
        DocumentOutline::from_cv(&CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                title: Some("Engineer <Rust>".to_string()),
                summary: Some("<p><em>Calm</em> and <u>steady</u></p><ul><li>One</li><li>Two</li></ul>".to_string()),
                ..PersonalInfo::default()
            },
            education: vec![Education {
                institution: "EPFL".to_string(),
                degree: Some("MSc".to_string()),
                ..Education::default()
            }],
            theme: Theme::Classic,
            ..CvData::default()
        })
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let bytes = render(&sample()).unwrap();
        let (name, compression) = first_entry(&bytes);
        assert_eq!(name, "mimetype");
        assert_eq!(compression, zip::CompressionMethod::Stored);
        assert_eq!(read_entry(&bytes, "mimetype"), MIMETYPE);

        let names = entry_names(&bytes);
        for part in ["META-INF/manifest.xml", "content.xml", "styles.xml", "meta.xml"] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }
    }

    #[test]
    fn content_carries_styles_and_lists() {
        let bytes = render(&sample()).unwrap();
        let content = read_entry(&bytes, "content.xml");

        assert!(content.contains("Engineer &lt;Rust&gt;"));
        assert!(content.contains("<text:span text:style-name=\"Ti\">Calm</text:span>"));
        assert!(content.contains("<text:span text:style-name=\"Tu\">steady</text:span>"));
        assert_eq!(content.matches("<text:list text:style-name=\"LBullet\">").count(), 1);
        assert_eq!(content.matches("<text:list-item>").count(), 2);
        assert!(content.contains("EPFL"));
    }

    #[test]
    fn styles_follow_theme() {
        let bytes = render(&sample()).unwrap();
        let styles = read_entry(&bytes, "styles.xml");
        assert!(styles.contains("Georgia"));
        assert!(styles.contains("#1F3864"));
    }
}
