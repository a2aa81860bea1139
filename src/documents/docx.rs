// src/documents/docx.rs
//! WordprocessingML package writer

use anyhow::Result;
use chrono::Utc;

use super::outline::{DocumentOutline, Entry};
use super::{write_package, PackageEntry};
use crate::richtext::{Block, BlockKind, Run};
use crate::types::Theme;
use crate::utils::escape_markup;

const BULLET_NUM_ID: u8 = 1;
const DECIMAL_NUM_ID: u8 = 2;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

const NUMBERING: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
<w:abstractNum w:abstractNumId="0"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/><w:lvlText w:val="•"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>
<w:abstractNum w:abstractNumId="1"><w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="decimal"/><w:lvlText w:val="%1."/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="720" w:hanging="360"/></w:pPr></w:lvl></w:abstractNum>
<w:num w:numId="1"><w:abstractNumId w:val="0"/></w:num>
<w:num w:numId="2"><w:abstractNumId w:val="1"/></w:num>
</w:numbering>"#;

pub fn render(outline: &DocumentOutline) -> Result<Vec<u8>> {
    write_package(vec![
        PackageEntry::deflated("[Content_Types].xml", CONTENT_TYPES.to_string()),
        PackageEntry::deflated("_rels/.rels", PACKAGE_RELS.to_string()),
        PackageEntry::deflated("word/document.xml", document_xml(outline)),
        PackageEntry::deflated("word/styles.xml", styles_xml(outline.theme)),
        PackageEntry::deflated("word/numbering.xml", NUMBERING.to_string()),
        PackageEntry::deflated("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        PackageEntry::deflated("docProps/core.xml", core_xml(&outline.name)),
    ])
}

fn run_xml(run: &Run) -> String {
    let mut props = String::new();
    if run.bold {
        props.push_str("<w:b/>");
    }
    if run.italic {
        props.push_str("<w:i/>");
    }
    if run.underline {
        props.push_str("<w:u w:val=\"single\"/>");
    }
    let props = if props.is_empty() {
        props
    } else {
        format!("<w:rPr>{}</w:rPr>", props)
    };
    format!(
        "<w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r>",
        props,
        escape_markup(&run.text)
    )
}

fn styled_paragraph(style: &str, text: &str) -> String {
    format!(
        "<w:p><w:pPr><w:pStyle w:val=\"{}\"/></w:pPr>{}</w:p>",
        style,
        run_xml(&Run {
            text: text.to_string(),
            ..Run::default()
        })
    )
}

fn block_xml(block: &Block) -> String {
    let props = match block.kind {
        BlockKind::Paragraph => "<w:pStyle w:val=\"BodyText\"/>".to_string(),
        BlockKind::Bullet | BlockKind::Numbered => {
            let num_id = if block.kind == BlockKind::Bullet {
                BULLET_NUM_ID
            } else {
                DECIMAL_NUM_ID
            };
            format!(
                "<w:pStyle w:val=\"ListParagraph\"/><w:numPr><w:ilvl w:val=\"0\"/><w:numId w:val=\"{}\"/></w:numPr>",
                num_id
            )
        }
    };
    let runs: String = block.runs.iter().map(run_xml).collect();
    format!("<w:p><w:pPr>{}</w:pPr>{}</w:p>", props, runs)
}

fn entry_xml(entry: &Entry, level: u8, body: &mut String) {
    body.push_str(&styled_paragraph(&format!("Heading{}", level), &entry.heading));

    let meta: Vec<&str> = [entry.subheading.as_deref(), entry.dates.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !meta.is_empty() {
        body.push_str(&styled_paragraph("Meta", &meta.join(" | ")));
    }
    for block in &entry.body {
        body.push_str(&block_xml(block));
    }
    for detail in &entry.details {
        body.push_str(&styled_paragraph("BodyText", detail));
    }
    for child in &entry.children {
        entry_xml(child, (level + 1).min(3), body);
    }
}

fn document_xml(outline: &DocumentOutline) -> String {
    let mut body = String::new();

    body.push_str(&styled_paragraph("Title", &outline.name));
    if let Some(headline) = &outline.headline {
        body.push_str(&styled_paragraph("Subtitle", headline));
    }
    if !outline.contact.is_empty() {
        body.push_str(&styled_paragraph("Meta", &outline.contact.join(" | ")));
    }
    if !outline.summary.is_empty() {
        body.push_str(&styled_paragraph("Heading1", "Summary"));
        for block in &outline.summary {
            body.push_str(&block_xml(block));
        }
    }
    for section in &outline.sections {
        body.push_str(&styled_paragraph("Heading1", section.title));
        for entry in &section.entries {
            entry_xml(entry, 2, &mut body);
        }
    }

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body>{}",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
            "</w:body></w:document>"
        ),
        body
    )
}

fn paragraph_style(id: &str, run_props: &str, paragraph_props: &str) -> String {
    format!(
        "<w:style w:type=\"paragraph\" w:styleId=\"{id}\"><w:name w:val=\"{id}\"/><w:basedOn w:val=\"Normal\"/><w:pPr>{paragraph_props}</w:pPr><w:rPr>{run_props}</w:rPr></w:style>"
    )
}

fn styles_xml(theme: Theme) -> String {
    let font = theme.font_family();
    let primary = theme.primary_color();
    let secondary = theme.secondary_color();

    let styles = [
        paragraph_style(
            "Title",
            &format!("<w:b/><w:color w:val=\"{primary}\"/><w:sz w:val=\"48\"/>"),
            "<w:spacing w:after=\"60\"/>",
        ),
        paragraph_style(
            "Subtitle",
            &format!("<w:color w:val=\"{secondary}\"/><w:sz w:val=\"28\"/>"),
            "<w:spacing w:after=\"120\"/>",
        ),
        paragraph_style(
            "Heading1",
            &format!("<w:b/><w:color w:val=\"{primary}\"/><w:sz w:val=\"28\"/>"),
            &format!(
                "<w:keepNext/><w:spacing w:before=\"240\" w:after=\"80\"/><w:pBdr><w:bottom w:val=\"single\" w:sz=\"6\" w:space=\"1\" w:color=\"{primary}\"/></w:pBdr>"
            ),
        ),
        paragraph_style(
            "Heading2",
            "<w:b/><w:sz w:val=\"24\"/>",
            "<w:keepNext/><w:spacing w:before=\"160\" w:after=\"40\"/>",
        ),
        paragraph_style(
            "Heading3",
            "<w:b/><w:sz w:val=\"22\"/>",
            "<w:keepNext/><w:spacing w:before=\"120\" w:after=\"40\"/>",
        ),
        paragraph_style(
            "Meta",
            &format!("<w:i/><w:color w:val=\"{secondary}\"/>"),
            "<w:spacing w:after=\"60\"/>",
        ),
        paragraph_style("BodyText", "", "<w:spacing w:after=\"80\"/>"),
        paragraph_style("ListParagraph", "", "<w:ind w:left=\"720\"/><w:spacing w:after=\"40\"/>"),
    ];

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/><w:sz w:val=\"22\"/></w:rPr></w:rPrDefault></w:docDefaults>",
            "<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>",
            "{styles}",
            "</w:styles>"
        ),
        font = font,
        styles = styles.concat()
    )
}

fn core_xml(name: &str) -> String {
    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title><dc:creator>cv-builder</dc:creator>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{now}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{now}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        title = escape_markup(&format!("{} - CV", name)),
        now = now
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::test_support::{entry_names, read_entry};
    use crate::types::{CvData, Experience, PersonalInfo};

    fn sample() -> DocumentOutline {
        DocumentOutline::from_cv(&CvData {
            personal_info: PersonalInfo {
                name: "Jane & Co".to_string(),
                summary: Some("<p>Builds <strong>reliable</strong> systems</p>".to_string()),
                ..PersonalInfo::default()
            },
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                description: Some("<ul><li>Shipped</li></ul><ol><li>First</li></ol>".to_string()),
                ..Experience::default()
            }],
            theme: Theme::Modern,
            ..CvData::default()
        })
    }

    #[test]
    fn package_has_required_parts() {
        let bytes = render(&sample()).unwrap();
        let names = entry_names(&bytes);
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
            "docProps/core.xml",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }
    }

    #[test]
    fn document_keeps_formatting_and_lists() {
        let bytes = render(&sample()).unwrap();
        let document = read_entry(&bytes, "word/document.xml");

        assert!(document.contains("Jane &amp; Co"));
        assert!(document.contains("<w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">reliable</w:t>"));
        assert!(document.contains("<w:numId w:val=\"1\"/>"));
        assert!(document.contains("<w:numId w:val=\"2\"/>"));
        assert!(document.contains("Acme"));
    }

    #[test]
    fn styles_follow_theme() {
        let bytes = render(&sample()).unwrap();
        let styles = read_entry(&bytes, "word/styles.xml");
        assert!(styles.contains("Helvetica"));
        assert!(styles.contains("14A4E6"));
    }
}
