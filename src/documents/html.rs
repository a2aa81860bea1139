// src/documents/html.rs
//! Print-ready HTML rendering

use std::collections::HashMap;

use super::outline::{DocumentOutline, Entry};
use super::{group_blocks, BlockGroup};
use crate::core::TemplateEngine;
use crate::richtext::{Block, BlockKind, Run};
use crate::utils::escape_markup;

/// Layout used when a theme has no `print.html` override.
/// Variables: title, font_family, primary_color, secondary_color, body.
pub const DEFAULT_PRINT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{title}}</title>
<style>
  @page { size: A4; margin: 18mm; }
  body { font-family: {{font_family}}, sans-serif; font-size: 11pt; color: #222; line-height: 1.4; }
  h1 { color: #{{primary_color}}; font-size: 24pt; margin: 0; }
  h2 { color: #{{primary_color}}; font-size: 14pt; border-bottom: 1px solid #{{primary_color}}; margin: 18px 0 6px; }
  h3 { font-size: 12pt; margin: 10px 0 2px; }
  h4 { font-size: 11pt; margin: 8px 0 2px; }
  .headline { color: #{{secondary_color}}; font-size: 14pt; margin: 2px 0 6px; }
  .meta { color: #{{secondary_color}}; font-style: italic; margin: 0 0 4px; }
  .entry { break-inside: avoid; }
  ul, ol { margin: 4px 0 4px 20px; padding: 0; }
</style>
</head>
<body>
{{body}}
</body>
</html>
"#;

fn run_html(run: &Run) -> String {
    let mut html = escape_markup(&run.text);
    if run.underline {
        html = format!("<u>{}</u>", html);
    }
    if run.italic {
        html = format!("<em>{}</em>", html);
    }
    if run.bold {
        html = format!("<strong>{}</strong>", html);
    }
    html
}

fn inline(block: &Block) -> String {
    block.runs.iter().map(run_html).collect()
}

fn blocks_html(blocks: &[Block], out: &mut String) {
    for group in group_blocks(blocks) {
        match group {
            BlockGroup::Paragraph(block) => out.push_str(&format!("<p>{}</p>", inline(block))),
            BlockGroup::List(kind, items) => {
                let tag = if kind == BlockKind::Numbered { "ol" } else { "ul" };
                out.push_str(&format!("<{}>", tag));
                for item in items {
                    out.push_str(&format!("<li>{}</li>", inline(item)));
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

fn entry_html(entry: &Entry, level: u8, out: &mut String) {
    out.push_str("<div class=\"entry\">");
    out.push_str(&format!("<h{0}>{1}</h{0}>", level, escape_markup(&entry.heading)));

    let meta: Vec<&str> = [entry.subheading.as_deref(), entry.dates.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !meta.is_empty() {
        out.push_str(&format!("<p class=\"meta\">{}</p>", escape_markup(&meta.join(" | "))));
    }
    blocks_html(&entry.body, out);
    for detail in &entry.details {
        out.push_str(&format!("<p>{}</p>", escape_markup(detail)));
    }
    for child in &entry.children {
        entry_html(child, (level + 1).min(4), out);
    }
    out.push_str("</div>");
}

/// Markup placed in the template's `{{body}}` slot
pub fn body_html(outline: &DocumentOutline) -> String {
    let mut out = String::from("<header>");
    out.push_str(&format!("<h1>{}</h1>", escape_markup(&outline.name)));
    if let Some(headline) = &outline.headline {
        out.push_str(&format!("<p class=\"headline\">{}</p>", escape_markup(headline)));
    }
    if !outline.contact.is_empty() {
        out.push_str(&format!(
            "<p class=\"meta\">{}</p>",
            escape_markup(&outline.contact.join(" | "))
        ));
    }
    out.push_str("</header>");

    if !outline.summary.is_empty() {
        out.push_str("<section><h2>Summary</h2>");
        blocks_html(&outline.summary, &mut out);
        out.push_str("</section>");
    }
    for section in &outline.sections {
        out.push_str(&format!("<section><h2>{}</h2>", section.title));
        for entry in &section.entries {
            entry_html(entry, 3, &mut out);
        }
        out.push_str("</section>");
    }

    out
}

/// Fill `template` (or the built-in layout) with the outline
pub fn render(outline: &DocumentOutline, template: Option<&str>) -> String {
    let theme = outline.theme;
    let variables: HashMap<String, String> = [
        ("title", escape_markup(&format!("{} - CV", outline.name))),
        ("name", escape_markup(&outline.name)),
        ("theme", theme.as_str().to_string()),
        ("font_family", theme.font_family().to_string()),
        ("primary_color", theme.primary_color().to_string()),
        ("secondary_color", theme.secondary_color().to_string()),
        ("body", body_html(outline)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();

    TemplateEngine::process_variables(template.unwrap_or(DEFAULT_PRINT_TEMPLATE), &variables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CvData, PersonalInfo, Skill, Theme};

    fn sample() -> DocumentOutline {
        DocumentOutline::from_cv(&CvData {
            personal_info: PersonalInfo {
                name: "Jane <Doe>".to_string(),
                summary: Some("<p>Ships <strong><em>fast</em></strong></p><ol><li>a</li></ol>".to_string()),
                ..PersonalInfo::default()
            },
            skills: vec![Skill {
                name: "Rust".to_string(),
                ..Skill::default()
            }],
            theme: Theme::Minimal,
            ..CvData::default()
        })
    }

    #[test]
    fn default_layout_is_filled() {
        let html = render(&sample(), None);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Jane &lt;Doe&gt;</h1>"));
        assert!(html.contains("<strong><em>fast</em></strong>"));
        assert!(html.contains("<ol><li>a</li></ol>"));
        assert!(html.contains("font-family: Arial"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn override_template_receives_variables() {
        let html = render(&sample(), Some("<main data-theme=\"{{theme}}\">{{name}}</main>"));
        assert_eq!(html, "<main data-theme=\"minimal\">Jane &lt;Doe&gt;</main>");
    }
}
