// src/richtext/mod.rs
//! Rich-text (editor HTML) helpers: plain text, normalization, sanitizing and block extraction

pub mod rewrite;
pub mod sync;

pub use rewrite::{rewrite, RewriteAction};
pub use sync::{RichTextSync, SkipReason, SyncDecision};

use scraper::{ElementRef, Html, Node};

use crate::utils::escape_markup;

const BLOCK_TAGS: &[&str] = &["p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "br"];
const ALLOWED_TAGS: &[&str] = &["p", "br", "ul", "ol", "li", "strong", "b", "em", "i", "u"];
const DROPPED_TAGS: &[&str] = &["script", "style", "head", "title"];

/// Text content of an HTML fragment with whitespace collapsed.
/// Block boundaries count as whitespace so `<p>a</p><p>b</p>` reads `a b`.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::new();
    collect_text(fragment.root_element(), &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if DROPPED_TAGS.contains(&name) {
                continue;
            }
            let is_block = BLOCK_TAGS.contains(&name);
            if is_block {
                out.push(' ');
            }
            collect_text(child_element, out);
            if is_block {
                out.push(' ');
            }
        } else if let Node::Text(text) = child.value() {
            let text: &str = text;
            out.push_str(text);
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Markup with whitespace runs collapsed and inter-tag whitespace removed
pub fn normalize_markup(html: &str) -> String {
    collapse_whitespace(html).replace("> <", "><").trim().to_string()
}

/// Number of characters the user sees, the figure the editor limits against
pub fn char_count(html: &str) -> usize {
    plain_text(html).chars().count()
}

/// Re-emit only the formatting tags the editor produces; everything else is
/// unwrapped (or dropped, for script/style) and all text is escaped.
pub fn sanitize(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    sanitize_into(fragment.root_element(), &mut out);
    out
}

fn sanitize_into(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if DROPPED_TAGS.contains(&name) {
                continue;
            }
            if !ALLOWED_TAGS.contains(&name) {
                sanitize_into(child_element, out);
                continue;
            }
            if name == "br" {
                out.push_str("<br>");
                continue;
            }
            out.push('<');
            out.push_str(name);
            out.push('>');
            sanitize_into(child_element, out);
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        } else if let Node::Text(text) = child.value() {
            let text: &str = text;
            out.push_str(&escape_markup(text));
        }
    }
}

// ===== Block extraction for document renderers =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Bullet,
    Numbered,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub runs: Vec<Run>,
}

impl Block {
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
}

struct BlockBuilder {
    blocks: Vec<Block>,
    current: Block,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            current: Block {
                kind: BlockKind::Paragraph,
                runs: Vec::new(),
            },
        }
    }

    fn start(&mut self, kind: BlockKind) {
        self.flush();
        self.current.kind = kind;
    }

    fn flush(&mut self) {
        let mut block = std::mem::replace(
            &mut self.current,
            Block {
                kind: BlockKind::Paragraph,
                runs: Vec::new(),
            },
        );
        trim_runs(&mut block.runs);
        if !block.runs.is_empty() {
            self.blocks.push(block);
        }
    }

    fn push_text(&mut self, text: &str, style: RunStyle) {
        let mut collapsed = collapse_whitespace(text);
        if collapsed.is_empty() {
            if text.is_empty() {
                return;
            }
            collapsed = " ".to_string();
        } else {
            if text.starts_with(char::is_whitespace) {
                collapsed.insert(0, ' ');
            }
            if text.ends_with(char::is_whitespace) {
                collapsed.push(' ');
            }
        }

        if let Some(last) = self.current.runs.last_mut() {
            if last.bold == style.bold
                && last.italic == style.italic
                && last.underline == style.underline
            {
                if !(last.text.ends_with(' ') && collapsed.starts_with(' ')) {
                    last.text.push_str(&collapsed);
                } else {
                    last.text.push_str(collapsed.trim_start());
                }
                return;
            }
        }

        self.current.runs.push(Run {
            text: collapsed,
            bold: style.bold,
            italic: style.italic,
            underline: style.underline,
        });
    }
}

fn trim_runs(runs: &mut Vec<Run>) {
    if let Some(first) = runs.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = runs.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    runs.retain(|run| !run.text.is_empty());
}

/// Split editor HTML into paragraphs and list items made of styled runs.
/// Plain text without markup yields a single paragraph.
pub fn blocks(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let mut builder = BlockBuilder::new();
    walk_blocks(
        fragment.root_element(),
        RunStyle::default(),
        BlockKind::Paragraph,
        &mut builder,
    );
    builder.flush();
    builder.blocks
}

fn walk_blocks(
    element: ElementRef<'_>,
    style: RunStyle,
    list_kind: BlockKind,
    builder: &mut BlockBuilder,
) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            let mut child_style = style;
            match name {
                name if DROPPED_TAGS.contains(&name) => continue,
                "strong" | "b" => child_style.bold = true,
                "em" | "i" => child_style.italic = true,
                "u" => child_style.underline = true,
                "ul" => {
                    builder.flush();
                    walk_blocks(child_element, style, BlockKind::Bullet, builder);
                    builder.flush();
                    continue;
                }
                "ol" => {
                    builder.flush();
                    walk_blocks(child_element, style, BlockKind::Numbered, builder);
                    builder.flush();
                    continue;
                }
                "li" => {
                    let kind = if list_kind == BlockKind::Paragraph {
                        BlockKind::Bullet
                    } else {
                        list_kind
                    };
                    builder.start(kind);
                    walk_blocks(child_element, style, list_kind, builder);
                    builder.flush();
                    continue;
                }
                "br" => {
                    let kind = builder.current.kind;
                    builder.start(kind);
                    continue;
                }
                "p" | "div" | "h1" | "h2" | "h3" | "h4" => {
                    builder.start(BlockKind::Paragraph);
                    walk_blocks(child_element, style, list_kind, builder);
                    builder.flush();
                    continue;
                }
                _ => {}
            }
            walk_blocks(child_element, child_style, list_kind, builder);
        } else if let Node::Text(text) = child.value() {
            let text: &str = text;
            builder.push_text(text, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_separates_blocks_and_decodes_entities() {
        assert_eq!(plain_text("<p>Hello</p><p>World &amp; co</p>"), "Hello World & co");
        assert_eq!(plain_text("<p>Hello <strong>bold</strong>  text</p>"), "Hello bold text");
        assert_eq!(plain_text("just text"), "just text");
    }

    #[test]
    fn plain_text_ignores_scripts() {
        assert_eq!(plain_text("<p>ok</p><script>alert(1)</script>"), "ok");
    }

    #[test]
    fn normalize_markup_collapses_whitespace() {
        assert_eq!(
            normalize_markup("  <p>Hello\n   world</p>\n <p>x</p> "),
            "<p>Hello world</p><p>x</p>"
        );
    }

    #[test]
    fn char_count_uses_visible_text() {
        assert_eq!(char_count("<p><strong>abc</strong></p>"), 3);
        assert_eq!(char_count("<p>é</p>"), 1);
        assert_eq!(char_count(""), 0);
    }

    #[test]
    fn sanitize_strips_attributes_and_unknown_tags() {
        let dirty = r#"<p class="x" onclick="evil()">Hi <span>there</span> <a href="javascript:x">link</a></p><script>bad()</script>"#;
        assert_eq!(sanitize(dirty), "<p>Hi there link</p>");
    }

    #[test]
    fn sanitize_escapes_text() {
        assert_eq!(sanitize("<p>1 &lt; 2</p>"), "<p>1 &lt; 2</p>");
    }

    #[test]
    fn blocks_split_paragraphs_and_lists() {
        let html = "<p>Intro <strong>bold</strong></p><ul><li>One</li><li><em>Two</em></li></ul>";
        let blocks = blocks(html);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].text(), "Intro bold");
        assert!(blocks[0].runs[1].bold);
        assert_eq!(blocks[1].kind, BlockKind::Bullet);
        assert_eq!(blocks[1].text(), "One");
        assert_eq!(blocks[2].kind, BlockKind::Bullet);
        assert!(blocks[2].runs[0].italic);
    }

    #[test]
    fn blocks_of_plain_text_is_one_paragraph() {
        let blocks = blocks("Built the   billing service");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text(), "Built the billing service");
    }

    #[test]
    fn numbered_lists_keep_their_kind() {
        let blocks = blocks("<ol><li>first</li><li>second</li></ol>");
        assert!(blocks.iter().all(|b| b.kind == BlockKind::Numbered));
    }
}
