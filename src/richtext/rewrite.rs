// src/richtext/rewrite.rs
//! Heuristic rewrite actions offered next to each rich-text field

use serde::{Deserialize, Serialize};

use super::{blocks, char_count, collapse_whitespace};
use crate::utils::escape_markup;

pub const DEFAULT_SHORTEN_CHARS: usize = 300;

const FILLER_WORDS: &[&str] = &[
    "really",
    "very",
    "basically",
    "actually",
    "just",
    "quite",
    "successfully",
    "various",
    "literally",
];

const FILLER_PHRASES: &[(&str, &str)] = &[
    ("in order to", "to"),
    ("was responsible for", "led"),
    ("responsible for", "owned"),
    ("helped to", "helped"),
    ("a number of", "several"),
    ("was involved in", "worked on"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewriteAction {
    Tighten,
    Bulletize,
    Shorten,
    Polish,
}

impl RewriteAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "tighten" => Some(Self::Tighten),
            "bulletize" | "bullets" => Some(Self::Bulletize),
            "shorten" => Some(Self::Shorten),
            "polish" => Some(Self::Polish),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tighten => "tighten",
            Self::Bulletize => "bulletize",
            Self::Shorten => "shorten",
            Self::Polish => "polish",
        }
    }
}

/// Rewrite editor HTML without a language model. `Polish` falls back to `Tighten`.
pub fn rewrite(html: &str, action: RewriteAction, max_chars: Option<usize>) -> String {
    match action {
        RewriteAction::Tighten | RewriteAction::Polish => tighten(html),
        RewriteAction::Bulletize => bulletize(html),
        RewriteAction::Shorten => shorten(html, max_chars.unwrap_or(DEFAULT_SHORTEN_CHARS)),
    }
}

fn block_texts(html: &str) -> Vec<String> {
    blocks(html)
        .iter()
        .map(|block| block.text())
        .filter(|text| !text.trim().is_empty())
        .collect()
}

fn tighten(html: &str) -> String {
    let paragraphs: Vec<String> = block_texts(html)
        .iter()
        .map(|text| finish_sentence(&tighten_sentence(text)))
        .filter(|text| !text.is_empty())
        .map(|text| format!("<p>{}</p>", escape_markup(&text)))
        .collect();
    paragraphs.concat()
}

fn tighten_sentence(text: &str) -> String {
    let mut result = text.to_string();
    for (phrase, replacement) in FILLER_PHRASES {
        result = replace_ignore_case(&result, phrase, replacement);
    }

    let kept: Vec<&str> = result
        .split_whitespace()
        .filter(|word| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            !FILLER_WORDS.contains(&bare.as_str())
        })
        .collect();

    capitalize(&kept.join(" "))
}

fn replace_ignore_case(text: &str, phrase: &str, replacement: &str) -> String {
    let lower = text.to_lowercase();
    // Lowercasing can change byte lengths for some scripts; only rewrite when it does not
    if lower.len() != text.len() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(phrase) {
        let start = cursor + found;
        let end = start + phrase.len();
        let at_word_start = start == 0 || !lower[..start].ends_with(char::is_alphanumeric);
        let at_word_end = end == lower.len() || !lower[end..].starts_with(char::is_alphanumeric);
        out.push_str(&text[cursor..start]);
        if at_word_start && at_word_end {
            out.push_str(replacement);
        } else {
            out.push_str(&text[start..end]);
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn finish_sentence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.ends_with(['.', '!', '?', ':']) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

/// Sentences across all blocks, without their terminal punctuation
fn sentences(html: &str) -> Vec<String> {
    let mut out = Vec::new();
    for text in block_texts(html) {
        let mut current = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            current.push(c);
            let boundary = matches!(c, '.' | '!' | '?' | ';')
                && chars.peek().map_or(true, |next| next.is_whitespace());
            if boundary {
                push_sentence(&mut out, &current);
                current.clear();
            }
        }
        push_sentence(&mut out, &current);
    }
    out
}

fn push_sentence(out: &mut Vec<String>, raw: &str) {
    let cleaned = collapse_whitespace(raw.trim_end_matches(['.', '!', '?', ';']));
    if !cleaned.is_empty() {
        out.push(cleaned);
    }
}

fn bulletize(html: &str) -> String {
    let items = sentences(html);
    if items.is_empty() {
        return String::new();
    }
    let list: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape_markup(&capitalize(item))))
        .collect();
    format!("<ul>{}</ul>", list)
}

fn plain_paragraphs(html: &str) -> String {
    block_texts(html)
        .iter()
        .map(|text| format!("<p>{}</p>", escape_markup(&collapse_whitespace(text))))
        .collect()
}

fn shorten(html: &str, max_chars: usize) -> String {
    if char_count(html) <= max_chars {
        // Tightening may add a full stop, which can push a field at its limit over it
        let tightened = tighten(html);
        if char_count(&tightened) <= max_chars {
            return tightened;
        }
        return plain_paragraphs(html);
    }

    let text = collapse_whitespace(&block_texts(html).join(" "));
    let budget = max_chars.saturating_sub(1);
    let mut cut = String::new();
    for word in text.split_whitespace() {
        let extra = if cut.is_empty() { 0 } else { 1 };
        if cut.chars().count() + extra + word.chars().count() > budget {
            break;
        }
        if !cut.is_empty() {
            cut.push(' ');
        }
        cut.push_str(word);
    }

    if cut.is_empty() {
        cut = text.chars().take(budget).collect();
    }
    let cut = cut.trim_end_matches([',', ';', ':', '-']).to_string();
    format!("<p>{}…</p>", escape_markup(&cut))
}
