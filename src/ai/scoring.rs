// src/ai/scoring.rs
//! Relevance of profile items to a job description

use serde::Serialize;
use std::collections::HashSet;

use crate::richtext::plain_text;
use crate::types::{Education, Experience, Skill};

pub const KEYWORD_WEIGHT: f64 = 0.6;
pub const RECENCY_WEIGHT: f64 = 0.25;
pub const TECHNOLOGY_WEIGHT: f64 = 0.15;

/// Years after which an ended item stops earning recency
const RECENCY_HORIZON_YEARS: f64 = 10.0;
const UNKNOWN_RECENCY: f64 = 0.5;

const STOP_WORDS: &[&str] = &[
    "a", "about", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by",
    "can", "do", "for", "from", "has", "have", "in", "into", "is", "it", "its", "more", "must",
    "of", "on", "or", "our", "should", "such", "that", "the", "their", "them", "they", "this",
    "to", "we", "were", "what", "which", "who", "will", "with", "within", "would", "you", "your",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Experience,
    Education,
    Skill,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemScore {
    pub kind: ItemKind,
    /// Position of the item in the profile
    pub index: usize,
    pub label: String,
    pub score: f64,
    pub selected: bool,
}

/// Lowercase terms made of alphanumerics and `+#.`, at least two characters long,
/// with stop words removed. Sentence-final dots are not part of a term.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|term| term.trim_end_matches('.'))
        .filter(|term| term.chars().count() >= 2)
        .filter(|term| !STOP_WORDS.contains(term))
        .map(str::to_string)
        .collect()
}

pub fn term_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

/// First four-digit run in a free-form date such as `2021-03` or `March 2021`
pub fn year_of(date: &str) -> Option<i32> {
    let digits: Vec<char> = date.chars().collect();
    digits
        .windows(4)
        .enumerate()
        .find(|(start, window)| {
            window.iter().all(|c| c.is_ascii_digit())
                && digits.get(start + 4).map_or(true, |c| !c.is_ascii_digit())
                && (*start == 0 || !digits[start - 1].is_ascii_digit())
        })
        .and_then(|(_, window)| window.iter().collect::<String>().parse().ok())
}

pub fn recency(end_date: Option<&str>, current: bool, this_year: i32) -> f64 {
    if current {
        return 1.0;
    }
    match end_date.and_then(year_of) {
        Some(year) => {
            let age = f64::from(this_year - year);
            (1.0 - age / RECENCY_HORIZON_YEARS).clamp(0.0, 1.0)
        }
        None => UNKNOWN_RECENCY,
    }
}

/// Share of distinct job terms that also appear in `item_terms`
pub fn keyword_overlap(job_terms: &HashSet<String>, item_terms: &HashSet<String>) -> f64 {
    if job_terms.is_empty() {
        return 0.0;
    }
    let hits = job_terms.iter().filter(|term| item_terms.contains(*term)).count();
    hits as f64 / job_terms.len() as f64
}

/// A technology matches when every term of its name is a job term
fn mentions(job_terms: &HashSet<String>, name: &str) -> bool {
    let terms = tokenize(name);
    !terms.is_empty() && terms.iter().all(|term| job_terms.contains(term))
}

fn technology_overlap(job_terms: &HashSet<String>, technologies: &[&str]) -> f64 {
    if technologies.is_empty() {
        return 0.0;
    }
    let hits = technologies
        .iter()
        .filter(|tech| mentions(job_terms, tech))
        .count();
    hits as f64 / technologies.len() as f64
}

fn combine(keyword: f64, recency: f64, technology: f64) -> f64 {
    KEYWORD_WEIGHT * keyword + RECENCY_WEIGHT * recency + TECHNOLOGY_WEIGHT * technology
}

fn rich(html: Option<&String>) -> String {
    html.map(|h| plain_text(h)).unwrap_or_default()
}

pub fn score_experience(exp: &Experience, job_terms: &HashSet<String>, this_year: i32) -> f64 {
    let mut text = vec![
        exp.title.clone(),
        exp.company.clone(),
        exp.location.clone().unwrap_or_default(),
        rich(exp.description.as_ref()),
    ];
    let mut technologies: Vec<&str> = Vec::new();
    for project in &exp.projects {
        text.push(project.name.clone());
        text.push(rich(project.description.as_ref()));
        text.extend(project.technologies.iter().cloned());
        for tech in &project.technologies {
            if !technologies.iter().any(|seen| seen.eq_ignore_ascii_case(tech)) {
                technologies.push(tech);
            }
        }
    }

    combine(
        keyword_overlap(job_terms, &term_set(&text.join(" "))),
        recency(exp.end_date.as_deref(), exp.current, this_year),
        technology_overlap(job_terms, &technologies),
    )
}

pub fn score_education(edu: &Education, job_terms: &HashSet<String>, this_year: i32) -> f64 {
    let text = [
        edu.institution.clone(),
        edu.degree.clone().unwrap_or_default(),
        edu.field.clone().unwrap_or_default(),
        rich(edu.description.as_ref()),
    ]
    .join(" ");

    combine(
        keyword_overlap(job_terms, &term_set(&text)),
        recency(edu.end_date.as_deref(), false, this_year),
        0.0,
    )
}

pub fn score_skill(skill: &Skill, job_terms: &HashSet<String>) -> f64 {
    let hit = if mentions(job_terms, &skill.name) { 1.0 } else { 0.0 };
    combine(hit, 1.0, hit)
}

/// Indices of the `limit` best scores, returned in profile order.
/// Equal scores keep the earlier item.
pub fn top_indices(scores: &[f64], limit: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    ranked.truncate(limit);
    ranked.sort_unstable();
    ranked
}
