// src/ai/draft.rs
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::scoring::{self, ItemKind, ItemScore};
use crate::app_log;
use crate::core::ServiceClient;
use crate::richtext::{self, RewriteAction};
use crate::types::{CvData, Theme};
use crate::validation::SUMMARY_MAX_CHARS;

pub const DEFAULT_MAX_EXPERIENCES: usize = 4;
pub const DEFAULT_MAX_SKILLS: usize = 10;
pub const DEFAULT_MAX_EDUCATION: usize = 3;

const SUMMARY_SYSTEM_PROMPT: &str = "You write the summary paragraph of a CV. \
Answer with two to four sentences of HTML using only <p>, <strong> and <em>. \
Do not invent facts that are not in the candidate data.";

const POLISH_SYSTEM_PROMPT: &str = "You edit CV text for clarity and concision. \
Keep the meaning and every fact. Answer with HTML using only <p>, <ul>, <ol>, <li>, \
<strong>, <em> and <u>.";

#[derive(Debug, Clone, Deserialize)]
pub struct DraftRequest {
    pub job_description: String,
    #[serde(default)]
    pub max_experiences: Option<usize>,
    #[serde(default)]
    pub max_skills: Option<usize>,
    #[serde(default)]
    pub max_education: Option<usize>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Ai,
    Profile,
    Heuristic,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftResult {
    pub cv: CvData,
    pub scores: Vec<ItemScore>,
    pub summary_source: ContentSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteRequest {
    pub html: String,
    pub action: String,
    #[serde(default)]
    pub max_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewriteResult {
    pub html: String,
    pub char_count: usize,
    pub source: ContentSource,
}

/// Drafts tailored CVs from a profile. The provider client is optional;
/// without it every operation uses the heuristics only.
pub struct DraftService {
    client: Option<ServiceClient>,
}

impl DraftService {
    pub fn new(client: Option<ServiceClient>) -> Self {
        Self { client }
    }

    pub fn ai_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub async fn generate_draft(&self, profile: &CvData, request: &DraftRequest) -> DraftResult {
        self.generate_draft_for_year(profile, request, Utc::now().year())
            .await
    }

    async fn generate_draft_for_year(
        &self,
        profile: &CvData,
        request: &DraftRequest,
        this_year: i32,
    ) -> DraftResult {
        let job_terms = scoring::term_set(&request.job_description);
        app_log!(
            info,
            "Drafting CV against {} job terms (ai: {})",
            job_terms.len(),
            self.ai_enabled()
        );

        let experience_scores: Vec<f64> = profile
            .experience
            .iter()
            .map(|exp| scoring::score_experience(exp, &job_terms, this_year))
            .collect();
        let education_scores: Vec<f64> = profile
            .education
            .iter()
            .map(|edu| scoring::score_education(edu, &job_terms, this_year))
            .collect();
        let skill_scores: Vec<f64> = profile
            .skills
            .iter()
            .map(|skill| scoring::score_skill(skill, &job_terms))
            .collect();

        let kept_experience = scoring::top_indices(
            &experience_scores,
            request.max_experiences.unwrap_or(DEFAULT_MAX_EXPERIENCES),
        );
        let kept_education = scoring::top_indices(
            &education_scores,
            request.max_education.unwrap_or(DEFAULT_MAX_EDUCATION),
        );
        let kept_skills = scoring::top_indices(
            &skill_scores,
            request.max_skills.unwrap_or(DEFAULT_MAX_SKILLS),
        );

        let mut scores = Vec::new();
        push_scores(
            &mut scores,
            ItemKind::Experience,
            &experience_scores,
            &kept_experience,
            |i| format!("{} at {}", profile.experience[i].title, profile.experience[i].company),
        );
        push_scores(
            &mut scores,
            ItemKind::Education,
            &education_scores,
            &kept_education,
            |i| profile.education[i].institution.clone(),
        );
        push_scores(
            &mut scores,
            ItemKind::Skill,
            &skill_scores,
            &kept_skills,
            |i| profile.skills[i].name.clone(),
        );

        let mut cv = CvData {
            personal_info: profile.personal_info.clone(),
            experience: kept_experience
                .iter()
                .map(|&i| profile.experience[i].clone())
                .collect(),
            education: kept_education
                .iter()
                .map(|&i| profile.education[i].clone())
                .collect(),
            skills: kept_skills.iter().map(|&i| profile.skills[i].clone()).collect(),
            theme: request.theme.unwrap_or(profile.theme),
        };

        let summary_source = match self.tailored_summary(&cv, &request.job_description).await {
            Some(summary) => {
                cv.personal_info.summary = Some(summary);
                ContentSource::Ai
            }
            None => ContentSource::Profile,
        };

        DraftResult {
            cv,
            scores,
            summary_source,
        }
    }

    async fn tailored_summary(&self, cv: &CvData, job_description: &str) -> Option<String> {
        let client = self.client.as_ref()?;

        let mut prompt = format!("Job description:\n{}\n\nCandidate:\n", job_description.trim());
        prompt.push_str(&format!("Name: {}\n", cv.personal_info.name));
        if let Some(title) = &cv.personal_info.title {
            prompt.push_str(&format!("Title: {}\n", title));
        }
        if let Some(summary) = &cv.personal_info.summary {
            prompt.push_str(&format!("Current summary: {}\n", richtext::plain_text(summary)));
        }
        for exp in &cv.experience {
            prompt.push_str(&format!("Experience: {} at {}\n", exp.title, exp.company));
        }
        let skills: Vec<&str> = cv.skills.iter().map(|s| s.name.as_str()).collect();
        if !skills.is_empty() {
            prompt.push_str(&format!("Skills: {}\n", skills.join(", ")));
        }

        match client.complete(SUMMARY_SYSTEM_PROMPT, &prompt).await {
            Ok(answer) => {
                let html = as_paragraphs(&richtext::sanitize(&answer));
                if richtext::char_count(&html) == 0 {
                    app_log!(warn, "AI provider returned an empty summary, keeping profile summary");
                    return None;
                }
                if richtext::char_count(&html) > SUMMARY_MAX_CHARS {
                    return Some(richtext::rewrite(
                        &html,
                        RewriteAction::Shorten,
                        Some(SUMMARY_MAX_CHARS),
                    ));
                }
                Some(html)
            }
            Err(e) => {
                app_log!(warn, "AI summary failed, keeping profile summary: {}", e);
                None
            }
        }
    }

    /// Apply a rewrite action. `polish` goes through the provider when one is
    /// configured and falls back to `tighten` when it fails.
    pub async fn rewrite(&self, html: &str, action: RewriteAction, max_chars: Option<usize>) -> RewriteResult {
        if action == RewriteAction::Polish {
            if let Some(client) = &self.client {
                match client.complete(POLISH_SYSTEM_PROMPT, html).await {
                    Ok(answer) => {
                        let polished = as_paragraphs(&richtext::sanitize(&answer));
                        if richtext::char_count(&polished) > 0 {
                            return RewriteResult {
                                char_count: richtext::char_count(&polished),
                                html: polished,
                                source: ContentSource::Ai,
                            };
                        }
                    }
                    Err(e) => app_log!(warn, "AI polish failed, tightening instead: {}", e),
                }
            }
        }

        let effective = if action == RewriteAction::Polish {
            RewriteAction::Tighten
        } else {
            action
        };
        let html = richtext::rewrite(html, effective, max_chars);
        RewriteResult {
            char_count: richtext::char_count(&html),
            html,
            source: ContentSource::Heuristic,
        }
    }
}

fn push_scores(
    out: &mut Vec<ItemScore>,
    kind: ItemKind,
    scores: &[f64],
    kept: &[usize],
    label: impl Fn(usize) -> String,
) {
    out.extend(scores.iter().enumerate().map(|(index, score)| ItemScore {
        kind,
        index,
        label: label(index),
        score: (score * 1000.0).round() / 1000.0,
        selected: kept.contains(&index),
    }));
}

/// Bare provider text becomes a single paragraph
fn as_paragraphs(html: &str) -> String {
    let trimmed = html.trim();
    if trimmed.is_empty() || trimmed.starts_with('<') {
        trimmed.to_string()
    } else {
        format!("<p>{}</p>", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Education, Experience, PersonalInfo, Skill};

    fn profile() -> CvData {
        let exp = |title: &str, end: &str, desc: &str| Experience {
            title: title.to_string(),
            company: "Acme".to_string(),
            end_date: Some(end.to_string()),
            description: Some(format!("<p>{}</p>", desc)),
            ..Experience::default()
        };
        let skill = |name: &str| Skill {
            name: name.to_string(),
            ..Skill::default()
        };

        CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                summary: Some("<p>Original summary</p>".to_string()),
                ..PersonalInfo::default()
            },
            experience: vec![
                exp("Barista", "2010", "Coffee"),
                exp("Rust engineer", "2024", "Built Rust services on Kubernetes"),
                exp("Web developer", "2020", "Frontend work"),
            ],
            education: vec![Education {
                institution: "EPFL".to_string(),
                ..Education::default()
            }],
            skills: vec![skill("Excel"), skill("Rust"), skill("Kubernetes")],
            theme: Theme::Classic,
        }
    }

    fn request(max_experiences: usize, max_skills: usize) -> DraftRequest {
        DraftRequest {
            job_description: "Senior Rust engineer to run services on Kubernetes".to_string(),
            max_experiences: Some(max_experiences),
            max_skills: Some(max_skills),
            max_education: None,
            theme: Some(Theme::Modern),
        }
    }

    #[tokio::test]
    async fn draft_keeps_best_items_in_profile_order() {
        let service = DraftService::new(None);
        let draft = service
            .generate_draft_for_year(&profile(), &request(2, 2), 2026)
            .await;

        let titles: Vec<&str> = draft.cv.experience.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust engineer", "Web developer"]);
        let skills: Vec<&str> = draft.cv.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skills, vec!["Rust", "Kubernetes"]);
        assert_eq!(draft.cv.education.len(), 1);
        assert_eq!(draft.cv.theme, Theme::Modern);

        assert_eq!(draft.summary_source, ContentSource::Profile);
        assert_eq!(draft.cv.personal_info.summary.as_deref(), Some("<p>Original summary</p>"));
        assert_eq!(draft.scores.len(), 3 + 1 + 3);
        assert!(draft.scores.iter().any(|s| s.kind == ItemKind::Skill && s.label == "Excel" && !s.selected));
    }

    #[tokio::test]
    async fn polish_without_provider_tightens() {
        let service = DraftService::new(None);
        let result = service
            .rewrite("<p>I was responsible for the API</p>", RewriteAction::Polish, None)
            .await;
        assert_eq!(result.source, ContentSource::Heuristic);
        assert_eq!(
            result.html,
            richtext::rewrite("<p>I was responsible for the API</p>", RewriteAction::Tighten, None)
        );
        assert_eq!(result.char_count, richtext::char_count(&result.html));
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back() {
        let client = ServiceClient::new(
            "http://127.0.0.1:9".to_string(),
            "k".to_string(),
            "m".to_string(),
            2,
        )
        .unwrap();
        let service = DraftService::new(Some(client));

        let draft = service
            .generate_draft_for_year(&profile(), &request(1, 1), 2026)
            .await;
        assert_eq!(draft.summary_source, ContentSource::Profile);

        let result = service
            .rewrite("<p>Shipped things</p>", RewriteAction::Polish, None)
            .await;
        assert_eq!(result.source, ContentSource::Heuristic);
    }

    #[test]
    fn bare_text_is_wrapped() {
        assert_eq!(as_paragraphs("Hello"), "<p>Hello</p>");
        assert_eq!(as_paragraphs(" <p>Hi</p> "), "<p>Hi</p>");
    }
}
