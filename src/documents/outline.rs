// src/documents/outline.rs
//! Renderer-neutral document structure built from validated CV data

use crate::richtext::{blocks, Block};
use crate::types::{CvData, Education, Experience, Skill, Theme};

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutline {
    pub theme: Theme,
    pub name: String,
    pub headline: Option<String>,
    pub contact: Vec<String>,
    pub summary: Vec<Block>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    pub heading: String,
    pub subheading: Option<String>,
    pub dates: Option<String>,
    pub body: Vec<Block>,
    /// Single-line facts (technologies, links, skill lists)
    pub details: Vec<String>,
    pub children: Vec<Entry>,
}

pub fn date_range(start: Option<&str>, end: Option<&str>, current: bool) -> Option<String> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());

    match (start, end, current) {
        (Some(start), _, true) => Some(format!("{} - Present", start)),
        (Some(start), Some(end), false) => Some(format!("{} - {}", start, end)),
        (Some(start), None, false) => Some(start.to_string()),
        (None, _, true) => Some("Present".to_string()),
        (None, Some(end), false) => Some(end.to_string()),
        (None, None, false) => None,
    }
}

fn joined(parts: &[Option<&String>]) -> Option<String> {
    let parts: Vec<&str> = parts
        .iter()
        .filter_map(|part| part.map(|s| s.trim()))
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn rich(html: Option<&String>) -> Vec<Block> {
    html.map(|html| blocks(html)).unwrap_or_default()
}

fn experience_entry(exp: &Experience) -> Entry {
    let children = exp
        .projects
        .iter()
        .map(|project| {
            let mut details = Vec::new();
            if !project.technologies.is_empty() {
                details.push(format!("Technologies: {}", project.technologies.join(", ")));
            }
            if let Some(url) = project.url.as_ref().filter(|u| !u.trim().is_empty()) {
                details.push(url.trim().to_string());
            }
            Entry {
                heading: project.name.clone(),
                body: rich(project.description.as_ref()),
                details,
                ..Entry::default()
            }
        })
        .collect();

    Entry {
        heading: exp.title.clone(),
        subheading: joined(&[Some(&exp.company), exp.location.as_ref()]),
        dates: date_range(exp.start_date.as_deref(), exp.end_date.as_deref(), exp.current),
        body: rich(exp.description.as_ref()),
        details: Vec::new(),
        children,
    }
}

fn education_entry(edu: &Education) -> Entry {
    Entry {
        heading: edu.institution.clone(),
        subheading: joined(&[edu.degree.as_ref(), edu.field.as_ref()]),
        dates: date_range(edu.start_date.as_deref(), edu.end_date.as_deref(), false),
        body: rich(edu.description.as_ref()),
        ..Entry::default()
    }
}

/// One entry per category, in first-appearance order; uncategorized skills go under "Skills"
fn skill_entries(skills: &[Skill]) -> Vec<Entry> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();

    for skill in skills {
        let category = skill
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or("Skills")
            .to_string();
        let label = match skill.level.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
            Some(level) => format!("{} ({})", skill.name.trim(), level),
            None => skill.name.trim().to_string(),
        };

        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, labels)) => labels.push(label),
            None => groups.push((category, vec![label])),
        }
    }

    groups
        .into_iter()
        .map(|(category, labels)| Entry {
            heading: category,
            details: vec![labels.join(", ")],
            ..Entry::default()
        })
        .collect()
}

impl DocumentOutline {
    pub fn from_cv(data: &CvData) -> Self {
        let person = &data.personal_info;

        let mut contact: Vec<String> = [
            person.email.as_ref(),
            person.phone.as_ref(),
            person.linkedin.as_ref(),
            person.website.as_ref(),
        ]
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
        if let Some(address) = person.address.as_ref() {
            let line = address.one_line();
            if !line.is_empty() {
                contact.push(line);
            }
        }

        let candidates = [
            Section {
                title: "Experience",
                entries: data.experience.iter().map(experience_entry).collect(),
            },
            Section {
                title: "Education",
                entries: data.education.iter().map(education_entry).collect(),
            },
            Section {
                title: "Skills",
                entries: skill_entries(&data.skills),
            },
        ];

        Self {
            theme: data.theme,
            name: person.name.trim().to_string(),
            headline: person
                .title
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            contact,
            summary: rich(person.summary.as_ref()),
            sections: candidates
                .into_iter()
                .filter(|section| !section.entries.is_empty())
                .collect(),
        }
    }
}
