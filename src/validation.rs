// src/validation.rs
//! Boundary validation of CV data before it reaches the store or a renderer

use email_address::EmailAddress;
use serde::Serialize;

use crate::richtext::char_count;
use crate::types::CvData;

pub const SUMMARY_MAX_CHARS: usize = 1500;
pub const EXPERIENCE_DESCRIPTION_MAX_CHARS: usize = 2000;
pub const PROJECT_DESCRIPTION_MAX_CHARS: usize = 1000;
pub const EDUCATION_DESCRIPTION_MAX_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn check_rich_text(
    errors: &mut Vec<FieldError>,
    field: String,
    value: Option<&str>,
    max_chars: usize,
) {
    if let Some(html) = value {
        let count = char_count(html);
        if count > max_chars {
            errors.push(FieldError::new(
                field,
                format!("must be at most {} characters (got {})", max_chars, count),
            ));
        }
    }
}

/// Collect every field error instead of stopping at the first
pub fn validate_cv(data: &CvData) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let person = &data.personal_info;

    if is_blank(&person.name) {
        errors.push(FieldError::new("personal_info.name", "is required"));
    }

    if let Some(email) = person.email.as_deref().map(str::trim) {
        if !email.is_empty() && !EmailAddress::is_valid(email) {
            errors.push(FieldError::new(
                "personal_info.email",
                format!("'{}' is not a valid email address", email),
            ));
        }
    }

    check_rich_text(
        &mut errors,
        "personal_info.summary".to_string(),
        person.summary.as_deref(),
        SUMMARY_MAX_CHARS,
    );

    for (i, experience) in data.experience.iter().enumerate() {
        if is_blank(&experience.title) {
            errors.push(FieldError::new(format!("experience[{}].title", i), "is required"));
        }
        if is_blank(&experience.company) {
            errors.push(FieldError::new(format!("experience[{}].company", i), "is required"));
        }
        check_rich_text(
            &mut errors,
            format!("experience[{}].description", i),
            experience.description.as_deref(),
            EXPERIENCE_DESCRIPTION_MAX_CHARS,
        );

        for (j, project) in experience.projects.iter().enumerate() {
            if is_blank(&project.name) {
                errors.push(FieldError::new(
                    format!("experience[{}].projects[{}].name", i, j),
                    "is required",
                ));
            }
            check_rich_text(
                &mut errors,
                format!("experience[{}].projects[{}].description", i, j),
                project.description.as_deref(),
                PROJECT_DESCRIPTION_MAX_CHARS,
            );
        }
    }

    for (i, education) in data.education.iter().enumerate() {
        if is_blank(&education.institution) {
            errors.push(FieldError::new(
                format!("education[{}].institution", i),
                "is required",
            ));
        }
        check_rich_text(
            &mut errors,
            format!("education[{}].description", i),
            education.description.as_deref(),
            EDUCATION_DESCRIPTION_MAX_CHARS,
        );
    }

    for (i, skill) in data.skills.iter().enumerate() {
        if is_blank(&skill.name) {
            errors.push(FieldError::new(format!("skills[{}].name", i), "is required"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
