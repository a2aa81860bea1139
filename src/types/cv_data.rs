// src/types/cv_data.rs
//! CV and profile data structures shared by the API, the graph store and the renderers

use serde::{Deserialize, Serialize};

use crate::validation::{self, FieldError};

// ===== Canonical CV structure =====

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CvData {
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Rich text (HTML) from the summary editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        self.street.is_none()
            && self.city.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }

    /// Single-line rendering, skipping blank parts
    pub fn one_line(&self) -> String {
        [&self.street, &self.postal_code, &self.city, &self.country]
            .iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>, // None with current = false means unknown
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub institution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// ===== Themes =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Classic,
    Modern,
    Minimal,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Classic, Theme::Modern, Theme::Minimal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Modern => "modern",
            Theme::Minimal => "minimal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "classic" | "default" => Some(Theme::Classic),
            "modern" => Some(Theme::Modern),
            "minimal" => Some(Theme::Minimal),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Theme::Classic => "Serif headings with a dark blue accent",
            Theme::Modern => "Sans-serif layout with a bright blue accent",
            Theme::Minimal => "Monochrome layout without accents",
        }
    }

    /// Accent color, as a hex string without `#`
    pub fn primary_color(&self) -> &'static str {
        match self {
            Theme::Classic => "1F3864",
            Theme::Modern => "14A4E6",
            Theme::Minimal => "222222",
        }
    }

    pub fn secondary_color(&self) -> &'static str {
        match self {
            Theme::Classic => "595959",
            Theme::Modern => "757575",
            Theme::Minimal => "666666",
        }
    }

    pub fn font_family(&self) -> &'static str {
        match self {
            Theme::Classic => "Georgia",
            Theme::Modern => "Helvetica",
            Theme::Minimal => "Arial",
        }
    }
}

// ===== Incoming payload =====

/// Wire shape accepted by the create/update/generate endpoints.
///
/// Form posts may send personal fields flat at the top level; `personal_info`
/// takes precedence when both are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CvPayload {
    #[serde(default)]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, alias = "work_experience")]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub theme: Option<Theme>,
}

impl CvPayload {
    /// Merge the flat and nested personal fields, then validate
    pub fn into_cv_data(self) -> Result<CvData, Vec<FieldError>> {
        let personal_info = match self.personal_info {
            Some(info) => info,
            None => PersonalInfo {
                name: self.name.unwrap_or_default(),
                title: self.title,
                email: self.email,
                phone: self.phone,
                summary: self.summary,
                ..PersonalInfo::default()
            },
        };

        let data = CvData {
            personal_info,
            experience: self.experience,
            education: self.education,
            skills: self.skills,
            theme: self.theme.unwrap_or_default(),
        };

        validation::validate_cv(&data)?;
        Ok(data)
    }
}

impl From<CvData> for CvPayload {
    fn from(data: CvData) -> Self {
        Self {
            personal_info: Some(data.personal_info),
            experience: data.experience,
            education: data.education,
            skills: data.skills,
            theme: Some(data.theme),
            ..Self::default()
        }
    }
}

// ===== Stored records =====

/// A persisted CV or profile: root identity plus the owned data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(flatten)]
    pub data: CvData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub updated_at: String,
}

impl Record {
    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            id: self.id.clone(),
            name: self.data.personal_info.name.clone(),
            title: self.data.personal_info.title.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_form_fields_become_personal_info() {
        let payload: CvPayload = serde_json::from_str(
            r#"{"name": "Jane Doe", "email": "jane@example.com", "experience": [], "education": [], "skills": []}"#,
        )
        .unwrap();

        let data = payload.into_cv_data().unwrap();
        assert_eq!(data.personal_info.name, "Jane Doe");
        assert_eq!(data.personal_info.email.as_deref(), Some("jane@example.com"));
        assert_eq!(data.theme, Theme::Classic);
    }

    #[test]
    fn nested_personal_info_wins_over_flat_fields() {
        let payload: CvPayload = serde_json::from_str(
            r#"{"name": "Flat", "personal_info": {"name": "Nested"}}"#,
        )
        .unwrap();

        assert_eq!(payload.into_cv_data().unwrap().personal_info.name, "Nested");
    }

    #[test]
    fn work_experience_alias_is_accepted() {
        let payload: CvPayload = serde_json::from_str(
            r#"{"name": "A", "work_experience": [{"title": "Dev", "company": "Acme"}]}"#,
        )
        .unwrap();

        assert_eq!(payload.into_cv_data().unwrap().experience.len(), 1);
    }

    #[test]
    fn record_serializes_flat() {
        let record = Record {
            id: "abc".to_string(),
            created_at: "t0".to_string(),
            updated_at: "t1".to_string(),
            data: CvData {
                personal_info: PersonalInfo {
                    name: "Jane".to_string(),
                    ..PersonalInfo::default()
                },
                ..CvData::default()
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["personal_info"]["name"], "Jane");
        assert_eq!(value["theme"], "classic");
    }

    #[test]
    fn address_one_line_skips_blanks() {
        let address = Address {
            street: Some("1 Main St".to_string()),
            city: Some("Geneva".to_string()),
            postal_code: Some(" ".to_string()),
            country: None,
        };
        assert_eq!(address.one_line(), "1 Main St, Geneva");
        assert!(!address.is_empty());
        assert!(Address::default().is_empty());
    }

    #[test]
    fn theme_parse_accepts_default_alias() {
        assert_eq!(Theme::parse("Default"), Some(Theme::Classic));
        assert_eq!(Theme::parse("modern"), Some(Theme::Modern));
        assert_eq!(Theme::parse("neon"), None);
    }
}
