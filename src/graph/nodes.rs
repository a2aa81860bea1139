// src/graph/nodes.rs
//! Flattening `CvData` into node rows and assembling it back from stored nodes

use std::collections::HashMap;

use super::subgraph::ChildKind;
use crate::types::{Address, CvData, Education, Experience, PersonalInfo, Project, Skill, Theme};

#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Text(String),
    Int(i64),
    Bool(bool),
    TextList(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RootProps {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub theme: Theme,
}

impl RootProps {
    pub fn new(id: String, version: String, theme: Theme) -> Self {
        Self {
            id,
            created_at: version.clone(),
            updated_at: version,
            theme,
        }
    }
}

/// One child node to create. `position` keeps list order; projects also
/// record the position of the experience that owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub kind: ChildKind,
    pub position: i64,
    pub parent_position: Option<i64>,
    pub props: Vec<(&'static str, PropValue)>,
}

impl NodeRow {
    fn new(kind: ChildKind, position: usize) -> Self {
        Self {
            kind,
            position: position as i64,
            parent_position: None,
            props: Vec::new(),
        }
    }

    fn with_text(mut self, key: &'static str, value: &str) -> Self {
        self.props.push((key, PropValue::Text(value.to_string())));
        self
    }

    fn with_opt(mut self, key: &'static str, value: Option<&String>) -> Self {
        if let Some(value) = value {
            self.props.push((key, PropValue::Text(value.clone())));
        }
        self
    }

    fn with_flag(mut self, key: &'static str, value: bool) -> Self {
        self.props.push((key, PropValue::Bool(value)));
        self
    }

    fn with_list(mut self, key: &'static str, values: &[String]) -> Self {
        if !values.is_empty() {
            self.props.push((key, PropValue::TextList(values.to_vec())));
        }
        self
    }
}

/// Rows for every owned node, grouped by kind in create order
pub fn rows_for(data: &CvData) -> Vec<NodeRow> {
    let mut rows = Vec::new();
    let person = &data.personal_info;
    let address = person.address.as_ref().filter(|a| !a.is_empty());

    rows.push(
        NodeRow::new(ChildKind::Person, 0)
            .with_text("name", &person.name)
            .with_opt("title", person.title.as_ref())
            .with_opt("email", person.email.as_ref())
            .with_opt("phone", person.phone.as_ref())
            .with_opt("summary", person.summary.as_ref())
            .with_opt("linkedin", person.linkedin.as_ref())
            .with_opt("website", person.website.as_ref())
            .with_opt("address_street", address.and_then(|a| a.street.as_ref()))
            .with_opt("address_city", address.and_then(|a| a.city.as_ref()))
            .with_opt("address_postal_code", address.and_then(|a| a.postal_code.as_ref()))
            .with_opt("address_country", address.and_then(|a| a.country.as_ref())),
    );

    for (i, exp) in data.experience.iter().enumerate() {
        rows.push(
            NodeRow::new(ChildKind::Experience, i)
                .with_text("title", &exp.title)
                .with_text("company", &exp.company)
                .with_opt("location", exp.location.as_ref())
                .with_opt("start_date", exp.start_date.as_ref())
                .with_opt("end_date", exp.end_date.as_ref())
                .with_flag("current", exp.current)
                .with_opt("description", exp.description.as_ref()),
        );
    }

    for (i, exp) in data.experience.iter().enumerate() {
        for (j, project) in exp.projects.iter().enumerate() {
            let mut row = NodeRow::new(ChildKind::Project, j)
                .with_text("name", &project.name)
                .with_opt("description", project.description.as_ref())
                .with_list("technologies", &project.technologies)
                .with_opt("url", project.url.as_ref());
            row.parent_position = Some(i as i64);
            rows.push(row);
        }
    }

    for (i, edu) in data.education.iter().enumerate() {
        rows.push(
            NodeRow::new(ChildKind::Education, i)
                .with_text("institution", &edu.institution)
                .with_opt("degree", edu.degree.as_ref())
                .with_opt("field", edu.field.as_ref())
                .with_opt("start_date", edu.start_date.as_ref())
                .with_opt("end_date", edu.end_date.as_ref())
                .with_opt("description", edu.description.as_ref()),
        );
    }

    for (i, skill) in data.skills.iter().enumerate() {
        rows.push(
            NodeRow::new(ChildKind::Skill, i)
                .with_text("name", &skill.name)
                .with_opt("level", skill.level.as_ref())
                .with_opt("category", skill.category.as_ref()),
        );
    }

    rows
}

/// Property access shared by in-memory rows and database nodes
pub trait PropReader {
    fn text(&self, key: &str) -> Option<String>;
    fn int(&self, key: &str) -> Option<i64>;
    fn boolean(&self, key: &str) -> Option<bool>;
    fn list(&self, key: &str) -> Vec<String>;
}

impl NodeRow {
    fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }
}

impl PropReader for NodeRow {
    fn text(&self, key: &str) -> Option<String> {
        match self.prop(key) {
            Some(PropValue::Text(value)) => Some(value.clone()),
            _ => None,
        }
    }

    fn int(&self, key: &str) -> Option<i64> {
        match key {
            "position" => Some(self.position),
            "parent_position" => self.parent_position,
            _ => match self.prop(key) {
                Some(PropValue::Int(value)) => Some(*value),
                _ => None,
            },
        }
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        match self.prop(key) {
            Some(PropValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    fn list(&self, key: &str) -> Vec<String> {
        match self.prop(key) {
            Some(PropValue::TextList(values)) => values.clone(),
            _ => Vec::new(),
        }
    }
}

fn person_from<R: PropReader>(node: &R) -> PersonalInfo {
    let address = Address {
        street: node.text("address_street"),
        city: node.text("address_city"),
        postal_code: node.text("address_postal_code"),
        country: node.text("address_country"),
    };

    PersonalInfo {
        name: node.text("name").unwrap_or_default(),
        title: node.text("title"),
        email: node.text("email"),
        phone: node.text("phone"),
        summary: node.text("summary"),
        linkedin: node.text("linkedin"),
        website: node.text("website"),
        address: (!address.is_empty()).then_some(address),
    }
}

fn experience_from<R: PropReader>(node: &R) -> Experience {
    Experience {
        title: node.text("title").unwrap_or_default(),
        company: node.text("company").unwrap_or_default(),
        location: node.text("location"),
        start_date: node.text("start_date"),
        end_date: node.text("end_date"),
        current: node.boolean("current").unwrap_or(false),
        description: node.text("description"),
        projects: Vec::new(),
    }
}

fn project_from<R: PropReader>(node: &R) -> Project {
    Project {
        name: node.text("name").unwrap_or_default(),
        description: node.text("description"),
        technologies: node.list("technologies"),
        url: node.text("url"),
    }
}

fn education_from<R: PropReader>(node: &R) -> Education {
    Education {
        institution: node.text("institution").unwrap_or_default(),
        degree: node.text("degree"),
        field: node.text("field"),
        start_date: node.text("start_date"),
        end_date: node.text("end_date"),
        description: node.text("description"),
    }
}

fn skill_from<R: PropReader>(node: &R) -> Skill {
    Skill {
        name: node.text("name").unwrap_or_default(),
        level: node.text("level"),
        category: node.text("category"),
    }
}

fn by_position<R: PropReader>(nodes: &[R]) -> Vec<&R> {
    let mut sorted: Vec<&R> = nodes.iter().collect();
    sorted.sort_by_key(|node| node.int("position").unwrap_or(i64::MAX));
    sorted
}

/// Stored child nodes of one root, grouped by kind
pub struct ChildNodes<R> {
    pub person: Option<R>,
    pub experiences: Vec<R>,
    pub projects: Vec<R>,
    pub education: Vec<R>,
    pub skills: Vec<R>,
}

impl<R> Default for ChildNodes<R> {
    fn default() -> Self {
        Self {
            person: None,
            experiences: Vec::new(),
            projects: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
        }
    }
}

/// Rebuild `CvData` in payload order from stored child nodes
pub fn assemble<R: PropReader>(nodes: &ChildNodes<R>, theme: Theme) -> CvData {
    let personal_info = nodes.person.as_ref().map(person_from).unwrap_or_default();

    let ordered_experiences = by_position(&nodes.experiences);
    let mut experience: Vec<Experience> = ordered_experiences
        .iter()
        .map(|node| experience_from(*node))
        .collect();

    let slot_by_position: HashMap<i64, usize> = ordered_experiences
        .iter()
        .enumerate()
        .filter_map(|(slot, node)| node.int("position").map(|pos| (pos, slot)))
        .collect();

    let mut projects: Vec<&R> = nodes.projects.iter().collect();
    projects.sort_by_key(|node| {
        (
            node.int("parent_position").unwrap_or(i64::MAX),
            node.int("position").unwrap_or(i64::MAX),
        )
    });
    for node in projects {
        let slot = node
            .int("parent_position")
            .and_then(|pos| slot_by_position.get(&pos));
        if let Some(&slot) = slot {
            experience[slot].projects.push(project_from(node));
        }
    }

    CvData {
        personal_info,
        experience,
        education: by_position(&nodes.education)
            .into_iter()
            .map(education_from)
            .collect(),
        skills: by_position(&nodes.skills).into_iter().map(skill_from).collect(),
        theme,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> CvData {
        CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                title: Some("Staff Engineer".to_string()),
                email: Some("jane@example.com".to_string()),
                summary: Some("<p>Builds <strong>systems</strong></p>".to_string()),
                address: Some(Address {
                    city: Some("Lausanne".to_string()),
                    country: Some("CH".to_string()),
                    ..Address::default()
                }),
                ..PersonalInfo::default()
            },
            experience: vec![
                Experience {
                    title: "Engineer".to_string(),
                    company: "Acme".to_string(),
                    current: true,
                    projects: vec![
                        Project {
                            name: "Billing".to_string(),
                            technologies: vec!["Rust".to_string(), "Neo4j".to_string()],
                            ..Project::default()
                        },
                        Project {
                            name: "Search".to_string(),
                            ..Project::default()
                        },
                    ],
                    ..Experience::default()
                },
                Experience {
                    title: "Intern".to_string(),
                    company: "Initech".to_string(),
                    end_date: Some("2019-08".to_string()),
                    projects: vec![Project {
                        name: "Reports".to_string(),
                        ..Project::default()
                    }],
                    ..Experience::default()
                },
            ],
            education: vec![Education {
                institution: "EPFL".to_string(),
                degree: Some("MSc".to_string()),
                ..Education::default()
            }],
            skills: vec![
                Skill {
                    name: "Rust".to_string(),
                    level: Some("expert".to_string()),
                    ..Skill::default()
                },
                Skill {
                    name: "Cypher".to_string(),
                    ..Skill::default()
                },
            ],
            theme: Theme::Modern,
        }
    }

    fn group(rows: Vec<NodeRow>) -> ChildNodes<NodeRow> {
        let mut nodes = ChildNodes::default();
        for row in rows {
            match row.kind {
                ChildKind::Person => nodes.person = Some(row),
                ChildKind::Experience => nodes.experiences.push(row),
                ChildKind::Project => nodes.projects.push(row),
                ChildKind::Education => nodes.education.push(row),
                ChildKind::Skill => nodes.skills.push(row),
            }
        }
        nodes
    }

    #[test]
    fn rows_then_assemble_restores_data() {
        let data = full();
        let assembled = assemble(&group(rows_for(&data)), Theme::Modern);
        assert_eq!(assembled, data);
    }

    #[test]
    fn assemble_orders_by_position_not_storage_order() {
        let data = full();
        let mut rows = rows_for(&data);
        rows.reverse();
        let assembled = assemble(&group(rows), Theme::Modern);
        assert_eq!(assembled.experience[0].company, "Acme");
        assert_eq!(assembled.experience[0].projects[0].name, "Billing");
        assert_eq!(assembled.experience[1].projects[0].name, "Reports");
        assert_eq!(assembled.skills[1].name, "Cypher");
    }

    #[test]
    fn address_is_flattened_and_omitted_when_empty() {
        let mut data = full();
        let person_row = rows_for(&data).into_iter().next().unwrap();
        assert_eq!(person_row.text("address_city").as_deref(), Some("Lausanne"));
        assert_eq!(person_row.text("address_street"), None);

        data.personal_info.address = Some(Address::default());
        let person_row = rows_for(&data).into_iter().next().unwrap();
        assert!(person_row.props.iter().all(|(k, _)| !k.starts_with("address_")));
    }

    #[test]
    fn projects_carry_parent_position() {
        let rows = rows_for(&full());
        let projects: Vec<&NodeRow> = rows.iter().filter(|r| r.kind == ChildKind::Project).collect();
        assert_eq!(projects.len(), 3);
        assert_eq!(projects[2].parent_position, Some(1));
        assert_eq!(projects[2].position, 0);
    }
}
