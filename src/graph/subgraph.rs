// src/graph/subgraph.rs
//! Owned-subgraph description and the write plans derived from it

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use super::nodes::{rows_for, NodeRow, RootProps};
use super::store::StoreError;
use crate::types::{CvData, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    Cv,
    Profile,
}

impl RootKind {
    pub fn label(&self) -> &'static str {
        match self {
            RootKind::Cv => "CV",
            RootKind::Profile => "Profile",
        }
    }

    /// Back-relationship every owned node carries to its root
    pub fn belongs_rel(&self) -> &'static str {
        match self {
            RootKind::Cv => "BELONGS_TO_CV",
            RootKind::Profile => "BELONGS_TO_PROFILE",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RootKind::Cv => "cv",
            RootKind::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKind {
    Person,
    Experience,
    Project,
    Education,
    Skill,
}

impl ChildKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChildKind::Person => "Person",
            ChildKind::Experience => "Experience",
            ChildKind::Project => "Project",
            ChildKind::Education => "Education",
            ChildKind::Skill => "Skill",
        }
    }

    /// Owning child type, `None` when the node hangs directly off the root
    pub fn parent(&self) -> Option<ChildKind> {
        match self {
            ChildKind::Project => Some(ChildKind::Experience),
            _ => None,
        }
    }

    /// Relationship from the owner (root or parent child) to this node
    pub fn link_rel(&self) -> &'static str {
        match self {
            ChildKind::Person => "HAS_PERSON",
            ChildKind::Experience => "HAS_EXPERIENCE",
            ChildKind::Project => "HAS_PROJECT",
            ChildKind::Education => "HAS_EDUCATION",
            ChildKind::Skill => "HAS_SKILL",
        }
    }
}

/// Child node types owned by one root, in create order, with their dependency depth
#[derive(Debug, Clone)]
pub struct OwnedSubgraph {
    root: RootKind,
    children: Vec<(ChildKind, u8)>,
}

impl OwnedSubgraph {
    pub fn new(root: RootKind, children: Vec<(ChildKind, u8)>) -> Result<Self, StoreError> {
        for (index, (kind, depth)) in children.iter().enumerate() {
            if children[..index].iter().any(|(seen, _)| seen == kind) {
                return Err(StoreError::InvalidPlan(format!(
                    "{} declared twice",
                    kind.label()
                )));
            }

            match kind.parent() {
                Some(parent) => {
                    let parent_depth = children[..index]
                        .iter()
                        .find(|(seen, _)| *seen == parent)
                        .map(|(_, d)| *d)
                        .ok_or_else(|| {
                            StoreError::InvalidPlan(format!(
                                "{} declared before its parent {}",
                                kind.label(),
                                parent.label()
                            ))
                        })?;
                    if *depth <= parent_depth {
                        return Err(StoreError::InvalidPlan(format!(
                            "{} must be deeper than {}",
                            kind.label(),
                            parent.label()
                        )));
                    }
                }
                None if *depth != 1 => {
                    return Err(StoreError::InvalidPlan(format!(
                        "{} hangs off the root and must have depth 1",
                        kind.label()
                    )));
                }
                None => {}
            }
        }

        Ok(Self { root, children })
    }

    /// The CV/profile shape: person, experiences with their projects, education, skills
    pub fn standard(root: RootKind) -> Self {
        Self {
            root,
            children: vec![
                (ChildKind::Person, 1),
                (ChildKind::Experience, 1),
                (ChildKind::Project, 2),
                (ChildKind::Education, 1),
                (ChildKind::Skill, 1),
            ],
        }
    }

    pub fn root(&self) -> RootKind {
        self.root
    }

    pub fn create_order(&self) -> Vec<ChildKind> {
        self.children.iter().map(|(kind, _)| *kind).collect()
    }

    /// Leaves first; equal depths in reverse declaration order
    pub fn delete_order(&self) -> Vec<ChildKind> {
        let mut indexed: Vec<(usize, ChildKind, u8)> = self
            .children
            .iter()
            .enumerate()
            .map(|(index, (kind, depth))| (index, *kind, *depth))
            .collect();
        indexed.sort_by(|a, b| b.2.cmp(&a.2).then(b.0.cmp(&a.0)));
        indexed.into_iter().map(|(_, kind, _)| kind).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    CreateRoot(RootProps),
    TouchRoot { updated_at: String, theme: Theme },
    DeleteChildren(ChildKind),
    CreateChild(NodeRow),
    DeleteRoot,
    VerifyRoot { updated_at: String },
}

/// Ordered operations one transaction executes against a single root
#[derive(Debug, Clone, PartialEq)]
pub struct WritePlan {
    pub root: RootKind,
    pub root_id: String,
    pub ops: Vec<GraphOp>,
}

impl WritePlan {
    pub fn create(subgraph: &OwnedSubgraph, props: RootProps, data: &CvData) -> Self {
        let root_id = props.id.clone();
        let updated_at = props.updated_at.clone();
        let mut ops = vec![GraphOp::CreateRoot(props)];
        ops.extend(create_ops(subgraph, data));
        ops.push(GraphOp::VerifyRoot { updated_at });

        Self {
            root: subgraph.root(),
            root_id,
            ops,
        }
    }

    pub fn replace(subgraph: &OwnedSubgraph, root_id: &str, updated_at: &str, data: &CvData) -> Self {
        let mut ops = vec![GraphOp::TouchRoot {
            updated_at: updated_at.to_string(),
            theme: data.theme,
        }];
        ops.extend(
            subgraph
                .delete_order()
                .into_iter()
                .map(GraphOp::DeleteChildren),
        );
        ops.extend(create_ops(subgraph, data));
        ops.push(GraphOp::VerifyRoot {
            updated_at: updated_at.to_string(),
        });

        Self {
            root: subgraph.root(),
            root_id: root_id.to_string(),
            ops,
        }
    }

    pub fn delete(subgraph: &OwnedSubgraph, root_id: &str) -> Self {
        let mut ops: Vec<GraphOp> = subgraph
            .delete_order()
            .into_iter()
            .map(GraphOp::DeleteChildren)
            .collect();
        ops.push(GraphOp::DeleteRoot);

        Self {
            root: subgraph.root(),
            root_id: root_id.to_string(),
            ops,
        }
    }
}

fn create_ops(subgraph: &OwnedSubgraph, data: &CvData) -> Vec<GraphOp> {
    let rows = rows_for(data);
    subgraph
        .create_order()
        .into_iter()
        .flat_map(|kind| {
            rows.iter()
                .filter(move |row| row.kind == kind)
                .cloned()
                .map(GraphOp::CreateChild)
        })
        .collect()
}

pub fn format_version(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Next `updated_at`: `max(now, previous + 1µs)`, so versions strictly increase
pub fn next_version(previous: Option<&str>, now: DateTime<Utc>) -> String {
    let now = now.trunc_subsecs(6);
    let floor = previous
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|prev| prev.with_timezone(&Utc).trunc_subsecs(6) + chrono::Duration::microseconds(1));

    match floor {
        Some(floor) if floor > now => format_version(floor),
        _ => format_version(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Experience, PersonalInfo, Project, Skill};

    fn sample() -> CvData {
        CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                ..PersonalInfo::default()
            },
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                projects: vec![Project {
                    name: "Billing".to_string(),
                    ..Project::default()
                }],
                ..Experience::default()
            }],
            skills: vec![Skill {
                name: "Rust".to_string(),
                ..Skill::default()
            }],
            ..CvData::default()
        }
    }

    fn kinds(ops: &[GraphOp]) -> Vec<String> {
        ops.iter()
            .map(|op| match op {
                GraphOp::CreateRoot(_) => "create_root".to_string(),
                GraphOp::TouchRoot { .. } => "touch_root".to_string(),
                GraphOp::DeleteChildren(kind) => format!("delete:{}", kind.label()),
                GraphOp::CreateChild(row) => format!("create:{}", row.kind.label()),
                GraphOp::DeleteRoot => "delete_root".to_string(),
                GraphOp::VerifyRoot { .. } => "verify_root".to_string(),
            })
            .collect()
    }

    #[test]
    fn standard_delete_order_is_leaf_first() {
        let subgraph = OwnedSubgraph::standard(RootKind::Profile);
        assert_eq!(
            subgraph.delete_order(),
            vec![
                ChildKind::Project,
                ChildKind::Skill,
                ChildKind::Education,
                ChildKind::Experience,
                ChildKind::Person,
            ]
        );
        assert_eq!(
            subgraph.create_order(),
            vec![
                ChildKind::Person,
                ChildKind::Experience,
                ChildKind::Project,
                ChildKind::Education,
                ChildKind::Skill,
            ]
        );
    }

    #[test]
    fn child_before_parent_is_rejected() {
        let result = OwnedSubgraph::new(
            RootKind::Cv,
            vec![(ChildKind::Project, 2), (ChildKind::Experience, 1)],
        );
        assert!(matches!(result, Err(StoreError::InvalidPlan(_))));

        let flat_project = OwnedSubgraph::new(
            RootKind::Cv,
            vec![(ChildKind::Experience, 1), (ChildKind::Project, 1)],
        );
        assert!(flat_project.is_err());

        let ok = OwnedSubgraph::new(
            RootKind::Cv,
            vec![(ChildKind::Experience, 1), (ChildKind::Project, 2)],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn replace_plan_touches_deletes_recreates_then_verifies() {
        let subgraph = OwnedSubgraph::standard(RootKind::Cv);
        let plan = WritePlan::replace(&subgraph, "root-1", "2026-01-01T00:00:00.000001Z", &sample());

        assert_eq!(
            kinds(&plan.ops),
            vec![
                "touch_root",
                "delete:Project",
                "delete:Skill",
                "delete:Education",
                "delete:Experience",
                "delete:Person",
                "create:Person",
                "create:Experience",
                "create:Project",
                "create:Skill",
                "verify_root",
            ]
        );
        assert!(!plan.ops.contains(&GraphOp::DeleteRoot));
    }

    #[test]
    fn create_and_delete_plans() {
        let subgraph = OwnedSubgraph::standard(RootKind::Cv);
        let props = RootProps::new("root-1".to_string(), "2026-01-01T00:00:00.000000Z".to_string(), Theme::Modern);
        let create = WritePlan::create(&subgraph, props, &sample());
        let create_kinds = kinds(&create.ops);
        assert_eq!(create_kinds.first().map(String::as_str), Some("create_root"));
        assert_eq!(create_kinds.last().map(String::as_str), Some("verify_root"));

        let delete = WritePlan::delete(&subgraph, "root-1");
        assert_eq!(delete.ops.last(), Some(&GraphOp::DeleteRoot));
        assert_eq!(delete.ops.len(), 6);
    }

    #[test]
    fn next_version_strictly_increases() {
        let now = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(next_version(None, now), "2026-03-01T10:00:00.000000Z");

        // Previous write in the same microsecond, or a clock that went backwards
        assert_eq!(
            next_version(Some("2026-03-01T10:00:00.000000Z"), now),
            "2026-03-01T10:00:00.000001Z"
        );
        assert_eq!(
            next_version(Some("2026-03-01T10:00:05.000000Z"), now),
            "2026-03-01T10:00:05.000001Z"
        );
        assert_eq!(
            next_version(Some("2026-03-01T09:00:00.000000Z"), now),
            "2026-03-01T10:00:00.000000Z"
        );
    }
}
