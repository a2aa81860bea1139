// src/graph/memory.rs
//! In-process graph backend. Runs the same write plans as Neo4j against a
//! copy of the graph and swaps it in only when every operation succeeded.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::nodes::{assemble, ChildNodes, NodeRow, RootProps};
use super::store::{CvStore, StoreError};
use super::subgraph::{next_version, ChildKind, GraphOp, OwnedSubgraph, RootKind, WritePlan};
use crate::app_log;
use crate::types::{CvData, Record, RecordSummary};

#[derive(Debug, Clone)]
struct StoredChild {
    root: RootKind,
    root_id: String,
    row: NodeRow,
}

#[derive(Debug, Clone, Default)]
struct MemoryGraph {
    roots: HashMap<(RootKind, String), RootProps>,
    children: Vec<StoredChild>,
}

impl MemoryGraph {
    fn apply(&mut self, root: RootKind, root_id: &str, op: &GraphOp) -> Result<(), StoreError> {
        let key = (root, root_id.to_string());
        match op {
            GraphOp::CreateRoot(props) => {
                if self.roots.contains_key(&key) {
                    return Err(StoreError::Backend(format!(
                        "{} '{}' already exists",
                        root.label(),
                        root_id
                    )));
                }
                self.roots.insert(key, props.clone());
            }
            GraphOp::TouchRoot { updated_at, theme } => {
                let props = self
                    .roots
                    .get_mut(&key)
                    .ok_or_else(|| StoreError::not_found(root, root_id))?;
                props.updated_at = updated_at.clone();
                props.theme = *theme;
            }
            GraphOp::DeleteChildren(kind) => {
                self.children.retain(|child| {
                    !(child.root == root && child.root_id == root_id && child.row.kind == *kind)
                });
            }
            GraphOp::CreateChild(row) => {
                if !self.roots.contains_key(&key) {
                    return Err(StoreError::not_found(root, root_id));
                }
                if let Some(parent) = row.kind.parent() {
                    let has_parent = self.children.iter().any(|child| {
                        child.root == root
                            && child.root_id == root_id
                            && child.row.kind == parent
                            && Some(child.row.position) == row.parent_position
                    });
                    if !has_parent {
                        return Err(StoreError::Backend(format!(
                            "{} at {:?} has no owning {}",
                            row.kind.label(),
                            row.parent_position,
                            parent.label()
                        )));
                    }
                }
                self.children.push(StoredChild {
                    root,
                    root_id: root_id.to_string(),
                    row: row.clone(),
                });
            }
            GraphOp::DeleteRoot => {
                self.roots.remove(&key);
            }
            GraphOp::VerifyRoot { updated_at } => {
                let reachable = self
                    .roots
                    .get(&key)
                    .is_some_and(|props| &props.updated_at == updated_at);
                if !reachable {
                    return Err(StoreError::Backend(format!(
                        "{} '{}' not reachable at {}",
                        root.label(),
                        root_id,
                        updated_at
                    )));
                }
            }
        }
        Ok(())
    }

    fn record(&self, root: RootKind, props: &RootProps) -> Record {
        let mut nodes: ChildNodes<NodeRow> = ChildNodes::default();
        for child in self
            .children
            .iter()
            .filter(|child| child.root == root && child.root_id == props.id)
        {
            let row = child.row.clone();
            match row.kind {
                ChildKind::Person => nodes.person = Some(row),
                ChildKind::Experience => nodes.experiences.push(row),
                ChildKind::Project => nodes.projects.push(row),
                ChildKind::Education => nodes.education.push(row),
                ChildKind::Skill => nodes.skills.push(row),
            }
        }

        Record {
            id: props.id.clone(),
            created_at: props.created_at.clone(),
            updated_at: props.updated_at.clone(),
            data: assemble(&nodes, props.theme),
        }
    }

    fn roots_of(&self, root: RootKind) -> impl Iterator<Item = &RootProps> {
        self.roots
            .iter()
            .filter(move |((kind, _), _)| *kind == root)
            .map(|(_, props)| props)
    }

    fn newest_version(&self, root: RootKind) -> Option<String> {
        self.roots_of(root).map(|props| props.updated_at.clone()).max()
    }

    fn child_count(&self, root: RootKind, root_id: &str) -> usize {
        self.children
            .iter()
            .filter(|child| child.root == root && child.root_id == root_id)
            .count()
    }
}

pub struct MemoryStore {
    graph: Mutex<MemoryGraph>,
    #[cfg(test)]
    fail_at_op: std::sync::Mutex<Option<usize>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            graph: Mutex::new(MemoryGraph::default()),
            #[cfg(test)]
            fail_at_op: std::sync::Mutex::new(None),
        }
    }

    /// Run a plan on a copy of the graph; the copy replaces the graph only on success
    fn run_plan(&self, graph: &mut MemoryGraph, plan: &WritePlan) -> Result<(), StoreError> {
        let mut working = graph.clone();

        for (index, op) in plan.ops.iter().enumerate() {
            #[cfg(test)]
            if let Ok(guard) = self.fail_at_op.lock() {
                if *guard == Some(index) {
                    return Err(StoreError::Backend(format!("injected failure at op {}", index)));
                }
            }

            if let Err(e) = working.apply(plan.root, &plan.root_id, op) {
                app_log!(
                    warn,
                    "Rolling back {} '{}' at op {}: {}",
                    plan.root.label(),
                    plan.root_id,
                    index,
                    e
                );
                return Err(e);
            }
        }

        *graph = working;
        app_log!(
            debug,
            "Committed {} ops for {} '{}'",
            plan.ops.len(),
            plan.root.label(),
            plan.root_id
        );
        Ok(())
    }

    #[cfg(test)]
    fn fail_at(&self, op_index: Option<usize>) {
        if let Ok(mut guard) = self.fail_at_op.lock() {
            *guard = op_index;
        }
    }

    /// Child nodes still attached to a root, whether or not the root exists
    pub async fn owned_node_count(&self, root: RootKind, id: &str) -> usize {
        self.graph.lock().await.child_count(root, id)
    }
}

#[rocket::async_trait]
impl CvStore for MemoryStore {
    async fn create(&self, root: RootKind, data: &CvData) -> Result<Record, StoreError> {
        let mut graph = self.graph.lock().await;
        let id = Uuid::new_v4().to_string();
        let previous = graph.newest_version(root);
        let version = next_version(previous.as_deref(), Utc::now());
        let props = RootProps::new(id.clone(), version, data.theme);

        let plan = WritePlan::create(&OwnedSubgraph::standard(root), props.clone(), data);
        self.run_plan(&mut graph, &plan)?;

        Ok(graph.record(root, &props))
    }

    async fn get(&self, root: RootKind, id: &str) -> Result<Record, StoreError> {
        let graph = self.graph.lock().await;
        let props = graph
            .roots
            .get(&(root, id.to_string()))
            .ok_or_else(|| StoreError::not_found(root, id))?;
        Ok(graph.record(root, props))
    }

    async fn latest(&self, root: RootKind) -> Result<Record, StoreError> {
        let graph = self.graph.lock().await;
        let props = graph
            .roots_of(root)
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at))
            .ok_or_else(|| StoreError::NotFound(format!("no {} stored", root.label())))?;
        Ok(graph.record(root, props))
    }

    async fn find_by_version(&self, root: RootKind, version: &str) -> Result<Record, StoreError> {
        let graph = self.graph.lock().await;
        let props = graph
            .roots_of(root)
            .find(|props| props.updated_at == version)
            .ok_or_else(|| StoreError::not_found(root, version))?;
        Ok(graph.record(root, props))
    }

    async fn list(&self, root: RootKind) -> Result<Vec<RecordSummary>, StoreError> {
        let graph = self.graph.lock().await;
        let mut roots: Vec<&RootProps> = graph.roots_of(root).collect();
        roots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(roots
            .into_iter()
            .map(|props| graph.record(root, props).summary())
            .collect())
    }

    async fn replace(
        &self,
        root: RootKind,
        id: &str,
        data: &CvData,
        expected_version: Option<&str>,
    ) -> Result<Record, StoreError> {
        let mut graph = self.graph.lock().await;
        let current = graph
            .roots
            .get(&(root, id.to_string()))
            .map(|props| props.updated_at.clone())
            .ok_or_else(|| StoreError::not_found(root, id))?;

        if let Some(expected) = expected_version {
            if expected != current {
                return Err(StoreError::VersionConflict {
                    expected: expected.to_string(),
                    actual: current,
                });
            }
        }

        // Profiles are addressable by version, so it stays unique per root kind
        let newest = graph.newest_version(root).unwrap_or_else(|| current.clone());
        let version = next_version(Some(&newest), Utc::now());
        let plan = WritePlan::replace(&OwnedSubgraph::standard(root), id, &version, data);
        self.run_plan(&mut graph, &plan)?;

        let props = graph
            .roots
            .get(&(root, id.to_string()))
            .ok_or_else(|| StoreError::not_found(root, id))?;
        Ok(graph.record(root, props))
    }

    async fn delete(&self, root: RootKind, id: &str) -> Result<bool, StoreError> {
        let mut graph = self.graph.lock().await;
        if !graph.roots.contains_key(&(root, id.to_string())) {
            return Ok(false);
        }

        let plan = WritePlan::delete(&OwnedSubgraph::standard(root), id);
        self.run_plan(&mut graph, &plan)?;
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Education, Experience, PersonalInfo, Project, Skill, Theme};

    fn jane() -> CvData {
        CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                summary: Some("<p>Backend engineer</p>".to_string()),
                ..PersonalInfo::default()
            },
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                current: true,
                projects: vec![Project {
                    name: "Billing".to_string(),
                    technologies: vec!["Rust".to_string()],
                    ..Project::default()
                }],
                ..Experience::default()
            }],
            education: vec![Education {
                institution: "EPFL".to_string(),
                ..Education::default()
            }],
            skills: vec![Skill {
                name: "Rust".to_string(),
                ..Skill::default()
            }],
            theme: Theme::Classic,
        }
    }

    fn john() -> CvData {
        CvData {
            personal_info: PersonalInfo {
                name: "John Roe".to_string(),
                ..PersonalInfo::default()
            },
            skills: vec![Skill {
                name: "Go".to_string(),
                ..Skill::default()
            }],
            theme: Theme::Minimal,
            ..CvData::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryStore::new();
        let created = store.create(RootKind::Cv, &jane()).await.unwrap();

        let fetched = store.get(RootKind::Cv, &created.id).await.unwrap();
        assert_eq!(fetched.data, jane());
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn replace_removes_children_absent_from_payload() {
        let store = MemoryStore::new();
        let created = store.create(RootKind::Cv, &jane()).await.unwrap();

        let updated = store
            .replace(RootKind::Cv, &created.id, &john(), None)
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.data, john());
        assert_eq!(store.get(RootKind::Cv, &created.id).await.unwrap().data, john());
        // Person + one skill
        assert_eq!(store.owned_node_count(RootKind::Cv, &created.id).await, 2);
    }

    #[tokio::test]
    async fn profile_version_changes_and_old_one_stops_resolving() {
        let store = MemoryStore::new();
        let created = store.create(RootKind::Profile, &jane()).await.unwrap();
        let old_version = created.updated_at.clone();

        let updated = store
            .replace(RootKind::Profile, &created.id, &john(), None)
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert!(updated.updated_at > old_version);
        assert!(matches!(
            store.find_by_version(RootKind::Profile, &old_version).await,
            Err(StoreError::NotFound(_))
        ));
        let by_new = store
            .find_by_version(RootKind::Profile, &updated.updated_at)
            .await
            .unwrap();
        assert_eq!(by_new.data, john());
    }

    #[tokio::test]
    async fn delete_leaves_no_orphans() {
        let store = MemoryStore::new();
        let created = store.create(RootKind::Cv, &jane()).await.unwrap();
        assert_eq!(store.owned_node_count(RootKind::Cv, &created.id).await, 5);

        assert!(store.delete(RootKind::Cv, &created.id).await.unwrap());
        assert_eq!(store.owned_node_count(RootKind::Cv, &created.id).await, 0);
        assert!(matches!(
            store.get(RootKind::Cv, &created.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.delete(RootKind::Cv, &created.id).await.unwrap());
    }

    #[tokio::test]
    async fn failure_mid_replace_keeps_previous_graph() {
        let store = MemoryStore::new();
        let created = store.create(RootKind::Cv, &jane()).await.unwrap();

        // TouchRoot and the first deletes succeed, then the plan fails
        store.fail_at(Some(4));
        let result = store.replace(RootKind::Cv, &created.id, &john(), None).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        store.fail_at(None);

        let fetched = store.get(RootKind::Cv, &created.id).await.unwrap();
        assert_eq!(fetched.data, jane());
        assert_eq!(fetched.updated_at, created.updated_at);
        assert_eq!(store.owned_node_count(RootKind::Cv, &created.id).await, 5);
    }

    #[tokio::test]
    async fn stale_if_match_is_a_conflict() {
        let store = MemoryStore::new();
        let created = store.create(RootKind::Cv, &jane()).await.unwrap();

        let first = store
            .replace(RootKind::Cv, &created.id, &john(), Some(&created.updated_at))
            .await
            .unwrap();

        let second = store
            .replace(RootKind::Cv, &created.id, &jane(), Some(&created.updated_at))
            .await;
        match second {
            Err(StoreError::VersionConflict { expected, actual }) => {
                assert_eq!(expected, created.updated_at);
                assert_eq!(actual, first.updated_at);
            }
            other => panic!("expected conflict, got {:?}", other.map(|r| r.id)),
        }
    }

    #[tokio::test]
    async fn replace_missing_root_is_not_found() {
        let store = MemoryStore::new();
        let result = store.replace(RootKind::Cv, "missing", &jane(), None).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_and_latest_are_newest_first() {
        let store = MemoryStore::new();
        let first = store.create(RootKind::Profile, &jane()).await.unwrap();
        let second = store.create(RootKind::Profile, &john()).await.unwrap();
        store.create(RootKind::Cv, &jane()).await.unwrap();

        let latest = store.latest(RootKind::Profile).await.unwrap();
        let summaries = store.list(RootKind::Profile).await.unwrap();

        assert!(second.updated_at > first.updated_at);
        assert_eq!(latest.id, second.id);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].id, second.id);
        assert_eq!(summaries[1].id, first.id);
    }
}
