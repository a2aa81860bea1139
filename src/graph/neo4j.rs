// src/graph/neo4j.rs
//! Neo4j backend: each write plan runs inside one explicit transaction

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use neo4rs::{query, BoltMap, BoltString, BoltType, Graph, Query, Row, Txn};
use uuid::Uuid;

use super::nodes::{assemble, ChildNodes, NodeRow, PropReader, PropValue, RootProps};
use super::store::{CvStore, StoreError};
use super::subgraph::{next_version, ChildKind, GraphOp, OwnedSubgraph, RootKind, WritePlan};
use crate::app_log;
use crate::core::config_manager::DatabaseSettings;
use crate::types::{CvData, Record, RecordSummary, Theme};

// ===== Connection =====

/// Profile timestamps address versions, so two profiles may never share one.
/// The uniqueness constraint brings its own index, which replaces the plain one.
const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE CONSTRAINT cv_id IF NOT EXISTS FOR (r:CV) REQUIRE r.id IS UNIQUE",
    "CREATE CONSTRAINT profile_id IF NOT EXISTS FOR (r:Profile) REQUIRE r.id IS UNIQUE",
    "CREATE INDEX cv_updated_at IF NOT EXISTS FOR (r:CV) ON (r.updated_at)",
    "DROP INDEX profile_updated_at IF EXISTS",
    "CREATE CONSTRAINT profile_updated_at_unique IF NOT EXISTS FOR (r:Profile) REQUIRE r.updated_at IS UNIQUE",
];

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Connect with the configured number of attempts, then make sure the schema exists
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        let attempts = settings.connect_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match Self::try_connect(settings).await {
                Ok(graph) => {
                    app_log!(info, "Connected to Neo4j at {} (attempt {})", settings.uri, attempt);
                    let store = Self { graph };
                    store.init_schema().await;
                    return Ok(store);
                }
                Err(e) => {
                    app_log!(
                        warn,
                        "Neo4j connection attempt {}/{} failed: {}",
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_secs(settings.retry_delay_secs)).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow::anyhow!("no connection attempt made"))
            .context(format!("Failed to connect to Neo4j at {}", settings.uri)))
    }

    async fn try_connect(settings: &DatabaseSettings) -> Result<Graph> {
        let graph = Graph::new(&settings.uri, &settings.user, &settings.password)
            .await
            .context("Failed to open Neo4j connection pool")?;
        graph
            .run(query("RETURN 1"))
            .await
            .context("Neo4j did not answer the probe query")?;
        Ok(graph)
    }

    async fn init_schema(&self) {
        for statement in SCHEMA_STATEMENTS {
            if let Err(e) = self.graph.run(query(statement)).await {
                app_log!(warn, "Schema statement skipped ({}): {}", statement, e);
            }
        }
    }

    // ===== Transactions =====

    async fn finish<T>(txn: Txn, outcome: Result<T, StoreError>) -> Result<T, StoreError> {
        match outcome {
            Ok(value) => {
                txn.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_error) = txn.rollback().await {
                    app_log!(error, "Rollback failed after '{}': {}", e, rollback_error);
                }
                Err(e)
            }
        }
    }

    async fn apply_plan(txn: &mut Txn, plan: &WritePlan) -> Result<(), StoreError> {
        for (index, op) in plan.ops.iter().enumerate() {
            Self::apply_op(txn, plan.root, &plan.root_id, op)
                .await
                .map_err(|e| {
                    app_log!(
                        warn,
                        "Op {} failed for {} '{}': {}",
                        index,
                        plan.root.label(),
                        plan.root_id,
                        e
                    );
                    e
                })?;
        }
        Ok(())
    }

    async fn apply_op(
        txn: &mut Txn,
        root: RootKind,
        root_id: &str,
        op: &GraphOp,
    ) -> Result<(), StoreError> {
        match op {
            GraphOp::CreateRoot(props) => {
                let cypher = format!(
                    "CREATE (r:{} {{id: $id, created_at: $created_at, updated_at: $updated_at, theme: $theme}})",
                    root.label()
                );
                txn.run(
                    query(&cypher)
                        .param("id", props.id.clone())
                        .param("created_at", props.created_at.clone())
                        .param("updated_at", props.updated_at.clone())
                        .param("theme", props.theme.as_str()),
                )
                .await?;
            }
            GraphOp::TouchRoot { updated_at, theme } => {
                let cypher = format!(
                    "MATCH (r:{} {{id: $id}}) SET r.updated_at = $updated_at, r.theme = $theme RETURN count(r) AS n",
                    root.label()
                );
                let q = query(&cypher)
                    .param("id", root_id)
                    .param("updated_at", updated_at.clone())
                    .param("theme", theme.as_str());
                if fetch_count(txn, q).await? == 0 {
                    return Err(StoreError::not_found(root, root_id));
                }
            }
            GraphOp::DeleteChildren(kind) => {
                let cypher = format!(
                    "MATCH (n:{})-[:{}]->(:{} {{id: $id}}) DETACH DELETE n",
                    kind.label(),
                    root.belongs_rel(),
                    root.label()
                );
                txn.run(query(&cypher).param("id", root_id)).await?;
            }
            GraphOp::CreateChild(row) => {
                let (cypher, q) = create_child_query(root, root_id, row);
                let created = fetch_count(txn, q).await?;
                if created != 1 {
                    return Err(StoreError::Backend(format!(
                        "creating {} matched {} owners: {}",
                        row.kind.label(),
                        created,
                        cypher
                    )));
                }
            }
            GraphOp::DeleteRoot => {
                let cypher = format!("MATCH (r:{} {{id: $id}}) DETACH DELETE r", root.label());
                txn.run(query(&cypher).param("id", root_id)).await?;
            }
            GraphOp::VerifyRoot { updated_at } => {
                let cypher = format!(
                    "MATCH (r:{} {{id: $id, updated_at: $updated_at}}) RETURN count(r) AS n",
                    root.label()
                );
                let q = query(&cypher)
                    .param("id", root_id)
                    .param("updated_at", updated_at.clone());
                if fetch_count(txn, q).await? != 1 {
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

    /// Newest `updated_at` of a root kind, read inside the transaction
    async fn newest_version(txn: &mut Txn, root: RootKind) -> Result<Option<String>, StoreError> {
        let cypher = format!(
            "MATCH (r:{}) RETURN coalesce(max(r.updated_at), '') AS newest",
            root.label()
        );
        let row = fetch_first(txn, query(&cypher)).await?;
        let newest = match row {
            Some(row) => row.get::<String>("newest")?,
            None => String::new(),
        };
        Ok((!newest.is_empty()).then_some(newest))
    }

    /// Take the root's write lock and return its current version
    async fn lock_root(txn: &mut Txn, root: RootKind, id: &str) -> Result<String, StoreError> {
        let cypher = format!(
            "MATCH (r:{} {{id: $id}}) SET r._lock = true REMOVE r._lock RETURN r.updated_at AS current",
            root.label()
        );
        match fetch_first(txn, query(&cypher).param("id", id)).await? {
            Some(row) => Ok(row.get::<String>("current")?),
            None => Err(StoreError::not_found(root, id)),
        }
    }

    async fn replace_in(
        txn: &mut Txn,
        root: RootKind,
        id: &str,
        data: &CvData,
        expected_version: Option<&str>,
    ) -> Result<(), StoreError> {
        let current = Self::lock_root(txn, root, id).await?;

        if let Some(expected) = expected_version {
            if expected != current {
                return Err(StoreError::VersionConflict {
                    expected: expected.to_string(),
                    actual: current,
                });
            }
        }

        let newest = Self::newest_version(txn, root).await?.unwrap_or(current);
        let version = next_version(Some(&newest), Utc::now());
        let plan = WritePlan::replace(&OwnedSubgraph::standard(root), id, &version, data);
        Self::apply_plan(txn, &plan).await
    }

    // ===== Reads =====

    async fn fetch_rows(&self, q: Query) -> Result<Vec<Row>, StoreError> {
        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn children_of(
        &self,
        root: RootKind,
        id: &str,
        kind: ChildKind,
    ) -> Result<Vec<StoredNode>, StoreError> {
        let order = match kind {
            ChildKind::Project => "n.parent_position, n.position",
            _ => "n.position",
        };
        let cypher = format!(
            "MATCH (n:{})-[:{}]->(:{} {{id: $id}}) RETURN n ORDER BY {}",
            kind.label(),
            root.belongs_rel(),
            root.label(),
            order
        );

        self.fetch_rows(query(&cypher).param("id", id))
            .await?
            .into_iter()
            .map(|row| -> Result<StoredNode, StoreError> {
                Ok(StoredNode(row.get::<neo4rs::Node>("n")?))
            })
            .collect()
    }

    async fn load_record(&self, root: RootKind, props: RootProps) -> Result<Record, StoreError> {
        let id = props.id.as_str();
        let mut nodes = ChildNodes {
            person: None,
            experiences: self.children_of(root, id, ChildKind::Experience).await?,
            projects: self.children_of(root, id, ChildKind::Project).await?,
            education: self.children_of(root, id, ChildKind::Education).await?,
            skills: self.children_of(root, id, ChildKind::Skill).await?,
        };
        nodes.person = self
            .children_of(root, id, ChildKind::Person)
            .await?
            .into_iter()
            .next();

        Ok(Record {
            data: assemble(&nodes, props.theme),
            id: props.id,
            created_at: props.created_at,
            updated_at: props.updated_at,
        })
    }

    async fn find_root(&self, q: Query) -> Result<Option<RootProps>, StoreError> {
        match self.fetch_rows(q).await?.into_iter().next() {
            Some(row) => Ok(Some(root_props(&row.get::<neo4rs::Node>("r")?)?)),
            None => Ok(None),
        }
    }
}

#[rocket::async_trait]
impl CvStore for Neo4jStore {
    async fn create(&self, root: RootKind, data: &CvData) -> Result<Record, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut txn = self.graph.start_txn().await?;

        let outcome: Result<(), StoreError> = async {
            let previous = Self::newest_version(&mut txn, root).await?;
            let version = next_version(previous.as_deref(), Utc::now());
            let props = RootProps::new(id.clone(), version, data.theme);
            let plan = WritePlan::create(&OwnedSubgraph::standard(root), props, data);
            Self::apply_plan(&mut txn, &plan).await
        }
        .await;
        Self::finish(txn, outcome).await?;

        app_log!(info, "Created {} '{}'", root.label(), id);
        self.get(root, &id).await
    }

    async fn get(&self, root: RootKind, id: &str) -> Result<Record, StoreError> {
        let cypher = format!("MATCH (r:{} {{id: $id}}) RETURN r", root.label());
        let props = self
            .find_root(query(&cypher).param("id", id))
            .await?
            .ok_or_else(|| StoreError::not_found(root, id))?;
        self.load_record(root, props).await
    }

    async fn latest(&self, root: RootKind) -> Result<Record, StoreError> {
        let cypher = format!(
            "MATCH (r:{}) RETURN r ORDER BY r.updated_at DESC LIMIT 1",
            root.label()
        );
        let props = self
            .find_root(query(&cypher))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("no {} stored", root.label())))?;
        self.load_record(root, props).await
    }

    async fn find_by_version(&self, root: RootKind, version: &str) -> Result<Record, StoreError> {
        let cypher = format!(
            "MATCH (r:{} {{updated_at: $updated_at}}) RETURN r LIMIT 1",
            root.label()
        );
        let props = self
            .find_root(query(&cypher).param("updated_at", version))
            .await?
            .ok_or_else(|| StoreError::not_found(root, version))?;
        self.load_record(root, props).await
    }

    async fn list(&self, root: RootKind) -> Result<Vec<RecordSummary>, StoreError> {
        let cypher = format!(
            "MATCH (r:{root}) \
             OPTIONAL MATCH (p:Person)-[:{rel}]->(r) \
             RETURN r.id AS id, r.updated_at AS updated_at, \
                    coalesce(p.name, '') AS name, coalesce(p.title, '') AS title \
             ORDER BY r.updated_at DESC",
            root = root.label(),
            rel = root.belongs_rel()
        );

        self.fetch_rows(query(&cypher))
            .await?
            .into_iter()
            .map(|row| -> Result<RecordSummary, StoreError> {
                let title = row.get::<String>("title")?;
                Ok(RecordSummary {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    title: (!title.is_empty()).then_some(title),
                    updated_at: row.get("updated_at")?,
                })
            })
            .collect()
    }

    async fn replace(
        &self,
        root: RootKind,
        id: &str,
        data: &CvData,
        expected_version: Option<&str>,
    ) -> Result<Record, StoreError> {
        let mut txn = self.graph.start_txn().await?;
        let outcome = Self::replace_in(&mut txn, root, id, data, expected_version).await;
        Self::finish(txn, outcome).await?;

        app_log!(info, "Replaced owned subgraph of {} '{}'", root.label(), id);
        self.get(root, id).await
    }

    async fn delete(&self, root: RootKind, id: &str) -> Result<bool, StoreError> {
        let mut txn = self.graph.start_txn().await?;

        let outcome: Result<bool, StoreError> = async {
            match Self::lock_root(&mut txn, root, id).await {
                Ok(_) => {}
                Err(StoreError::NotFound(_)) => return Ok(false),
                Err(e) => return Err(e),
            }
            let plan = WritePlan::delete(&OwnedSubgraph::standard(root), id);
            Self::apply_plan(&mut txn, &plan).await?;
            Ok(true)
        }
        .await;

        let deleted = Self::finish(txn, outcome).await?;
        if deleted {
            app_log!(info, "Deleted {} '{}' and its owned nodes", root.label(), id);
        }
        Ok(deleted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.fetch_rows(query("RETURN 1 AS ok")).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "neo4j"
    }
}

// ===== Row helpers =====

async fn fetch_first(txn: &mut Txn, q: Query) -> Result<Option<Row>, StoreError> {
    let mut stream = txn.execute(q).await?;
    let mut first = None;
    while let Some(row) = stream.next(txn.handle()).await? {
        if first.is_none() {
            first = Some(row);
        }
    }
    Ok(first)
}

async fn fetch_count(txn: &mut Txn, q: Query) -> Result<i64, StoreError> {
    match fetch_first(txn, q).await? {
        Some(row) => Ok(row.get::<i64>("n")?),
        None => Ok(0),
    }
}

fn bolt(value: &PropValue) -> BoltType {
    match value {
        PropValue::Text(text) => BoltType::from(text.clone()),
        PropValue::Int(number) => BoltType::from(*number),
        PropValue::Bool(flag) => BoltType::from(*flag),
        PropValue::TextList(items) => BoltType::from(items.clone()),
    }
}

fn node_props(row: &NodeRow) -> BoltType {
    let mut map = BoltMap::new();
    map.put(BoltString::from("position"), BoltType::from(row.position));
    if let Some(parent_position) = row.parent_position {
        map.put(
            BoltString::from("parent_position"),
            BoltType::from(parent_position),
        );
    }
    for (key, value) in &row.props {
        map.put(BoltString::from(*key), bolt(value));
    }
    BoltType::Map(map)
}

fn create_child_query(root: RootKind, root_id: &str, row: &NodeRow) -> (String, Query) {
    let cypher = match row.kind.parent() {
        Some(parent) => format!(
            "MATCH (r:{root} {{id: $id}})<-[:{belongs}]-(owner:{parent} {{position: $parent_position}}) \
             CREATE (n:{label}) SET n = $props \
             CREATE (owner)-[:{link}]->(n) \
             CREATE (n)-[:{belongs}]->(r) \
             RETURN count(n) AS n",
            root = root.label(),
            belongs = root.belongs_rel(),
            parent = parent.label(),
            label = row.kind.label(),
            link = row.kind.link_rel(),
        ),
        None => format!(
            "MATCH (r:{root} {{id: $id}}) \
             CREATE (n:{label}) SET n = $props \
             CREATE (r)-[:{link}]->(n) \
             CREATE (n)-[:{belongs}]->(r) \
             RETURN count(n) AS n",
            root = root.label(),
            belongs = root.belongs_rel(),
            label = row.kind.label(),
            link = row.kind.link_rel(),
        ),
    };

    let q = query(&cypher)
        .param("id", root_id)
        .param("parent_position", row.parent_position.unwrap_or(-1))
        .param("props", node_props(row));
    (cypher, q)
}

fn root_props(node: &neo4rs::Node) -> Result<RootProps, StoreError> {
    let theme = node
        .get::<String>("theme")
        .ok()
        .and_then(|value| Theme::parse(&value))
        .unwrap_or_default();

    Ok(RootProps {
        id: node.get("id")?,
        created_at: node.get("created_at")?,
        updated_at: node.get("updated_at")?,
        theme,
    })
}

/// Database node read through the same accessors as in-memory rows
pub struct StoredNode(neo4rs::Node);

impl PropReader for StoredNode {
    fn text(&self, key: &str) -> Option<String> {
        self.0.get::<String>(key).ok()
    }

    fn int(&self, key: &str) -> Option<i64> {
        self.0.get::<i64>(key).ok()
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get::<bool>(key).ok()
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.0.get::<Vec<String>>(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::nodes::rows_for;
    use crate::types::{Experience, PersonalInfo, Project};

    #[test]
    fn project_rows_match_their_owner_by_position() {
        let data = CvData {
            personal_info: PersonalInfo {
                name: "Jane".to_string(),
                ..PersonalInfo::default()
            },
            experience: vec![Experience {
                title: "Dev".to_string(),
                company: "Acme".to_string(),
                projects: vec![Project {
                    name: "Billing".to_string(),
                    ..Project::default()
                }],
                ..Experience::default()
            }],
            ..CvData::default()
        };

        let rows = rows_for(&data);
        let project = rows
            .iter()
            .find(|row| row.kind == ChildKind::Project)
            .unwrap();
        let (cypher, _) = create_child_query(RootKind::Profile, "p1", project);

        assert!(cypher.contains("(owner:Experience {position: $parent_position})"));
        assert!(cypher.contains("CREATE (owner)-[:HAS_PROJECT]->(n)"));
        assert!(cypher.contains("CREATE (n)-[:BELONGS_TO_PROFILE]->(r)"));

        let person = &rows[0];
        let (cypher, _) = create_child_query(RootKind::Cv, "c1", person);
        assert!(cypher.starts_with("MATCH (r:CV {id: $id})"));
        assert!(cypher.contains("CREATE (r)-[:HAS_PERSON]->(n)"));
    }
    #[test]
    fn profile_timestamps_are_unique_in_the_schema() {
        let drop = SCHEMA_STATEMENTS
            .iter()
            .position(|s| s.starts_with("DROP INDEX profile_updated_at"))
            .unwrap();
        let unique = SCHEMA_STATEMENTS
            .iter()
            .position(|s| s.contains("FOR (r:Profile) REQUIRE r.updated_at IS UNIQUE"))
            .unwrap();
        assert!(drop < unique);
        assert!(!SCHEMA_STATEMENTS
            .iter()
            .any(|s| s.starts_with("CREATE INDEX profile_updated_at")));
    }

    fn live_settings() -> Option<DatabaseSettings> {
        let uri = std::env::var("NEO4J_URI").ok()?;
        Some(DatabaseSettings {
            backend: crate::core::config_manager::StoreBackend::Neo4j,
            uri,
            user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "neo4j".to_string()),
            connect_attempts: 1,
            retry_delay_secs: 0,
        })
    }

    // Needs a running server: NEO4J_URI=bolt://localhost:7687 cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn live_create_replace_delete_round_trip() {
        let Some(settings) = live_settings() else {
            return;
        };
        let store = Neo4jStore::connect(&settings).await.unwrap();

        let original = CvData {
            personal_info: PersonalInfo {
                name: "Jane Doe".to_string(),
                ..PersonalInfo::default()
            },
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                projects: vec![Project {
                    name: "Ledger".to_string(),
                    ..Project::default()
                }],
                ..Experience::default()
            }],
            ..CvData::default()
        };
        let created = store.create(RootKind::Cv, &original).await.unwrap();
        assert_eq!(store.get(RootKind::Cv, &created.id).await.unwrap().data, original);

        let replacement = CvData {
            personal_info: PersonalInfo {
                name: "Jane Q. Doe".to_string(),
                ..PersonalInfo::default()
            },
            ..CvData::default()
        };
        let stale = created.updated_at.clone();
        let replaced = store
            .replace(RootKind::Cv, &created.id, &replacement, Some(&stale))
            .await
            .unwrap();
        assert_eq!(replaced.id, created.id);
        assert!(replaced.updated_at > stale);
        assert_eq!(store.get(RootKind::Cv, &created.id).await.unwrap().data, replacement);

        assert!(matches!(
            store
                .replace(RootKind::Cv, &created.id, &original, Some(&stale))
                .await,
            Err(StoreError::VersionConflict { .. })
        ));

        assert!(store.delete(RootKind::Cv, &created.id).await.unwrap());
        assert!(matches!(
            store.get(RootKind::Cv, &created.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.delete(RootKind::Cv, &created.id).await.unwrap());
    }
}
