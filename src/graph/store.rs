// src/graph/store.rs
use std::sync::Arc;

use thiserror::Error;

use super::subgraph::RootKind;
use crate::types::{CvData, Record, RecordSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("version conflict: expected {expected}, current is {actual}")]
    VersionConflict { expected: String, actual: String },

    #[error("invalid write plan: {0}")]
    InvalidPlan(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(root: RootKind, key: &str) -> Self {
        StoreError::NotFound(format!("{} '{}'", root.label(), key))
    }
}

impl From<neo4rs::Error> for StoreError {
    fn from(err: neo4rs::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<neo4rs::DeError> for StoreError {
    fn from(err: neo4rs::DeError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Persistence for CV and profile records. Every write runs as one
/// all-or-nothing transaction built from a `WritePlan`.
#[rocket::async_trait]
pub trait CvStore: Send + Sync {
    async fn create(&self, root: RootKind, data: &CvData) -> Result<Record, StoreError>;

    async fn get(&self, root: RootKind, id: &str) -> Result<Record, StoreError>;

    /// Most recently updated record of this kind
    async fn latest(&self, root: RootKind) -> Result<Record, StoreError>;

    /// Record whose `updated_at` equals `version` exactly
    async fn find_by_version(&self, root: RootKind, version: &str) -> Result<Record, StoreError>;

    /// Summaries, newest first
    async fn list(&self, root: RootKind) -> Result<Vec<RecordSummary>, StoreError>;

    /// Replace every owned child of `id`. With `expected_version`, the
    /// current `updated_at` must match or the write aborts with a conflict.
    async fn replace(
        &self,
        root: RootKind,
        id: &str,
        data: &CvData,
        expected_version: Option<&str>,
    ) -> Result<Record, StoreError>;

    /// Cascade delete; `false` when no such root exists
    async fn delete(&self, root: RootKind, id: &str) -> Result<bool, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}

pub type SharedStore = Arc<dyn CvStore>;
