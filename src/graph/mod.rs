// src/graph/mod.rs
//! Graph persistence for CVs and profiles

pub mod memory;
pub mod neo4j;
pub mod nodes;
pub mod store;
pub mod subgraph;

pub use memory::MemoryStore;
pub use neo4j::Neo4jStore;
pub use store::{CvStore, SharedStore, StoreError};
pub use subgraph::{ChildKind, GraphOp, OwnedSubgraph, RootKind, WritePlan};

use std::sync::Arc;

use anyhow::Result;

use crate::app_log;
use crate::core::config_manager::{DatabaseSettings, StoreBackend};

/// Build the configured store once at startup
pub async fn open_store(settings: &DatabaseSettings) -> Result<SharedStore> {
    match settings.backend {
        StoreBackend::Neo4j => {
            let store = Neo4jStore::connect(settings).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            app_log!(warn, "Using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
