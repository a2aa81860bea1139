// src/core/mod.rs
//! Shared services: configuration, file system, AI provider client, templates

pub mod config_manager;
pub mod fs_ops;
pub mod service_client;
pub mod template_engine;

pub use config_manager::ConfigManager;
pub use fs_ops::FsOps;
pub use service_client::ServiceClient;
pub use template_engine::TemplateEngine;
