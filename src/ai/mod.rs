// src/ai/mod.rs
//! Job-description driven CV drafting and rich-text rewrites

pub mod draft;
pub mod scoring;

pub use draft::{ContentSource, DraftRequest, DraftResult, DraftService, RewriteRequest, RewriteResult};
pub use scoring::{ItemKind, ItemScore};
