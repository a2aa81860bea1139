// src/lib.rs
//! CV builder backend: graph persistence, document rendering and the REST API.

pub mod ai;
pub mod cli;
pub mod core;
pub mod documents;
pub mod environment;
pub mod graph;
pub mod richtext;
pub mod types;
pub mod utils;
pub mod validation;
pub mod web;

pub use web::{build_rocket, start_web_server};

/// Log through `tracing` with the level as the first token: `app_log!(info, "...")`.
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}

/// Open an info-level span: `app_span!("name", field = %value)`.
#[macro_export]
macro_rules! app_span {
    ($name:expr) => {
        ::tracing::info_span!($name)
    };
    ($name:expr, $($fields:tt)+) => {
        ::tracing::info_span!($name, $($fields)+)
    };
}
