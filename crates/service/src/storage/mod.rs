//! Storage abstractions for the client core
//!
//! Small file-backed stores for state that must survive a restart (the
//! session keys). Anything bigger lives on the server.

pub mod json_map_store;

pub use json_map_store::JsonMapStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
