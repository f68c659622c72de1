//! Storage Layer
//!
//! Gesture-to-action mappings behind a small store trait, with a built-in
//! default table. Lookups happen on every gesture pass, so edits take effect
//! on the next frame.

mod mapping;

pub use mapping::{
    default_action, JsonMappingStore, MappingStore, MemoryMappingStore, AVAILABLE_ACTIONS,
    DEFAULT_MAPPINGS, NO_ACTION,
};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Lock error: {0}")]
    Lock(String),
}
