//! Whole-document persistence for users and groups.
//!
//! # Module Structure
//!
//! - `types` - The [`Dataset`] document and its [`User`] / [`Group`] records
//! - `memory` - In-process [`MemoryStore`]
//! - `json_file` - [`JsonFileStore`] backed by a single JSON document on disk
//!
//! Stores have no concurrency control of their own. Writers go through
//! [`DatasetRepository`](crate::services::DatasetRepository), which serializes
//! read-modify-write sequences.

use async_trait::async_trait;
use thiserror::Error;

pub mod json_file;
pub mod memory;
pub mod types;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use types::{Dataset, Group, User};

/// Errors that can occur while loading or saving the dataset.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The document could not be encoded or decoded.
    #[error("Malformed dataset document: {0}")]
    Serde(#[from] serde_json::Error),

    /// The document decoded but violates a dataset invariant.
    #[error("Dataset violates invariant: {0}")]
    Invalid(String),
}

/// Convenient Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for loading and saving the full dataset.
///
/// Both operations are whole-document: there is no partial update.
#[async_trait]
pub trait Store: Send + Sync {
    /// Loads the current dataset.
    async fn read(&self) -> StoreResult<Dataset>;

    /// Replaces the stored dataset.
    async fn write(&self, dataset: &Dataset) -> StoreResult<()>;
}
