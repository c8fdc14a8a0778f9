//! In-process dataset store.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Dataset, Store, StoreResult};

/// Keeps the dataset in memory.
///
/// Reads return a clone, so callers never hold the lock across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
    dataset: RwLock<Dataset>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `dataset`.
    pub fn with_dataset(dataset: Dataset) -> Self {
        Self {
            dataset: RwLock::new(dataset),
        }
    }

    /// Returns a copy of the current dataset without going through the trait.
    pub fn snapshot(&self) -> Dataset {
        self.dataset.read().clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self) -> StoreResult<Dataset> {
        Ok(self.dataset.read().clone())
    }

    async fn write(&self, dataset: &Dataset) -> StoreResult<()> {
        *self.dataset.write() = dataset.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Group;

    #[tokio::test]
    async fn write_then_read_returns_same_dataset() {
        let store = MemoryStore::new();
        let dataset = Dataset {
            users: vec![],
            groups: vec![Group::founded_by("jazz", "alice")],
        };

        store.write(&dataset).await.unwrap();
        assert_eq!(store.read().await.unwrap(), dataset);
        assert_eq!(store.snapshot(), dataset);
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = MemoryStore::new();
        let dataset = store.read().await.unwrap();
        assert!(dataset.users.is_empty());
        assert!(dataset.groups.is_empty());
    }
}
