//! Serialized read-modify-write access to the dataset.
//!
//! Stores are whole-document and unsynchronized. Two requests that each read
//! the dataset, change it and write it back would otherwise lose one of the
//! updates. [`DatasetRepository::mutate`] holds an async mutex across the
//! whole read → change → write sequence so writers run one at a time.
//! Readers do not take the lock.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{TandemError, TandemResult};
use crate::store::{Dataset, Store};

/// Result of a mutation closure: the value to return, and whether the
/// dataset changed and must be written back.
#[derive(Debug)]
pub struct Mutation<T> {
    value: T,
    persist: bool,
}

impl<T> Mutation<T> {
    /// The dataset was changed; write it back.
    pub fn changed(value: T) -> Self {
        Self {
            value,
            persist: true,
        }
    }

    /// Nothing changed; skip the write.
    pub fn unchanged(value: T) -> Self {
        Self {
            value,
            persist: false,
        }
    }
}

/// Single-writer gateway to a [`Store`].
pub struct DatasetRepository {
    store: Arc<dyn Store>,
    write_lock: Mutex<()>,
}

impl DatasetRepository {
    /// Creates a repository over `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Reads the current dataset.
    pub async fn snapshot(&self) -> TandemResult<Dataset> {
        Ok(self.store.read().await?)
    }

    /// Runs `f` against the current dataset inside the write critical section.
    ///
    /// If `f` returns [`Mutation::changed`], the dataset is validated and
    /// written back before the lock is released. An error from `f` aborts
    /// without writing.
    pub async fn mutate<T, F>(&self, f: F) -> TandemResult<T>
    where
        F: FnOnce(&mut Dataset) -> TandemResult<Mutation<T>> + Send,
        T: Send,
    {
        let _guard = self.write_lock.lock().await;

        let mut dataset = self.store.read().await?;
        let mutation = f(&mut dataset)?;

        if mutation.persist {
            dataset.validate().map_err(|e| {
                log::error!("[Repository] Refusing to write invalid dataset: {}", e);
                TandemError::Persistence(format!("refusing to write invalid dataset: {}", e))
            })?;
            self.store.write(&dataset).await?;
        }

        Ok(mutation.value)
    }
}
