//! Dataset store backed by a single JSON document on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Dataset, Store, StoreError, StoreResult};

/// Reads and writes the whole dataset as one JSON file.
///
/// A missing file reads as an empty dataset. Writes go to a sibling
/// temporary file first and are then renamed over the target, so a crash
/// mid-write never leaves a truncated document behind.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store for the document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn read(&self) -> StoreResult<Dataset> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!(
                    "[JsonFileStore] {} not found, starting with an empty dataset",
                    self.path.display()
                );
                return Ok(Dataset::default());
            }
            Err(e) => return Err(e.into()),
        };

        let dataset: Dataset = serde_json::from_str(&content)?;
        dataset.validate().map_err(StoreError::Invalid)?;
        Ok(dataset)
    }

    async fn write(&self, dataset: &Dataset) -> StoreResult<()> {
        let body = serde_json::to_vec_pretty(dataset)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        log::debug!(
            "[JsonFileStore] Wrote {} users, {} groups to {}",
            dataset.users.len(),
            dataset.groups.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Group, User};

    #[tokio::test]
    async fn missing_file_reads_as_empty_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));

        let dataset = store.read().await.unwrap();
        assert_eq!(dataset, Dataset::default());
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("data.json"));
        let dataset = Dataset {
            users: vec![User {
                username: "alice".to_string(),
                password_hash: "00$11".to_string(),
                spotify_token: None,
            }],
            groups: vec![Group::founded_by("jazz", "alice")],
        };

        store.write(&dataset).await.unwrap();
        assert_eq!(store.read().await.unwrap(), dataset);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn reads_document_in_original_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"users":[{"username":"alice","password":"h","spotifyToken":"t"}],
               "groups":[{"name":"jazz","leader":"alice","members":["alice"]}]}"#,
        )
        .unwrap();

        let dataset = JsonFileStore::new(&path).read().await.unwrap();
        assert_eq!(dataset.account_token("alice"), Some("t"));
        assert_eq!(dataset.group_of("alice").unwrap().name, "jazz");
    }

    #[tokio::test]
    async fn rejects_document_violating_invariants() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"{"users":[],"groups":[{"name":"jazz","leader":"bob","members":["alice"]}]}"#,
        )
        .unwrap();

        let err = JsonFileStore::new(&path).read().await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileStore::new(&path).read().await.unwrap_err();
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
