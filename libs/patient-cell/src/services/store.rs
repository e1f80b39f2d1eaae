//! Persistence for the patient collection.
//!
//! The whole collection is read on every operation and rewritten on every
//! mutation. `PatientStore` is the seam; `JsonFileStore` is what the server
//! runs with and `InMemoryStore` backs tests.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::PatientError;
use crate::models::Collection;

#[async_trait]
pub trait PatientStore: Send + Sync {
    /// Reads the full collection. Fails if the persisted form is missing or
    /// malformed.
    async fn load(&self) -> Result<Collection, PatientError>;

    /// Replaces the persisted collection with `collection`.
    async fn save(&self, collection: &Collection) -> Result<(), PatientError>;
}

/// Stores the collection as one pretty-printed JSON object keyed by ID.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty collection file if none exists yet.
    pub async fn initialize(&self) -> Result<(), PatientError> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| self.storage_error("check", e))?;

        if !exists {
            info!("Creating empty patient store at {}", self.path.display());
            self.save(&Collection::new()).await?;
        }

        Ok(())
    }

    async fn replace_with(&self, temp_path: &Path, contents: &[u8]) -> Result<(), PatientError> {
        let mut file = File::create(temp_path)
            .await
            .map_err(|e| self.storage_error("create temporary file for", e))?;
        file.write_all(contents)
            .await
            .map_err(|e| self.storage_error("write", e))?;
        file.sync_all()
            .await
            .map_err(|e| self.storage_error("sync", e))?;
        drop(file);

        fs::rename(temp_path, &self.path)
            .await
            .map_err(|e| self.storage_error("replace", e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn storage_error(&self, action: &str, error: impl std::fmt::Display) -> PatientError {
        PatientError::Storage(format!(
            "Failed to {} {}: {}",
            action,
            self.path.display(),
            error
        ))
    }
}

#[async_trait]
impl PatientStore for JsonFileStore {
    async fn load(&self) -> Result<Collection, PatientError> {
        let bytes = fs::read(&self.path)
            .await
            .map_err(|e| self.storage_error("read", e))?;

        let collection: Collection = serde_json::from_slice(&bytes)
            .map_err(|e| self.storage_error("parse", e))?;

        debug!("Loaded {} patient records from {}", collection.len(), self.path.display());
        Ok(collection)
    }

    async fn save(&self, collection: &Collection) -> Result<(), PatientError> {
        let serialized = serde_json::to_vec_pretty(collection)
            .map_err(|e| self.storage_error("serialize", e))?;

        // Write a sibling file first, then rename it over the target.
        let temp_path = self.temp_path();
        if let Err(e) = self.replace_with(&temp_path, &serialized).await {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                debug!("Could not remove {}: {}", temp_path.display(), cleanup);
            }
            return Err(e);
        }

        debug!("Saved {} patient records to {}", collection.len(), self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    collection: RwLock<Collection>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(collection: Collection) -> Self {
        Self {
            collection: RwLock::new(collection),
        }
    }
}

#[async_trait]
impl PatientStore for InMemoryStore {
    async fn load(&self) -> Result<Collection, PatientError> {
        Ok(self.collection.read().await.clone())
    }

    async fn save(&self, collection: &Collection) -> Result<(), PatientError> {
        *self.collection.write().await = collection.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordFields;
    use crate::services::validation::validate_record;
    use assert_matches::assert_matches;

    fn fields(name: &str) -> RecordFields {
        RecordFields {
            name: name.to_string(),
            city: "New York".to_string(),
            age: 30,
            gender: "Male".to_string(),
            height: 1.75,
            weight: 70.2,
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("patients.json"));
        assert_matches!(store.load().await, Err(PatientError::Storage(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::new(&path);
        assert_matches!(store.load().await, Err(PatientError::Storage(_)));
    }

    #[tokio::test]
    async fn test_initialize_creates_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("patients.json"));

        store.initialize().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("patients.json"));

        let mut collection = Collection::new();
        collection.insert("P001".into(), validate_record(fields("A")).unwrap()).unwrap();
        store.save(&collection).await.unwrap();

        store.initialize().await.unwrap();
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("patients.json"));

        let mut collection = Collection::new();
        collection.insert("P002".into(), validate_record(fields("B")).unwrap()).unwrap();
        collection.insert("P001".into(), validate_record(fields("A")).unwrap()).unwrap();
        store.save(&collection).await.unwrap();

        assert_eq!(store.load().await.unwrap(), collection);
        assert!(!store.temp_path().exists());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["P001"]["bmi"], 22.92);
        assert_eq!(raw["P001"]["verdict"], "Normal weight");
    }

    #[tokio::test]
    async fn test_failed_save_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the final rename fail.
        let path = dir.path().join("patients.json");
        std::fs::create_dir(&path).unwrap();
        let store = JsonFileStore::new(&path);

        let mut collection = Collection::new();
        collection.insert("P001".into(), validate_record(fields("A")).unwrap()).unwrap();

        assert_matches!(store.save(&collection).await, Err(PatientError::Storage(_)));
        assert!(!store.temp_path().exists());
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_repeated_id_in_file_keeps_last_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.json");
        std::fs::write(
            &path,
            r#"{
                "P001": {"name": "First", "city": "Pune", "age": 30, "gender": "male", "height": 1.75, "weight": 70.2},
                "P002": {"name": "Other", "city": "Pune", "age": 40, "gender": "female", "height": 1.6, "weight": 55.0},
                "P001": {"name": "Second", "city": "Delhi", "age": 31, "gender": "male", "height": 1.75, "weight": 72.0}
            }"#,
        )
        .unwrap();

        let collection = JsonFileStore::new(&path).load().await.unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get("P001").unwrap().name(), "Second");

        let ids: Vec<&str> = collection.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["P001", "P002"]);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryStore::new();
        assert!(store.load().await.unwrap().is_empty());

        let mut collection = Collection::new();
        collection.insert("P001".into(), validate_record(fields("A")).unwrap()).unwrap();
        store.save(&collection).await.unwrap();
        assert_eq!(store.load().await.unwrap(), collection);
    }
}
