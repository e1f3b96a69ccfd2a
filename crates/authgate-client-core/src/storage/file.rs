use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use authgate_shared::{const_config::storage::StorageKey, errors::StorageError};

use super::ClientStorage;

/// Keeps every key in a single JSON object on disk. A missing file is the
/// same as empty storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

type Contents = BTreeMap<String, String>;

impl FileStorage {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> anyhow::Result<Contents> {
        if !self.path.exists() {
            return Ok(Contents::default());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {:?}", self.path))?;
        if text.trim().is_empty() {
            return Ok(Contents::default());
        }
        serde_json::from_str(&text).with_context(|| format!("{:?} is not a JSON object", self.path))
    }

    fn save(&self, contents: &Contents) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create folder {parent:?}"))?;
        }
        let text = serde_json::to_string_pretty(contents).context("failed to serialize")?;
        fs::write(&self.path, text).with_context(|| format!("failed to write {:?}", self.path))
    }

    fn modify<F>(&mut self, key: StorageKey, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Contents),
    {
        let to_write_err = |source| StorageError::Write {
            key: key.as_str(),
            source,
        };
        let mut contents = self.load().map_err(to_write_err)?;
        f(&mut contents);
        self.save(&contents).map_err(to_write_err)
    }
}

impl ClientStorage for FileStorage {
    #[tracing::instrument(level = "trace")]
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        let contents = self.load().map_err(|source| StorageError::Read {
            key: key.as_str(),
            source,
        })?;
        Ok(contents.get(key.as_str()).cloned())
    }

    #[tracing::instrument(level = "trace", skip(value))]
    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.modify(key, |contents| {
            contents.insert(key.as_str().to_string(), value.to_string());
        })
    }

    #[tracing::instrument(level = "trace")]
    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.modify(key, |contents| {
            contents.remove(key.as_str());
        })
    }
}
