use anyhow::anyhow;
use authgate_shared::{const_config::storage::StorageKey, errors::StorageError};

use super::ClientStorage;

/// The browser's `window.localStorage`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window found".into()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage is disabled".into()))
    }
}

impl ClientStorage for LocalStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Self::storage()?
            .get_item(key.as_str())
            .map_err(|e| StorageError::Read {
                key: key.as_str(),
                source: anyhow!("{e:?}"),
            })
    }

    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key.as_str(), value)
            .map_err(|e| StorageError::Write {
                key: key.as_str(),
                source: anyhow!("{e:?}"),
            })
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        Self::storage()?
            .remove_item(key.as_str())
            .map_err(|e| StorageError::Write {
                key: key.as_str(),
                source: anyhow!("{e:?}"),
            })
    }
}
