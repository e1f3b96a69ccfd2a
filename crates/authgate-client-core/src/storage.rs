//! Client side key value storage that the session is cached in

use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{Arc, Mutex},
};

use authgate_shared::{const_config::storage::StorageKey, errors::StorageError};

#[cfg(not(target_arch = "wasm32"))]
mod file;
#[cfg(target_arch = "wasm32")]
mod local;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use local::LocalStorage;

pub trait ClientStorage: Debug + Send {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError>;
}

impl<T: ClientStorage + ?Sized> ClientStorage for Box<T> {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In process storage. Clones share the same data, which is how a reload is
/// simulated: build a second manager over a clone.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: Arc<Mutex<BTreeMap<StorageKey, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().expect("mutex poisoned").is_empty()
    }
}

impl ClientStorage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>, StorageError> {
        Ok(self.data.lock().expect("mutex poisoned").get(&key).cloned())
    }

    fn set(&mut self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.data
            .lock()
            .expect("mutex poisoned")
            .insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), StorageError> {
        self.data.lock().expect("mutex poisoned").remove(&key);
        Ok(())
    }
}
