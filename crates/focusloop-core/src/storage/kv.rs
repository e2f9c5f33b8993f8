//! Flat string key/value backends.
//!
//! The session store encodes every field as text and hands it to one of
//! these. `Database` persists to SQLite; `MemoryKv` lives for the process
//! lifetime only and backs tests and the degraded no-disk mode.

use std::collections::HashMap;

use crate::error::StoreError;

/// A durable (or not) map of string keys to string values.
pub trait KvBackend {
    /// Get a value, `Ok(None)` if the key was never set or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Apply several writes as one unit: `Some` sets, `None` removes.
    /// Either every write lands or none does.
    fn set_many(&mut self, writes: &[(&str, Option<&str>)]) -> Result<(), StoreError>;
}

/// In-process backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    entries: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvBackend for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn set_many(&mut self, writes: &[(&str, Option<&str>)]) -> Result<(), StoreError> {
        for (key, value) in writes {
            match value {
                Some(v) => self.entries.insert(key.to_string(), v.to_string()),
                None => self.entries.remove(*key),
            };
        }
        Ok(())
    }
}

impl<B: KvBackend + ?Sized> KvBackend for Box<B> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn set_many(&mut self, writes: &[(&str, Option<&str>)]) -> Result<(), StoreError> {
        (**self).set_many(writes)
    }
}
