//! # Durable key-value storage
//!
//! The client persists a handful of small string values across reloads: the
//! session, the theme preference and an API base URL override. Writes are
//! synchronous and fire-and-forget; a failing backend degrades to "nothing
//! stored" rather than an error.
//!
//! | Implementation | Where |
//! |----------------|-------|
//! | [`MemoryKv`] | tests and fallback |
//! | [`FileKv`](crate::FileKv) | desktop / mobile, one file per key |
//! | `LocalStorageKv` | browser `localStorage` (wasm32 + `web` feature) |

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::lock;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store. Clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryKv {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key currently stored, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.values).keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        lock(&self.values).insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        lock(&self.values).remove(key);
    }
}

impl<K: KeyValueStore> KeyValueStore for &K {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_kv_shared_between_clones() {
        let kv = MemoryKv::new();
        let other = kv.clone();

        kv.set("theme", "dark");
        assert_eq!(other.get("theme").as_deref(), Some("dark"));

        other.remove("theme");
        assert!(kv.get("theme").is_none());
        assert!(kv.keys().is_empty());
    }
}
