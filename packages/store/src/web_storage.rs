//! Browser `localStorage` as a [`KeyValueStore`].
//!
//! Storage can be unavailable (private browsing, disabled cookies); every
//! operation then degrades to a no-op.

use tracing::warn;
use web_sys::Storage;

use crate::kv::KeyValueStore;

#[derive(Clone, Debug, Default)]
pub struct LocalStorageKv;

impl LocalStorageKv {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Option<Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl KeyValueStore for LocalStorageKv {
    fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = self.storage() {
            if storage.set_item(key, value).is_err() {
                warn!(key, "localStorage write failed");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = self.storage() {
            let _ = storage.remove_item(key);
        }
    }
}
