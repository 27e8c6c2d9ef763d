//! # Filesystem-backed key-value store
//!
//! [`FileKv`] is a [`KeyValueStore`] that keeps one file per key under a base
//! directory. It is used on desktop and mobile to keep the session and
//! preferences across app restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! ├── session          # JSON-encoded Session
//! ├── theme            # "light" | "dark"
//! └── API_BASE_URL     # optional override
//! ```
//!
//! ## Platform data directories
//!
//! The UI crate places the base under [`dirs::data_dir()`]`/recipes`:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS / iOS | `~/Library/Application Support/recipes/` |
//! | Linux | `~/.local/share/recipes/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\recipes\` |
//!
//! I/O errors are logged and otherwise ignored: a read failure reads as "not
//! stored", a write failure leaves the previous value.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::kv::KeyValueStore;

#[derive(Clone, Debug)]
pub struct FileKv {
    base: PathBuf,
}

impl FileKv {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Keys map to file names; anything outside `[A-Za-z0-9_.-]` becomes `_`.
    fn key_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base.join(name)
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.key_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.base) {
            warn!("could not create {}: {e}", self.base.display());
            return;
        }
        if let Err(e) = std::fs::write(self.key_path(key), value) {
            warn!(key, "could not persist value: {e}");
        }
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.key_path(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::models::User;

    #[test]
    fn test_file_kv_roundtrip() {
        let dir = std::env::temp_dir().join(format!("recipes_kv_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let kv = FileKv::new(dir.clone());
        assert!(kv.get("theme").is_none());
        kv.set("theme", "dark");
        kv.set("../escape", "x");
        assert_eq!(FileKv::new(dir.clone()).get("theme").as_deref(), Some("dark"));
        assert!(dir.join(".._escape").exists());

        kv.remove("theme");
        assert!(kv.get("theme").is_none());

        // Sessions survive re-opening the directory.
        let user = User {
            id: 1,
            username: "a".into(),
            email: "a@example.com".into(),
        };
        SessionStore::load(FileKv::new(dir.clone())).sign_in(user.clone(), "t");
        assert_eq!(SessionStore::load(FileKv::new(dir.clone())).user(), Some(user));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
