//! # Identity Store
//!
//! The signed-in user and bearer token, persisted as one [`Session`] value under
//! the `session` key so that signing in or out is a single write.
//!
//! Older builds stored the user object under `user` and the token under `jwt`
//! or `token`. [`SessionStore::load`] folds those into the new key once and
//! removes them.
//!
//! Two preferences live alongside the session under their own keys: the
//! colour [`Theme`] (`theme`) and an API base URL override (`API_BASE_URL`).

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::kv::KeyValueStore;
use crate::lock;
use crate::models::{User, UserId};

pub const SESSION_KEY: &str = "session";
pub const THEME_KEY: &str = "theme";
pub const BASE_URL_KEY: &str = "API_BASE_URL";

const LEGACY_USER_KEY: &str = "user";
const LEGACY_TOKEN_KEYS: [&str; 2] = ["jwt", "token"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum Session {
    #[default]
    SignedOut,
    SignedIn { user: User, token: String },
}

impl Session {
    pub fn user(&self) -> Option<&User> {
        match self {
            Session::SignedOut => None,
            Session::SignedIn { user, .. } => Some(user),
        }
    }

    /// The bearer token, if signed in with a non-empty one.
    pub fn token(&self) -> Option<&str> {
        match self {
            Session::SignedIn { token, .. } if !token.is_empty() => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Session::SignedIn { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Theme> {
        match s.trim() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Owner of the persisted [`Session`]. Clones share the in-memory copy.
#[derive(Clone)]
pub struct SessionStore<K: KeyValueStore> {
    kv: K,
    session: Arc<Mutex<Session>>,
}

impl<K: KeyValueStore> SessionStore<K> {
    /// Read the persisted session, migrating legacy keys if needed.
    pub fn load(kv: K) -> Self {
        let session = match kv.get(SESSION_KEY) {
            Some(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("discarding unreadable session: {e}");
                kv.remove(SESSION_KEY);
                Session::SignedOut
            }),
            None => migrate_from_legacy_if_needed(&kv),
        };
        debug!(signed_in = session.is_signed_in(), "session loaded");
        Self {
            kv,
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub fn session(&self) -> Session {
        lock(&self.session).clone()
    }

    pub fn user(&self) -> Option<User> {
        lock(&self.session).user().cloned()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        lock(&self.session).user().map(|u| u.id)
    }

    pub fn bearer_token(&self) -> Option<String> {
        lock(&self.session).token().map(str::to_string)
    }

    pub fn is_signed_in(&self) -> bool {
        lock(&self.session).is_signed_in()
    }

    pub fn sign_in(&self, user: User, token: impl Into<String>) {
        let session = Session::SignedIn {
            user,
            token: token.into(),
        };
        self.persist(&session);
        *lock(&self.session) = session;
    }

    pub fn sign_out(&self) {
        self.kv.remove(SESSION_KEY);
        *lock(&self.session) = Session::SignedOut;
        info!("signed out");
    }

    fn persist(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(json) => self.kv.set(SESSION_KEY, &json),
            Err(e) => warn!("failed to serialise session: {e}"),
        }
    }

    pub fn theme(&self) -> Theme {
        self.kv
            .get(THEME_KEY)
            .and_then(|t| Theme::parse(&t))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.kv.set(THEME_KEY, theme.as_str());
    }

    pub fn api_base_url(&self) -> Option<String> {
        self.kv
            .get(BASE_URL_KEY)
            .filter(|url| !url.trim().is_empty())
    }

    /// Set or, with `None`, clear the API base URL override.
    pub fn set_api_base_url(&self, url: Option<&str>) {
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => self.kv.set(BASE_URL_KEY, url),
            None => self.kv.remove(BASE_URL_KEY),
        }
    }
}

/// Fold the legacy `user` + `jwt`/`token` pair into a single `session` value.
fn migrate_from_legacy_if_needed<K: KeyValueStore>(kv: &K) -> Session {
    let Some(user_json) = kv.get(LEGACY_USER_KEY) else {
        return Session::SignedOut;
    };

    let session = match serde_json::from_str::<User>(&user_json) {
        Ok(user) => {
            let token = LEGACY_TOKEN_KEYS
                .iter()
                .filter_map(|key| kv.get(key))
                .find(|t| !t.trim().is_empty())
                .unwrap_or_default();
            info!(user_id = user.id, "migrating legacy session keys");
            Session::SignedIn { user, token }
        }
        Err(e) => {
            warn!("discarding unreadable legacy user: {e}");
            Session::SignedOut
        }
    };

    if session.is_signed_in() {
        match serde_json::to_string(&session) {
            Ok(json) => kv.set(SESSION_KEY, &json),
            Err(e) => warn!("failed to serialise migrated session: {e}"),
        }
    }
    kv.remove(LEGACY_USER_KEY);
    for key in LEGACY_TOKEN_KEYS {
        kv.remove(key);
    }
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn user() -> User {
        User {
            id: 42,
            username: "ayse".into(),
            email: "ayse@example.com".into(),
        }
    }

    #[test]
    fn test_sign_in_survives_reload() {
        let kv = MemoryKv::new();
        let store = SessionStore::load(kv.clone());
        assert!(!store.is_signed_in());

        store.sign_in(user(), "tok");
        assert_eq!(kv.keys(), vec!["session"]);

        let reloaded = SessionStore::load(kv.clone());
        assert_eq!(reloaded.user(), Some(user()));
        assert_eq!(reloaded.bearer_token().as_deref(), Some("tok"));
        assert_eq!(reloaded.current_user_id(), Some(42));
    }

    #[test]
    fn test_sign_out_removes_session_key() {
        let kv = MemoryKv::new();
        let store = SessionStore::load(kv.clone());
        store.sign_in(user(), "tok");
        store.sign_out();
        assert!(kv.get(SESSION_KEY).is_none());
        assert_eq!(store.session(), Session::SignedOut);
        assert!(!SessionStore::load(kv).is_signed_in());
    }

    #[test]
    fn test_legacy_keys_migrate() {
        let kv = MemoryKv::new();
        kv.set("user", r#"{"userId": 42, "username": "ayse", "email": "ayse@example.com"}"#);
        kv.set("jwt", "legacy-token");

        let store = SessionStore::load(kv.clone());
        assert_eq!(store.user(), Some(user()));
        assert_eq!(store.bearer_token().as_deref(), Some("legacy-token"));
        assert_eq!(kv.keys(), vec!["session"]);
    }

    #[test]
    fn test_legacy_token_key_fallback() {
        let kv = MemoryKv::new();
        kv.set("user", r#"{"id": 7, "username": "x", "email": "x@example.com"}"#);
        kv.set("jwt", "");
        kv.set("token", "other");

        let store = SessionStore::load(kv.clone());
        assert_eq!(store.current_user_id(), Some(7));
        assert_eq!(store.bearer_token().as_deref(), Some("other"));
    }

    #[test]
    fn test_malformed_legacy_user_is_cleared() {
        let kv = MemoryKv::new();
        kv.set("user", "{not json");
        kv.set("jwt", "t");

        let store = SessionStore::load(kv.clone());
        assert!(!store.is_signed_in());
        assert!(kv.keys().is_empty());
    }

    #[test]
    fn test_malformed_session_is_signed_out() {
        let kv = MemoryKv::new();
        kv.set(SESSION_KEY, "garbage");
        let store = SessionStore::load(kv.clone());
        assert!(!store.is_signed_in());
        assert!(kv.get(SESSION_KEY).is_none());
    }

    #[test]
    fn test_preferences() {
        let kv = MemoryKv::new();
        let store = SessionStore::load(kv.clone());
        assert_eq!(store.theme(), Theme::Light);
        store.set_theme(Theme::Dark);
        assert_eq!(kv.get("theme").as_deref(), Some("dark"));
        assert_eq!(store.theme().toggled(), Theme::Light);

        assert_eq!(store.api_base_url(), None);
        store.set_api_base_url(Some(" https://api.example.com "));
        assert_eq!(store.api_base_url().as_deref(), Some("https://api.example.com"));
        store.set_api_base_url(None);
        assert!(kv.get(BASE_URL_KEY).is_none());
    }
}
