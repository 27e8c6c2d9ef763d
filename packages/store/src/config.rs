//! # Client configuration (`recipes.toml`)
//!
//! Defines the TOML file that configures the client (filename:
//! [`ClientConfig::filename`] = `"recipes.toml"`). It is read once at startup;
//! a persisted API base URL override (see [`crate::session`]) takes precedence
//! over the value here.
//!
//! ## Structure
//!
//! ```toml
//! [api]
//! base_url = "http://localhost:5043"
//!
//! [reviews]
//! page_size = 10   # reviews per page
//! window = 7       # page numbers shown in the navigation
//!
//! [photo]
//! max_bytes = 5242880
//! ```
//!
//! ## Types
//!
//! | Struct | Purpose |
//! |--------|---------|
//! | [`ClientConfig`] | Top-level config. Builder helpers (`new`, `with_page_size`), TOML (de)serialisation and the canonical filename. |
//! | [`ApiSettings`] | Base URL of the remote API. |
//! | [`ReviewSettings`] | Page size and navigation window width for the review pager. |
//! | [`PhotoSettings`] | Upper bound for profile photo uploads. |
//!
//! A missing or empty file is equivalent to the defaults.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5043";

/// Top-level configuration stored in `recipes.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub reviews: ReviewSettings,
    #[serde(default)]
    pub photo: PhotoSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_window")]
    pub window: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoSettings {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_window() -> u32 {
    7
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            window: default_window(),
        }
    }
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

impl ClientConfig {
    /// Create a config pointing at the given API.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiSettings {
                base_url: base_url.into(),
            },
            ..Self::default()
        }
    }

    /// Builder method to set the review page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.reviews.page_size = page_size.max(1);
        self
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "recipes.toml"
    }

    /// The base URL to use, given a persisted override.
    pub fn effective_base_url(&self, override_url: Option<&str>) -> String {
        override_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.api.base_url)
            .trim_end_matches('/')
            .to_string()
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api.base_url, "http://localhost:5043");
        assert_eq!(config.reviews.page_size, 10);
        assert_eq!(config.reviews.window, 7);
        assert_eq!(config.photo.max_bytes, 5_242_880);
    }

    #[test]
    fn test_partial_toml() {
        let config = ClientConfig::from_toml("[reviews]\npage_size = 5\n").unwrap();
        assert_eq!(config.reviews.page_size, 5);
        assert_eq!(config.reviews.window, 7);
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = ClientConfig::new("https://recipes.example.com").with_page_size(20);
        let text = config.to_toml().unwrap();
        assert_eq!(ClientConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_effective_base_url() {
        let config = ClientConfig::new("http://localhost:5043/");
        assert_eq!(config.effective_base_url(None), "http://localhost:5043");
        assert_eq!(config.effective_base_url(Some("  ")), "http://localhost:5043");
        assert_eq!(
            config.effective_base_url(Some("https://api.example.com/")),
            "https://api.example.com"
        );
    }
}
