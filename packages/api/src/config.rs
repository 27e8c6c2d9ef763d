//! Where the API lives.
//!
//! Resolution order, first non-empty wins:
//!
//! 1. the `API_BASE_URL` override persisted by the client,
//! 2. `RECIPES_API_BASE_URL` from the environment or a `.env` file (native only),
//! 3. `[api] base_url` in `recipes.toml`.

use store::ClientConfig;

pub const BASE_URL_ENV: &str = "RECIPES_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// Resolve the base URL from the persisted override, the environment and
    /// the TOML config.
    pub fn resolve(config: &ClientConfig, persisted: Option<&str>) -> Self {
        let env = Self::env_base_url();
        let override_url = persisted
            .filter(|u| !u.trim().is_empty())
            .or(env.as_deref());
        Self {
            base_url: config.effective_base_url(override_url),
        }
    }

    /// Base URL from the environment, falling back to the TOML config.
    pub fn from_env(config: &ClientConfig) -> Self {
        Self::resolve(config, None)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn env_base_url() -> Option<String> {
        dotenvy::dotenv().ok();
        std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty())
    }

    #[cfg(target_arch = "wasm32")]
    fn env_base_url() -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_override_wins() {
        let config = ClientConfig::new("http://localhost:5043");
        let resolved = ApiConfig::resolve(&config, Some("https://api.example.com/"));
        assert_eq!(resolved.base_url, "https://api.example.com");

        let blank = ApiConfig::resolve(&config, Some("  "));
        assert!(!blank.base_url.is_empty());
    }
}
