//! Platform key-value store and application state constructors.
//!
//! [`make_kv`] returns the [`store::KeyValueStore`] for the current platform:
//! - **Web** (WASM + `web` feature): browser `localStorage` via [`store::LocalStorageKv`]
//! - **Desktop / Mobile** (native): one file per key via [`store::FileKv`]
//!   under `<data_dir>/recipes/`
//! - **WASM without `web`**: in memory only

use api::{ApiConfig, HttpClient};
use store::{AppState, ClientConfig, KeyValueStore};

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub type PlatformKv = store::LocalStorageKv;
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformKv = store::FileKv;
#[cfg(all(target_arch = "wasm32", not(feature = "web")))]
pub type PlatformKv = store::MemoryKv;

/// Application state as the UI uses it.
pub type ClientState = AppState<HttpClient, PlatformKv>;

pub fn make_kv() -> PlatformKv {
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    {
        store::LocalStorageKv::new()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let base = dirs::data_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join("recipes");
        store::FileKv::new(base)
    }
    #[cfg(all(target_arch = "wasm32", not(feature = "web")))]
    {
        store::MemoryKv::new()
    }
}

/// Build the client state: resolve the API location, restore the session
/// from the platform store.
pub fn make_state(config: ClientConfig) -> ClientState {
    let kv = make_kv();
    let persisted = kv.get(store::session::BASE_URL_KEY);
    let api_config = ApiConfig::resolve(&config, persisted.as_deref());
    tracing::info!(base_url = %api_config.base_url, "using recipe API");
    AppState::new(HttpClient::from_config(&api_config), kv, config)
}
