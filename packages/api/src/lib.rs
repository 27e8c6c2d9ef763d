//! # API crate: HTTP client for the recipe backend
//!
//! Implements the backend traits defined in `store` on top of `reqwest`, so the
//! controllers there can talk to the real server.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | [`HttpClient`]: URL building, bearer token, status → [`store::ApiError`] mapping, and the recipe, favorite, review and profile endpoints |
//! | [`auth`] | `login` / `register` on [`HttpClient`], local registration checks |
//! | [`config`] | [`ApiConfig`]: base URL resolution (persisted override, environment, TOML) |
//!
//! ## Error mapping
//!
//! | Response | Error |
//! |----------|-------|
//! | 2xx with empty body | decoded as JSON `null` |
//! | 2xx with a body that does not match | `ApiError::Decode` |
//! | 400 / 401 / 404 / 409 | `BadRequest` / `Unauthorized` / `NotFound` / `Conflict` |
//! | any other status | `ApiError::Server` |
//! | connection failure | `ApiError::Network` |

pub mod auth;
pub mod client;
pub mod config;

pub use auth::validate_registration;
pub use client::HttpClient;
pub use config::ApiConfig;
