//! Dioxus bindings for the recipe client.
//!
//! Providers nest as
//! `NoticeProvider > AuthProvider > ThemeProvider > FavoritesProvider`; the
//! components below read the shared [`ClientState`] through [`use_app`].

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod kv;
pub use kv::{make_kv, make_state, ClientState, PlatformKv};

mod notice;
pub use notice::{use_notice, Notice, NoticeBanner, NoticeLevel, NoticeProvider};

mod auth;
pub use auth::{
    report_error, sign_in, use_app, use_auth, AuthProvider, AuthState, LoginForm, LogoutButton,
};

mod theme;
pub use theme::{apply_theme, load_theme_from_storage, ThemeProvider, ThemeSignal, ThemeToggle};

mod favorites;
pub use favorites::{use_favorites, FavoriteButton, FavoritesProvider};

mod avatar;
pub use avatar::{cache_bust_token, Avatar};

mod reviews;
pub use reviews::{PageWindowNav, StarRating};
