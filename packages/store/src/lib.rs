pub mod app;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod favorites;
pub mod kv;
pub mod models;
pub mod photo;
pub mod profile;
pub mod reviews;
pub mod session;

mod memory;
pub use memory::{MemoryBackend, Op};

#[cfg(not(target_arch = "wasm32"))]
mod file_store;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileKv;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod web_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use web_storage::LocalStorageKv;

pub use app::AppState;
pub use backend::{Backend, BearerAuth, FavoriteApi, ProfileApi, RecipeApi, ReviewApi};
pub use catalog::{categories, filter_recipes, Catalog, CategoryFilter, Pantry, RecipeFilter};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, ErrorKind, ValidationError};
pub use favorites::{FavoritesController, PendingToggle, ToggleStart};
pub use kv::{KeyValueStore, MemoryKv};
pub use models::{
    FavoriteRecord, FavoriteRequest, Ingredients, NewReview, RatingSummary, Recipe, RecipeId,
    Review, ReviewPage, User, UserId, UserProfile,
};
pub use photo::{resolve_photo, resolve_recipe_image, ImageSource};
pub use profile::{PhotoUpload, ProfileSynchronizer, ProfileUpdate};
pub use reviews::{page_window, PageNav, ReviewPager, UserReview};
pub use session::{Session, SessionStore, Theme};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
