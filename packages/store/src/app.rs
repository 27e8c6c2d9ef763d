//! # Application state
//!
//! [`AppState`] wires the controllers to one backend and one key-value store and
//! owns the cross-cutting policies: what happens on sign-in, on sign-out, and
//! when any call comes back 401.

use tracing::{info, warn};

use crate::backend::Backend;
use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::favorites::FavoritesController;
use crate::kv::KeyValueStore;
use crate::models::{NewReview, RatingSummary, RecipeId, ReviewPage, User, UserProfile};
use crate::profile::{PhotoUpload, ProfileSynchronizer};
use crate::reviews::ReviewPager;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState<B: Backend, K: KeyValueStore> {
    config: ClientConfig,
    backend: B,
    session: SessionStore<K>,
    favorites: FavoritesController<B>,
    reviews: ReviewPager<B>,
    profiles: ProfileSynchronizer<B>,
}

impl<B: Backend, K: KeyValueStore> AppState<B, K> {
    /// Build the state, restoring any persisted session into the backend.
    pub fn new(backend: B, kv: K, config: ClientConfig) -> Self {
        let session = SessionStore::load(kv);
        backend.set_bearer(session.bearer_token());
        Self {
            favorites: FavoritesController::new(backend.clone()),
            reviews: ReviewPager::new(backend.clone(), config.reviews.page_size),
            profiles: ProfileSynchronizer::new(backend.clone(), config.photo.max_bytes),
            session,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &SessionStore<K> {
        &self.session
    }

    pub fn favorites(&self) -> &FavoritesController<B> {
        &self.favorites
    }

    pub fn reviews(&self) -> &ReviewPager<B> {
        &self.reviews
    }

    pub fn profiles(&self) -> &ProfileSynchronizer<B> {
        &self.profiles
    }

    /// The API base URL, honouring a persisted override.
    pub fn base_url(&self) -> String {
        self.config
            .effective_base_url(self.session.api_base_url().as_deref())
    }

    /// Reload user-scoped data for a session restored from storage.
    pub async fn restore(&self) -> Result<(), ClientError> {
        match self.session.user() {
            Some(user) => self.favorites.load_for(user.id).await,
            None => Ok(()),
        }
    }

    /// Persist the session and load the user's favorites.
    ///
    /// The sign-in stands once the session is saved. A failed favorites load
    /// is left in [`FavoritesController::last_error`] for a later retry, except
    /// a 401, which ends the session again and is returned.
    pub async fn sign_in(&self, user: User, token: impl Into<String>) -> Result<(), ClientError> {
        let user_id = user.id;
        self.profiles.clear();
        self.session.sign_in(user, token);
        self.backend.set_bearer(self.session.bearer_token());
        info!(user_id, "signed in");
        match self.favorites.load_for(user_id).await {
            Err(e) if e.is_unauthorized() => {
                warn!(user_id, "token rejected right after sign-in, clearing session");
                self.sign_out();
                Err(e)
            }
            _ => Ok(()),
        }
    }

    /// Clear the session and every user-scoped cache.
    pub fn sign_out(&self) {
        self.session.sign_out();
        self.backend.set_bearer(None);
        self.favorites.clear();
        self.profiles.clear();
        self.reviews.invalidate_all();
    }

    /// Apply the global error policy and return the message to show.
    ///
    /// A 401 from any call ends the session.
    pub fn handle_error(&self, err: &ClientError) -> String {
        if err.is_unauthorized() && self.session.is_signed_in() {
            warn!("request unauthorized, clearing session");
            self.sign_out();
        }
        err.user_message()
    }

    pub async fn load_catalog(&self) -> Result<Catalog, ClientError> {
        let mut catalog = Catalog::default();
        catalog.load(&self.backend).await?;
        Ok(catalog)
    }

    /// The signed-in user's profile, created on first use.
    pub async fn ensure_profile(&self) -> Result<UserProfile, ClientError> {
        let user = self.session.user().ok_or(ClientError::SignedOut)?;
        self.profiles.ensure_profile(&user).await
    }

    pub async fn upload_photo(&self, upload: PhotoUpload) -> Result<String, ClientError> {
        let user_id = self.session.current_user_id().ok_or(ClientError::SignedOut)?;
        self.profiles.upload_photo(user_id, upload).await
    }

    /// Post a review as the signed-in user.
    pub async fn submit_review(
        &self,
        recipe_id: RecipeId,
        rating: u8,
        text: impl Into<String>,
    ) -> Result<(ReviewPage, RatingSummary), ClientError> {
        let user_id = self.session.current_user_id().ok_or(ClientError::SignedOut)?;
        let review = NewReview {
            recipe_id,
            user_id,
            review_text: text.into(),
            rating,
        };
        self.reviews.submit(&review).await
    }
}
