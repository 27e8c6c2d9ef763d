use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::backend::{BearerAuth, FavoriteApi, ProfileApi, RecipeApi, ReviewApi};
use crate::error::ApiError;
use crate::lock;
use crate::models::{
    NewReview, RatingSummary, Recipe, RecipeId, Review, ReviewPage, UserId, UserProfile,
};

/// Backend operations, for call counting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    ListRecipes,
    ListFavorites,
    AddFavorite,
    RemoveFavorite,
    PagedReviews,
    AverageRating,
    CreateReview,
    AllReviews,
    ProfileExists,
    GetProfile,
    CreateProfile,
    UpdateProfile,
    UploadPhoto,
}

#[derive(Debug, Default)]
struct ServerState {
    recipes: Vec<Option<Recipe>>,
    favorites: HashMap<UserId, Vec<RecipeId>>,
    reviews: Vec<Review>,
    profiles: HashMap<UserId, UserProfile>,
    bearer: Option<String>,
    require_bearer: bool,
    failures: HashMap<Op, ApiError>,
    calls: HashMap<Op, usize>,
}

type Hook = Box<dyn FnOnce() + Send>;

/// One-shot callbacks run when an operation is called, before it is served.
#[derive(Default)]
struct Hooks(HashMap<Op, Hook>);

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// In-memory backend for testing and offline previews. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<ServerState>>,
    hooks: Arc<Mutex<Hooks>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_recipes(&self, recipes: Vec<Option<Recipe>>) {
        lock(&self.state).recipes = recipes;
    }

    pub fn set_favorites(&self, user_id: UserId, ids: Vec<RecipeId>) {
        lock(&self.state).favorites.insert(user_id, ids);
    }

    pub fn favorites_of(&self, user_id: UserId) -> Vec<RecipeId> {
        lock(&self.state)
            .favorites
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_review(&self, review: Review) {
        lock(&self.state).reviews.push(review);
    }

    /// Store `profile` under `key`, which need not equal its `user_id`.
    pub fn insert_profile(&self, key: UserId, profile: UserProfile) {
        lock(&self.state).profiles.insert(key, profile);
    }

    pub fn profile_of(&self, user_id: UserId) -> Option<UserProfile> {
        lock(&self.state).profiles.get(&user_id).cloned()
    }

    /// Reject authenticated calls with 401 when no bearer token is set.
    pub fn require_bearer(&self, required: bool) {
        lock(&self.state).require_bearer = required;
    }

    pub fn bearer(&self) -> Option<String> {
        lock(&self.state).bearer.clone()
    }

    /// Make the next call of `op` fail with `error`.
    pub fn fail_next(&self, op: Op, error: ApiError) {
        lock(&self.state).failures.insert(op, error);
    }

    /// Run `hook` when `op` is next called, while the caller is awaiting it.
    pub fn on_next(&self, op: Op, hook: impl FnOnce() + Send + 'static) {
        lock(&self.hooks).0.insert(op, Box::new(hook));
    }

    /// How many times `op` has been called, failed calls included.
    pub fn calls(&self, op: Op) -> usize {
        lock(&self.state).calls.get(&op).copied().unwrap_or(0)
    }

    fn enter(&self, op: Op, authenticated: bool) -> Result<std::sync::MutexGuard<'_, ServerState>, ApiError> {
        let hook = lock(&self.hooks).0.remove(&op);
        if let Some(hook) = hook {
            hook();
        }
        let mut state = lock(&self.state);
        *state.calls.entry(op).or_default() += 1;
        if let Some(error) = state.failures.remove(&op) {
            return Err(error);
        }
        if authenticated && state.require_bearer && state.bearer.is_none() {
            return Err(ApiError::Unauthorized);
        }
        Ok(state)
    }
}

impl BearerAuth for MemoryBackend {
    fn set_bearer(&self, token: Option<String>) {
        lock(&self.state).bearer = token;
    }
}

impl RecipeApi for MemoryBackend {
    async fn list_recipes(&self) -> Result<Vec<Option<Recipe>>, ApiError> {
        Ok(self.enter(Op::ListRecipes, false)?.recipes.clone())
    }
}

impl FavoriteApi for MemoryBackend {
    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<RecipeId>, ApiError> {
        let state = self.enter(Op::ListFavorites, true)?;
        Ok(state.favorites.get(&user_id).cloned().unwrap_or_default())
    }

    async fn add_favorite(&self, user_id: UserId, recipe_id: RecipeId) -> Result<(), ApiError> {
        let mut state = self.enter(Op::AddFavorite, true)?;
        let ids = state.favorites.entry(user_id).or_default();
        if !ids.contains(&recipe_id) {
            ids.push(recipe_id);
        }
        Ok(())
    }

    async fn remove_favorite(&self, user_id: UserId, recipe_id: RecipeId) -> Result<(), ApiError> {
        let mut state = self.enter(Op::RemoveFavorite, true)?;
        if let Some(ids) = state.favorites.get_mut(&user_id) {
            ids.retain(|id| *id != recipe_id);
        }
        Ok(())
    }
}

impl ReviewApi for MemoryBackend {
    async fn paged_reviews(
        &self,
        recipe_id: RecipeId,
        page: u32,
        page_size: u32,
    ) -> Result<ReviewPage, ApiError> {
        let state = self.enter(Op::PagedReviews, false)?;
        let mut reviews: Vec<&Review> =
            state.reviews.iter().filter(|r| r.recipe_id == recipe_id).collect();
        reviews.sort_by(|a, b| b.id.cmp(&a.id));

        let size = page_size.max(1) as usize;
        let total_pages = reviews.len().div_ceil(size) as u32;
        let skip = (page.max(1) as usize - 1) * size;
        Ok(ReviewPage {
            items: reviews.into_iter().skip(skip).take(size).cloned().collect(),
            total_pages,
        })
    }

    async fn average_rating(&self, recipe_id: RecipeId) -> Result<RatingSummary, ApiError> {
        let state = self.enter(Op::AverageRating, false)?;
        let ratings: Vec<u8> = state
            .reviews
            .iter()
            .filter(|r| r.recipe_id == recipe_id)
            .map(|r| r.rating)
            .collect();
        let count = ratings.len() as u32;
        let average = if count == 0 {
            0.0
        } else {
            ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / f64::from(count)
        };
        Ok(RatingSummary { average, count })
    }

    async fn create_review(&self, review: &NewReview) -> Result<(), ApiError> {
        let mut state = self.enter(Op::CreateReview, true)?;
        let id = state.reviews.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        state.reviews.push(Review {
            id,
            recipe_id: review.recipe_id,
            user_id: review.user_id,
            rating: review.rating,
            body: review.review_text.clone(),
            username: None,
        });
        Ok(())
    }

    async fn all_reviews(&self) -> Result<Vec<Review>, ApiError> {
        Ok(self.enter(Op::AllReviews, false)?.reviews.clone())
    }
}

impl ProfileApi for MemoryBackend {
    async fn profile_exists(&self, user_id: UserId) -> Result<bool, ApiError> {
        Ok(self.enter(Op::ProfileExists, true)?.profiles.contains_key(&user_id))
    }

    async fn get_profile(&self, user_id: UserId) -> Result<UserProfile, ApiError> {
        let state = self.enter(Op::GetProfile, true)?;
        state.profiles.get(&user_id).cloned().ok_or(ApiError::NotFound)
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        let mut state = self.enter(Op::CreateProfile, true)?;
        let mut created = profile.clone();
        created.user_profile_id = Some(state.profiles.len() as i64 + 1);
        state.profiles.insert(created.user_id, created.clone());
        Ok(created)
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        let mut state = self.enter(Op::UpdateProfile, true)?;
        let stored = state
            .profiles
            .get_mut(&profile.user_id)
            .ok_or(ApiError::NotFound)?;
        *stored = UserProfile {
            user_profile_id: stored.user_profile_id,
            created_at: stored.created_at.clone(),
            ..profile.clone()
        };
        Ok(stored.clone())
    }

    async fn upload_photo(&self, user_id: UserId, data_uri: &str) -> Result<Option<String>, ApiError> {
        let mut state = self.enter(Op::UploadPhoto, true)?;
        if !data_uri.starts_with("data:image/") {
            return Err(ApiError::BadRequest("expected an image data URI".into()));
        }
        let profile = state.profiles.get_mut(&user_id).ok_or(ApiError::NotFound)?;
        let path = format!("/images/ProfilePhoto/user_{user_id}.png");
        profile.photo = Some(path.clone());
        Ok(Some(path))
    }
}
