//! # Remote contract: the backend traits
//!
//! Every controller in this crate talks to the server through one of these async
//! traits, so the same reconciliation logic runs against the HTTP client in the
//! `api` crate, the [`MemoryBackend`](crate::MemoryBackend) used by tests, or any
//! future transport.
//!
//! | Trait | Endpoints |
//! |-------|-----------|
//! | [`RecipeApi`] | `GET /api/Recipe/GetRecipes` |
//! | [`FavoriteApi`] | `GET /api/Favorite/GetUserFavorites/{userId}`, `POST /api/Favorite/AddToFavorites`, `POST /api/Favorite/RemoveFromFavorites` |
//! | [`ReviewApi`] | `GET /api/Review/PagedReviewsByRecipe`, `GET /api/Review/GetAverageRating/{recipeId}`, `POST /api/Review/CreateReview`, `GET /api/Review/GetReviews` |
//! | [`ProfileApi`] | `GET /api/UserProfile/ProfileExists/{userId}`, `GET /api/UserProfile/GetUserProfile/{userId}`, `POST /api/UserProfile/CreateUserProfile`, `PUT /api/UserProfile/UpdateUserProfile`, `POST /api/UserProfile/UploadUserProfilePhoto` |
//!
//! The futures are deliberately not `Send`: the client runs on one event loop
//! (a browser tab or a UI thread).

use std::future::Future;

use crate::error::ApiError;
use crate::models::{
    NewReview, RatingSummary, Recipe, RecipeId, Review, ReviewPage, UserId, UserProfile,
};

pub trait RecipeApi {
    /// The full catalog. `null` entries are passed through as `None`.
    fn list_recipes(&self) -> impl Future<Output = Result<Vec<Option<Recipe>>, ApiError>>;
}

pub trait FavoriteApi {
    fn list_favorites(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<RecipeId>, ApiError>>;
    fn add_favorite(
        &self,
        user_id: UserId,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<(), ApiError>>;
    fn remove_favorite(
        &self,
        user_id: UserId,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<(), ApiError>>;
}

pub trait ReviewApi {
    /// One 1-indexed page. A page past the end yields no items and the same
    /// `total_pages`.
    fn paged_reviews(
        &self,
        recipe_id: RecipeId,
        page: u32,
        page_size: u32,
    ) -> impl Future<Output = Result<ReviewPage, ApiError>>;
    fn average_rating(
        &self,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<RatingSummary, ApiError>>;
    fn create_review(&self, review: &NewReview) -> impl Future<Output = Result<(), ApiError>>;
    /// Every review on the server, unpaged.
    fn all_reviews(&self) -> impl Future<Output = Result<Vec<Review>, ApiError>>;
}

pub trait ProfileApi {
    fn profile_exists(&self, user_id: UserId) -> impl Future<Output = Result<bool, ApiError>>;
    fn get_profile(&self, user_id: UserId)
        -> impl Future<Output = Result<UserProfile, ApiError>>;
    fn create_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, ApiError>>;
    /// Whole-record replace.
    fn update_profile(
        &self,
        profile: &UserProfile,
    ) -> impl Future<Output = Result<UserProfile, ApiError>>;
    /// Upload a Base64 data URI. Returns the server's raw photo field, which may
    /// have a different shape than what was sent.
    fn upload_photo(
        &self,
        user_id: UserId,
        data_uri: &str,
    ) -> impl Future<Output = Result<Option<String>, ApiError>>;
}

/// Holder of the bearer credential attached to authenticated calls.
pub trait BearerAuth {
    fn set_bearer(&self, token: Option<String>);
}

/// Everything the application state needs from one transport.
pub trait Backend: RecipeApi + FavoriteApi + ReviewApi + ProfileApi + BearerAuth + Clone {}

impl<T> Backend for T where T: RecipeApi + FavoriteApi + ReviewApi + ProfileApi + BearerAuth + Clone {}
