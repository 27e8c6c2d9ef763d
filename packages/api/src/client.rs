//! `reqwest` implementation of the backend traits.

use std::sync::{Arc, PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use store::models::{FavoriteRecord, FavoriteRequest};
use store::profile::extract_photo_field;
use store::{
    ApiError, BearerAuth, FavoriteApi, NewReview, ProfileApi, RatingSummary, Recipe, RecipeApi,
    RecipeId, Review, ReviewApi, ReviewPage, UserId, UserProfile,
};

use crate::config::ApiConfig;

/// HTTP client for the recipe API. Clones share the connection pool and the
/// bearer token.
#[derive(Clone, Debug)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpClient {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let resp = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        handle_response(resp).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn get_with_query<Q: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        self.send(self.http.get(self.url(path)).query(query)).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        self.send(self.http.put(self.url(path)).json(body)).await
    }
}

/// Map a response onto `T` or an [`ApiError`] by status.
async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    if status.is_success() {
        decode_body(&body)
    } else {
        debug!(status = status.as_u16(), "request failed");
        Err(ApiError::from_status(status.as_u16(), error_message(&body)))
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| {
        let excerpt: String = body.chars().take(200).collect();
        ApiError::Decode(format!("{e} (body: {excerpt})"))
    })
}

/// The human-readable part of an error body: a `message`, `title` or `error`
/// field if the body is JSON, the raw text otherwise.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| match v {
            Value::String(s) => Some(s),
            Value::Object(map) => ["message", "title", "error"]
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str).map(str::to_string)),
            _ => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// `ProfileExists` has answered with a bare boolean and with `{ "exists": .. }`.
fn parse_exists(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Object(map) => map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("exists"))
            .and_then(|(_, v)| v.as_bool())
            .unwrap_or(false),
        _ => false,
    }
}

impl BearerAuth for HttpClient {
    fn set_bearer(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }
}

impl RecipeApi for HttpClient {
    async fn list_recipes(&self) -> Result<Vec<Option<Recipe>>, ApiError> {
        let recipes: Option<Vec<Option<Recipe>>> = self.get("/api/Recipe/GetRecipes").await?;
        Ok(recipes.unwrap_or_default())
    }
}

impl FavoriteApi for HttpClient {
    async fn list_favorites(&self, user_id: UserId) -> Result<Vec<RecipeId>, ApiError> {
        let records: Option<Vec<FavoriteRecord>> = self
            .get(&format!("/api/Favorite/GetUserFavorites/{user_id}"))
            .await?;
        Ok(records
            .unwrap_or_default()
            .iter()
            .map(FavoriteRecord::recipe_id)
            .collect())
    }

    async fn add_favorite(&self, user_id: UserId, recipe_id: RecipeId) -> Result<(), ApiError> {
        let body = FavoriteRequest { user_id, recipe_id };
        let request = self
            .http
            .post(self.url("/api/Favorite/AddToFavorites"))
            .query(&body)
            .json(&body);
        let _: Value = self.send(request).await?;
        Ok(())
    }

    async fn remove_favorite(&self, user_id: UserId, recipe_id: RecipeId) -> Result<(), ApiError> {
        let body = FavoriteRequest { user_id, recipe_id };
        let request = self
            .http
            .post(self.url("/api/Favorite/RemoveFromFavorites"))
            .query(&body)
            .json(&body);
        let _: Value = self.send(request).await?;
        Ok(())
    }
}

impl ReviewApi for HttpClient {
    async fn paged_reviews(
        &self,
        recipe_id: RecipeId,
        page: u32,
        page_size: u32,
    ) -> Result<ReviewPage, ApiError> {
        let page: Option<ReviewPage> = self
            .get_with_query(
                "/api/Review/PagedReviewsByRecipe",
                &[
                    ("recipeId", recipe_id.to_string()),
                    ("page", page.to_string()),
                    ("pageSize", page_size.to_string()),
                ],
            )
            .await?;
        Ok(page.unwrap_or_default())
    }

    async fn average_rating(&self, recipe_id: RecipeId) -> Result<RatingSummary, ApiError> {
        let summary: Option<RatingSummary> = self
            .get(&format!("/api/Review/GetAverageRating/{recipe_id}"))
            .await?;
        Ok(summary.unwrap_or_default())
    }

    async fn create_review(&self, review: &NewReview) -> Result<(), ApiError> {
        let _: Value = self.post("/api/Review/CreateReview", review).await?;
        Ok(())
    }

    async fn all_reviews(&self) -> Result<Vec<Review>, ApiError> {
        let reviews: Option<Vec<Review>> = self.get("/api/Review/GetReviews").await?;
        Ok(reviews.unwrap_or_default())
    }
}

impl ProfileApi for HttpClient {
    async fn profile_exists(&self, user_id: UserId) -> Result<bool, ApiError> {
        let value: Value = self
            .get(&format!("/api/UserProfile/ProfileExists/{user_id}"))
            .await?;
        Ok(parse_exists(&value))
    }

    async fn get_profile(&self, user_id: UserId) -> Result<UserProfile, ApiError> {
        let profile: Option<UserProfile> = self
            .get(&format!("/api/UserProfile/GetUserProfile/{user_id}"))
            .await?;
        profile.ok_or(ApiError::NotFound)
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        let created: Option<UserProfile> = self
            .post("/api/UserProfile/CreateUserProfile", profile)
            .await?;
        Ok(created.unwrap_or_else(|| profile.clone()))
    }

    async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        let updated: Option<UserProfile> = self
            .put("/api/UserProfile/UpdateUserProfile", profile)
            .await?;
        Ok(updated.unwrap_or_else(|| profile.clone()))
    }

    async fn upload_photo(&self, user_id: UserId, data_uri: &str) -> Result<Option<String>, ApiError> {
        let body = json!({ "userId": user_id, "profileImageBase64": data_uri });
        let value: Value = self
            .post("/api/UserProfile/UploadUserProfilePhoto", &body)
            .await?;
        Ok(extract_photo_field(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building() {
        let client = HttpClient::new("http://localhost:5043/");
        assert_eq!(client.base_url(), "http://localhost:5043");
        assert_eq!(
            client.url("/api/Recipe/GetRecipes"),
            "http://localhost:5043/api/Recipe/GetRecipes"
        );
    }

    #[test]
    fn test_bearer_is_shared_between_clones() {
        let client = HttpClient::new("http://localhost:5043");
        let clone = client.clone();
        client.set_bearer(Some("tok".into()));
        assert_eq!(clone.token().as_deref(), Some("tok"));
        clone.set_bearer(None);
        assert_eq!(client.token(), None);
    }

    #[test]
    fn test_empty_body_decodes_as_null() {
        let v: Option<Vec<Review>> = decode_body("").unwrap();
        assert_eq!(v, None);
        let v: Value = decode_body("  ").unwrap();
        assert!(v.is_null());
        assert!(matches!(decode_body::<bool>("{oops"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message": "Email already used"}"#), "Email already used");
        assert_eq!(error_message(r#"{"title": "Bad Request", "status": 400}"#), "Bad Request");
        assert_eq!(error_message(r#""plain json string""#), "plain json string");
        assert_eq!(error_message(" not json \n"), "not json");
    }

    #[test]
    fn test_parse_exists() {
        assert!(parse_exists(&json!(true)));
        assert!(parse_exists(&json!({"Exists": true})));
        assert!(!parse_exists(&json!({"exists": false})));
        assert!(!parse_exists(&Value::Null));
    }

    #[test]
    fn test_favorite_request_query_shape() {
        let body = FavoriteRequest {
            user_id: 4,
            recipe_id: 9,
        };
        let request = reqwest::Client::new()
            .post("http://localhost:5043/api/Favorite/AddToFavorites")
            .query(&body)
            .json(&body)
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("userId=4&recipeId=9"));
        let sent: Value = serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(sent, json!({"userId": 4, "recipeId": 9}));
    }
}
