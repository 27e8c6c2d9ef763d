//! # Profile Synchronizer
//!
//! Keeps the last-known [`UserProfile`] of the signed-in user consistent with
//! the server's record.
//!
//! - [`ProfileSynchronizer::ensure_profile`] checks existence, fetches, and
//!   creates a blank profile seeded from the account when there is none.
//! - [`ProfileSynchronizer::update_profile`] merges a [`ProfileUpdate`] into the
//!   last-known record and PUTs the whole record.
//! - [`ProfileSynchronizer::upload_photo`] validates locally, sends a Base64 data
//!   URI and refetches the profile.
//!
//! A profile whose `user_id` differs from the user it was requested for is
//! never cached or returned. Failed requests leave the cached profile as it was.

use std::sync::{Arc, Mutex};

use base64::Engine;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::ProfileApi;
use crate::error::{ApiError, ClientError, ValidationError};
use crate::lock;
use crate::models::{User, UserId, UserProfile};
use crate::photo::{resolve_photo, ImageSource};

/// Fields to change. `Some` overwrites, `None` keeps the last-known value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
}

impl ProfileUpdate {
    pub fn bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    pub fn phone_number(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn date_of_birth(mut self, date: impl Into<String>) -> Self {
        self.date_of_birth = Some(date.into());
        self
    }

    fn apply_to(self, profile: &mut UserProfile) {
        let fields = [
            (self.bio, &mut profile.bio),
            (self.location, &mut profile.location),
            (self.website, &mut profile.website),
            (self.phone_number, &mut profile.phone_number),
            (self.date_of_birth, &mut profile.date_of_birth),
        ];
        for (change, field) in fields {
            if let Some(value) = change {
                *field = Some(value);
            }
        }
    }
}

/// A picked image file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl PhotoUpload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn validate(&self, max_bytes: usize) -> Result<(), ValidationError> {
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyPhoto);
        }
        if self.bytes.len() > max_bytes {
            return Err(ValidationError::PhotoTooLarge {
                size: self.bytes.len(),
                limit: max_bytes,
            });
        }
        if !self.mime.starts_with("image/") {
            return Err(ValidationError::NotAnImage(self.mime.clone()));
        }
        Ok(())
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{payload}", self.mime)
    }
}

/// Pull the raw photo field out of an upload response.
///
/// Accepts a bare string, or an object carrying `profileImageUrl`,
/// `profileImageBase64` or `photoUrl` in any casing, possibly nested under
/// `data`.
pub fn extract_photo_field(value: &Value) -> Option<String> {
    const KEYS: [&str; 3] = ["profileimageurl", "profileimagebase64", "photourl"];
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => {
            for key in KEYS {
                let found = map
                    .iter()
                    .find(|(k, _)| k.to_lowercase() == key)
                    .and_then(|(_, v)| v.as_str())
                    .filter(|s| !s.trim().is_empty());
                if let Some(found) = found {
                    return Some(found.to_string());
                }
            }
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("data"))
                .and_then(|(_, v)| extract_photo_field(v))
        }
        _ => None,
    }
}

#[derive(Debug, Default)]
struct ProfileState {
    profile: Option<UserProfile>,
    /// Bumped whenever the cache is dropped; a response that started under an
    /// older generation is not cached.
    generation: u64,
}

#[derive(Clone)]
pub struct ProfileSynchronizer<A: ProfileApi> {
    api: A,
    max_photo_bytes: usize,
    state: Arc<Mutex<ProfileState>>,
}

impl<A: ProfileApi> ProfileSynchronizer<A> {
    pub fn new(api: A, max_photo_bytes: usize) -> Self {
        Self {
            api,
            max_photo_bytes,
            state: Arc::new(Mutex::new(ProfileState::default())),
        }
    }

    /// The last-known profile.
    pub fn profile(&self) -> Option<UserProfile> {
        lock(&self.state).profile.clone()
    }

    /// The last-known profile photo, resolved against `base_url`.
    pub fn photo(&self, base_url: &str) -> Option<ImageSource> {
        lock(&self.state)
            .profile
            .as_ref()
            .and_then(|p| resolve_photo(p.photo.as_deref(), base_url))
    }

    /// Drop the cached profile. Responses to requests already in flight are
    /// not cached.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.profile = None;
    }

    /// Fetch the user's profile, creating one if the server has none.
    ///
    /// A 404 from either the existence check or the fetch means "no profile".
    pub async fn ensure_profile(&self, user: &User) -> Result<UserProfile, ClientError> {
        let generation = {
            let mut state = lock(&self.state);
            if state.profile.as_ref().is_some_and(|p| p.user_id != user.id) {
                debug!(user_id = user.id, "discarding cached profile of another user");
                state.generation += 1;
                state.profile = None;
            }
            state.generation
        };

        let exists = match self.api.profile_exists(user.id).await {
            Ok(exists) => exists,
            Err(ApiError::NotFound) => false,
            Err(e) => return Err(e.into()),
        };

        if exists {
            match self.api.get_profile(user.id).await {
                Ok(profile) if profile.user_id == user.id => {
                    debug!(user_id = user.id, "loaded profile");
                    self.store_if_current(generation, profile.clone());
                    return Ok(profile);
                }
                Ok(profile) => warn!(
                    expected = user.id,
                    got = profile.user_id,
                    "profile belongs to another user, recreating"
                ),
                Err(ApiError::NotFound) => debug!(user_id = user.id, "profile vanished, recreating"),
                Err(e) => return Err(e.into()),
            }
        }

        let seeded = UserProfile::seeded_from(user);
        let created = self.api.create_profile(&seeded).await?;
        let created = if created.user_id == user.id {
            created
        } else {
            warn!(user_id = user.id, "create returned another user's profile, keeping seed");
            seeded
        };
        info!(user_id = user.id, "created profile");
        self.store_if_current(generation, created.clone());
        Ok(created)
    }

    /// Merge `changes` into the last-known profile and push the whole record.
    pub async fn update_profile(&self, changes: ProfileUpdate) -> Result<UserProfile, ClientError> {
        let (generation, mut merged) = {
            let state = lock(&self.state);
            let profile = state.profile.clone().ok_or(ClientError::SignedOut)?;
            (state.generation, profile)
        };
        changes.apply_to(&mut merged);

        let updated = self.api.update_profile(&merged).await?;
        let updated = if updated.user_id == merged.user_id {
            updated
        } else {
            merged
        };
        self.store_if_current(generation, updated.clone());
        Ok(updated)
    }

    /// Validate, upload and return the server's raw photo field.
    ///
    /// Validation failures never reach the network. If the upload succeeds but
    /// the follow-up profile fetch fails, the cached profile is left as it was.
    pub async fn upload_photo(&self, user_id: UserId, upload: PhotoUpload) -> Result<String, ClientError> {
        upload.validate(self.max_photo_bytes)?;
        let data_uri = upload.to_data_uri();
        let generation = lock(&self.state).generation;

        let raw = self
            .api
            .upload_photo(user_id, &data_uri)
            .await?
            .unwrap_or(data_uri);
        debug!(user_id, "profile photo uploaded");

        match self.api.get_profile(user_id).await {
            Ok(mut profile) if profile.user_id == user_id => {
                if profile.photo.is_none() {
                    profile.photo = Some(raw.clone());
                }
                self.store_if_current(generation, profile);
            }
            Ok(_) => warn!(user_id, "refetched profile belongs to another user, ignoring"),
            Err(e) => warn!(user_id, error = %e, "could not refetch profile after photo upload"),
        }
        Ok(raw)
    }

    /// Cache `profile` unless the cache was dropped since `generation` or
    /// holds another user's profile.
    fn store_if_current(&self, generation: u64, profile: UserProfile) {
        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!(user_id = profile.user_id, "profile cache dropped meanwhile, not caching");
            return;
        }
        match state.profile.as_ref() {
            Some(current) if current.user_id != profile.user_id => {
                debug!(user_id = profile.user_id, "profile changed owner meanwhile, not caching");
            }
            _ => state.profile = Some(profile),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBackend, Op};
    use serde_json::json;

    const LIMIT: usize = 5 * 1024 * 1024;

    fn user(id: UserId) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
        }
    }

    fn png(len: usize) -> PhotoUpload {
        PhotoUpload::new(vec![0x89; len], "image/png")
    }

    #[tokio::test]
    async fn test_first_login_creates_then_updates() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);

        let created = sync.ensure_profile(&user(42)).await.unwrap();
        assert_eq!(created.user_id, 42);
        assert_eq!(created.username, "user42");
        assert_eq!(created.email, "user42@example.com");
        assert_eq!(created.bio, None);
        assert_eq!(created.photo, None);
        assert_eq!(backend.calls(Op::CreateProfile), 1);

        let updated = sync.update_profile(ProfileUpdate::default().bio("hi")).await.unwrap();
        assert_eq!(updated.bio.as_deref(), Some("hi"));
        assert_eq!(updated.username, "user42");
        assert_eq!(updated.email, "user42@example.com");
        assert_eq!(backend.profile_of(42).unwrap().bio.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_existing_profile_is_fetched() {
        let backend = MemoryBackend::new();
        let mut stored = UserProfile::seeded_from(&user(3));
        stored.location = Some("Izmir".into());
        backend.insert_profile(3, stored);

        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);
        let profile = sync.ensure_profile(&user(3)).await.unwrap();
        assert_eq!(profile.location.as_deref(), Some("Izmir"));
        assert_eq!(backend.calls(Op::CreateProfile), 0);
    }

    #[tokio::test]
    async fn test_mismatched_profile_is_never_returned() {
        let backend = MemoryBackend::new();
        backend.insert_profile(5, UserProfile::seeded_from(&user(5)));
        // The server answers a request for 7 with 5's record.
        backend.insert_profile(7, UserProfile::seeded_from(&user(5)));

        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);
        sync.ensure_profile(&user(5)).await.unwrap();
        assert_eq!(sync.profile().unwrap().user_id, 5);

        let profile = sync.ensure_profile(&user(7)).await.unwrap();
        assert_eq!(profile.user_id, 7);
        assert_eq!(sync.profile().unwrap().user_id, 7);
        assert_eq!(backend.calls(Op::CreateProfile), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_drops_other_users_cache() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);
        sync.ensure_profile(&user(5)).await.unwrap();

        backend.fail_next(Op::ProfileExists, ApiError::Network("offline".into()));
        assert!(sync.ensure_profile(&user(7)).await.is_err());
        assert_eq!(sync.profile(), None);
    }

    #[tokio::test]
    async fn test_failed_update_keeps_profile() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);
        sync.ensure_profile(&user(1)).await.unwrap();

        backend.fail_next(Op::UpdateProfile, ApiError::Server { status: 500, message: String::new() });
        let err = sync.update_profile(ProfileUpdate::default().bio("x")).await.unwrap_err();
        assert!(err.user_message().contains("try again"));
        assert_eq!(sync.profile().unwrap().bio, None);
    }

    #[tokio::test]
    async fn test_update_without_profile() {
        let sync = ProfileSynchronizer::new(MemoryBackend::new(), LIMIT);
        let err = sync.update_profile(ProfileUpdate::default()).await.unwrap_err();
        assert_eq!(err, ClientError::SignedOut);
    }

    #[tokio::test]
    async fn test_photo_validation_issues_no_request() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);

        let err = sync.upload_photo(1, png(LIMIT + 1)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::PhotoTooLarge { .. })));

        let err = sync
            .upload_photo(1, PhotoUpload::new(b"hello".to_vec(), "text/plain"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(ValidationError::NotAnImage(_))));

        let err = sync.upload_photo(1, png(0)).await.unwrap_err();
        assert_eq!(err, ClientError::Validation(ValidationError::EmptyPhoto));

        assert_eq!(backend.calls(Op::UploadPhoto), 0);
        assert!(png(LIMIT).validate(LIMIT).is_ok());
    }

    #[tokio::test]
    async fn test_upload_refetches_profile() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);
        sync.ensure_profile(&user(9)).await.unwrap();

        let raw = sync.upload_photo(9, png(16)).await.unwrap();
        assert_eq!(raw, "/images/ProfilePhoto/user_9.png");
        assert_eq!(sync.profile().unwrap().photo.as_deref(), Some(raw.as_str()));
        assert_eq!(
            sync.photo("http://localhost:5043").unwrap().as_str(),
            "http://localhost:5043/images/ProfilePhoto/user_9.png"
        );
    }

    #[tokio::test]
    async fn test_upload_survives_failed_refetch() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);
        sync.ensure_profile(&user(9)).await.unwrap();

        backend.fail_next(Op::GetProfile, ApiError::Network("offline".into()));
        let raw = sync.upload_photo(9, png(16)).await.unwrap();
        assert_eq!(raw, "/images/ProfilePhoto/user_9.png");
        assert_eq!(sync.profile().unwrap().photo, None);
    }

    #[tokio::test]
    async fn test_missing_existence_endpoint_creates_profile() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);

        backend.fail_next(Op::ProfileExists, ApiError::NotFound);
        let profile = sync.ensure_profile(&user(42)).await.unwrap();
        assert_eq!(profile.user_id, 42);
        assert_eq!(backend.calls(Op::CreateProfile), 1);
        assert_eq!(sync.profile().unwrap().user_id, 42);
    }

    #[tokio::test]
    async fn test_response_after_clear_is_not_cached() {
        let backend = MemoryBackend::new();
        let sync = ProfileSynchronizer::new(backend.clone(), LIMIT);

        let cleared = sync.clone();
        backend.on_next(Op::CreateProfile, move || cleared.clear());
        let profile = sync.ensure_profile(&user(5)).await.unwrap();
        assert_eq!(profile.user_id, 5);
        assert_eq!(sync.profile(), None);
        assert!(sync.photo("http://localhost:5043").is_none());

        sync.ensure_profile(&user(5)).await.unwrap();
        let cleared = sync.clone();
        backend.on_next(Op::GetProfile, move || cleared.clear());
        sync.upload_photo(5, png(16)).await.unwrap();
        assert_eq!(sync.profile(), None);

        sync.ensure_profile(&user(5)).await.unwrap();
        let cleared = sync.clone();
        backend.on_next(Op::UpdateProfile, move || cleared.clear());
        sync.update_profile(ProfileUpdate::default().bio("late")).await.unwrap();
        assert_eq!(sync.profile(), None);
    }

    #[test]
    fn test_data_uri() {
        let upload = PhotoUpload::new(b"abc".to_vec(), "image/jpeg");
        assert_eq!(upload.to_data_uri(), "data:image/jpeg;base64,YWJj");
    }

    #[test]
    fn test_extract_photo_field() {
        assert_eq!(extract_photo_field(&json!("a.jpg")).as_deref(), Some("a.jpg"));
        assert_eq!(
            extract_photo_field(&json!({"ProfileImageUrl": "/images/ProfilePhoto/a.jpg"})).as_deref(),
            Some("/images/ProfilePhoto/a.jpg")
        );
        assert_eq!(
            extract_photo_field(&json!({"data": {"profileImageBase64": "data:image/png;base64,AA=="}}))
                .as_deref(),
            Some("data:image/png;base64,AA==")
        );
        assert_eq!(
            extract_photo_field(&json!({"photoUrl": "", "message": "ok"})),
            None
        );
        assert_eq!(extract_photo_field(&Value::Null), None);
    }
}
