//! # Favorites Controller
//!
//! Owns the set of favorited recipe ids for exactly one signed-in user and is
//! the only thing that mutates it.
//!
//! ## Toggling
//!
//! A toggle runs in two phases so the heart icon can flip before the server
//! answers:
//!
//! 1. [`FavoritesController::begin_toggle`] flips membership locally, marks the
//!    id as pending and hands back a [`PendingToggle`].
//! 2. [`PendingToggle::settle`] issues the add/remove call. On success the
//!    flip stands; on failure it is reverted and [`FavoritesController::last_error`]
//!    is set.
//!
//! While an id is pending, further toggles on it are refused with
//! [`ToggleStart::InFlight`], so a rollback can never overwrite a newer
//! optimistic state. Other ids are unaffected.
//!
//! Signing out or switching user bumps a generation counter; a toggle that
//! settles under a different generation is dropped without touching the new
//! user's set. Dropping an unsettled [`PendingToggle`] reverts its flip.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::backend::FavoriteApi;
use crate::error::ClientError;
use crate::lock;
use crate::models::{RecipeId, UserId};

#[derive(Debug, Default)]
struct FavoriteState {
    user: Option<UserId>,
    generation: u64,
    ids: HashSet<RecipeId>,
    pending: HashSet<RecipeId>,
    loaded: bool,
    last_error: Option<String>,
}

/// Favorite membership for the signed-in user.
#[derive(Clone)]
pub struct FavoritesController<A: FavoriteApi> {
    api: A,
    state: Arc<Mutex<FavoriteState>>,
}

/// Outcome of [`FavoritesController::begin_toggle`].
pub enum ToggleStart<'a, A: FavoriteApi> {
    /// Nobody is signed in; nothing changed.
    SignedOut,
    /// A toggle for this id has not settled yet; nothing changed.
    InFlight,
    /// Membership was flipped locally and awaits the server.
    Started(PendingToggle<'a, A>),
}

/// An optimistic flip awaiting server confirmation.
#[must_use = "an unsettled toggle is rolled back when dropped"]
pub struct PendingToggle<'a, A: FavoriteApi> {
    controller: &'a FavoritesController<A>,
    user_id: UserId,
    recipe_id: RecipeId,
    target: bool,
    generation: u64,
    settled: bool,
}

impl<A: FavoriteApi> FavoritesController<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(FavoriteState::default())),
        }
    }

    /// Scope the controller to `user_id` and replace the set from the server.
    ///
    /// The previous user's set and pending toggles are dropped before the
    /// request, so a failed load leaves an empty, not-loaded set for the new
    /// user and its message in [`Self::last_error`].
    pub async fn load_for(&self, user_id: UserId) -> Result<(), ClientError> {
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.user = Some(user_id);
            state.ids.clear();
            state.pending.clear();
            state.loaded = false;
            state.last_error = None;
            state.generation
        };

        let result = self.api.list_favorites(user_id).await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!(user_id, "favorites load superseded, discarding");
            return Ok(());
        }
        match result {
            Ok(ids) => {
                state.ids = ids.into_iter().collect();
                state.loaded = true;
                debug!(user_id, count = state.ids.len(), "loaded favorites");
                Ok(())
            }
            Err(e) => {
                let err = ClientError::from(e);
                warn!(user_id, error = %err, "could not load favorites");
                state.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Forget the user and everything about them.
    pub fn clear(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.user = None;
        state.ids.clear();
        state.pending.clear();
        state.loaded = false;
        state.last_error = None;
    }

    pub fn user(&self) -> Option<UserId> {
        lock(&self.state).user
    }

    /// Whether the current user's set has been fetched successfully.
    pub fn is_loaded(&self) -> bool {
        lock(&self.state).loaded
    }

    pub fn contains(&self, recipe_id: RecipeId) -> bool {
        lock(&self.state).ids.contains(&recipe_id)
    }

    pub fn is_pending(&self, recipe_id: RecipeId) -> bool {
        lock(&self.state).pending.contains(&recipe_id)
    }

    /// Favorited ids, sorted.
    pub fn ids(&self) -> Vec<RecipeId> {
        let mut ids: Vec<RecipeId> = lock(&self.state).ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        lock(&self.state).ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The message for the most recent failed toggle, if the last toggle failed.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    /// Flip membership locally and reserve `recipe_id` until the returned toggle
    /// settles.
    pub fn begin_toggle(&self, recipe_id: RecipeId) -> ToggleStart<'_, A> {
        let mut state = lock(&self.state);
        let Some(user_id) = state.user else {
            return ToggleStart::SignedOut;
        };
        if !state.pending.insert(recipe_id) {
            debug!(recipe_id, "favorite toggle already in flight");
            return ToggleStart::InFlight;
        }

        let target = !state.ids.contains(&recipe_id);
        if target {
            state.ids.insert(recipe_id);
        } else {
            state.ids.remove(&recipe_id);
        }
        debug!(user_id, recipe_id, target, "optimistic favorite toggle");

        ToggleStart::Started(PendingToggle {
            controller: self,
            user_id,
            recipe_id,
            target,
            generation: state.generation,
            settled: false,
        })
    }

    /// Toggle and wait for the server. Signed out is a no-op; a toggle already
    /// in flight for this id is refused with [`ClientError::Busy`].
    pub async fn toggle(&self, recipe_id: RecipeId) -> Result<(), ClientError> {
        match self.begin_toggle(recipe_id) {
            ToggleStart::SignedOut => Ok(()),
            ToggleStart::InFlight => Err(ClientError::Busy),
            ToggleStart::Started(pending) => pending.settle().await,
        }
    }

    /// Undo a flip and release the id, unless the owner changed meanwhile.
    fn finish(&self, pending: &PendingToggle<'_, A>, outcome: Result<(), &ClientError>) {
        let mut state = lock(&self.state);
        if state.generation != pending.generation {
            debug!(
                recipe_id = pending.recipe_id,
                "favorite toggle settled after user change, discarding"
            );
            return;
        }
        state.pending.remove(&pending.recipe_id);
        match outcome {
            Ok(()) => state.last_error = None,
            Err(err) => {
                if pending.target {
                    state.ids.remove(&pending.recipe_id);
                } else {
                    state.ids.insert(pending.recipe_id);
                }
                state.last_error = Some(err.user_message());
            }
        }
    }

    fn abandon(&self, pending: &PendingToggle<'_, A>) {
        let mut state = lock(&self.state);
        if state.generation != pending.generation {
            return;
        }
        state.pending.remove(&pending.recipe_id);
        if pending.target {
            state.ids.remove(&pending.recipe_id);
        } else {
            state.ids.insert(pending.recipe_id);
        }
    }
}

impl<A: FavoriteApi> PendingToggle<'_, A> {
    pub fn recipe_id(&self) -> RecipeId {
        self.recipe_id
    }

    /// Membership after the toggle, if it succeeds.
    pub fn target(&self) -> bool {
        self.target
    }

    /// Issue the server call and commit or roll back.
    pub async fn settle(mut self) -> Result<(), ClientError> {
        let api = &self.controller.api;
        let result: Result<(), ClientError> = if self.target {
            api.add_favorite(self.user_id, self.recipe_id).await.map_err(Into::into)
        } else {
            api.remove_favorite(self.user_id, self.recipe_id).await.map_err(Into::into)
        };

        self.settled = true;
        match &result {
            Ok(()) => self.controller.finish(&self, Ok(())),
            Err(err) => {
                warn!(recipe_id = self.recipe_id, error = %err, "favorite toggle failed, rolling back");
                self.controller.finish(&self, Err(err));
            }
        }
        result
    }
}

impl<A: FavoriteApi> Drop for PendingToggle<'_, A> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(recipe_id = self.recipe_id, "unsettled favorite toggle dropped, rolling back");
            self.controller.abandon(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::memory::{MemoryBackend, Op};

    async fn signed_in(backend: &MemoryBackend) -> FavoritesController<MemoryBackend> {
        backend.set_favorites(1, vec![10]);
        let favorites = FavoritesController::new(backend.clone());
        favorites.load_for(1).await.unwrap();
        favorites
    }

    #[tokio::test]
    async fn test_load_for_replaces_set() {
        let backend = MemoryBackend::new();
        backend.set_favorites(2, vec![5, 6]);
        let favorites = signed_in(&backend).await;
        assert_eq!(favorites.ids(), vec![10]);

        favorites.load_for(2).await.unwrap();
        assert_eq!(favorites.user(), Some(2));
        assert_eq!(favorites.ids(), vec![5, 6]);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_membership() {
        let backend = MemoryBackend::new();
        let favorites = signed_in(&backend).await;

        favorites.toggle(20).await.unwrap();
        assert!(favorites.contains(20));
        assert_eq!(backend.favorites_of(1), vec![10, 20]);

        favorites.toggle(20).await.unwrap();
        assert!(!favorites.contains(20));
        assert_eq!(favorites.ids(), vec![10]);
        assert_eq!(backend.favorites_of(1), vec![10]);
        assert!(favorites.last_error().is_none());
    }

    #[tokio::test]
    async fn test_failed_toggle_rolls_back() {
        let backend = MemoryBackend::new();
        let favorites = signed_in(&backend).await;

        backend.fail_next(Op::RemoveFavorite, ApiError::Network("offline".into()));
        let err = favorites.toggle(10).await.unwrap_err();
        assert!(matches!(err, ClientError::Api(ApiError::Network(_))));
        assert!(favorites.contains(10));
        assert!(!favorites.is_pending(10));
        assert!(favorites.last_error().is_some());

        favorites.toggle(11).await.unwrap();
        assert!(favorites.last_error().is_none());
    }

    #[tokio::test]
    async fn test_optimistic_flip_precedes_server_call() {
        let backend = MemoryBackend::new();
        let favorites = signed_in(&backend).await;

        let ToggleStart::Started(pending) = favorites.begin_toggle(30) else {
            panic!("expected toggle to start");
        };
        assert!(favorites.contains(30));
        assert!(favorites.is_pending(30));
        assert_eq!(backend.calls(Op::AddFavorite), 0);

        pending.settle().await.unwrap();
        assert_eq!(backend.calls(Op::AddFavorite), 1);
        assert!(!favorites.is_pending(30));
    }

    #[tokio::test]
    async fn test_second_toggle_on_same_id_is_refused() {
        let backend = MemoryBackend::new();
        let favorites = signed_in(&backend).await;

        let ToggleStart::Started(first) = favorites.begin_toggle(30) else {
            panic!("expected toggle to start");
        };
        assert!(matches!(favorites.begin_toggle(30), ToggleStart::InFlight));
        assert!(matches!(favorites.toggle(30).await, Err(ClientError::Busy)));
        assert!(favorites.contains(30));

        // Another id is unaffected.
        favorites.toggle(10).await.unwrap();
        assert!(!favorites.contains(10));

        first.settle().await.unwrap();
        assert!(favorites.contains(30));
        assert_eq!(backend.calls(Op::AddFavorite), 1);
    }

    #[tokio::test]
    async fn test_signed_out_toggle_is_noop() {
        let backend = MemoryBackend::new();
        let favorites = FavoritesController::new(backend.clone());
        assert!(matches!(favorites.begin_toggle(1), ToggleStart::SignedOut));
        favorites.toggle(1).await.unwrap();
        assert!(favorites.is_empty());
        assert_eq!(backend.calls(Op::AddFavorite), 0);
    }

    #[tokio::test]
    async fn test_settle_after_user_change_is_discarded() {
        let backend = MemoryBackend::new();
        backend.set_favorites(2, vec![7]);
        let favorites = signed_in(&backend).await;

        let ToggleStart::Started(pending) = favorites.begin_toggle(40) else {
            panic!("expected toggle to start");
        };
        favorites.load_for(2).await.unwrap();

        backend.fail_next(Op::AddFavorite, ApiError::Network("offline".into()));
        let _ = pending.settle().await;
        assert_eq!(favorites.ids(), vec![7]);
        assert!(favorites.last_error().is_none());
    }

    #[tokio::test]
    async fn test_dropped_toggle_rolls_back() {
        let backend = MemoryBackend::new();
        let favorites = signed_in(&backend).await;

        match favorites.begin_toggle(10) {
            ToggleStart::Started(pending) => drop(pending),
            _ => panic!("expected toggle to start"),
        }
        assert!(favorites.contains(10));
        assert!(!favorites.is_pending(10));
    }

    #[tokio::test]
    async fn test_clear_on_sign_out() {
        let backend = MemoryBackend::new();
        let favorites = signed_in(&backend).await;
        favorites.clear();
        assert!(favorites.is_empty());
        assert_eq!(favorites.user(), None);
    }

    #[tokio::test]
    async fn test_failed_load_can_be_retried() {
        let backend = MemoryBackend::new();
        backend.set_favorites(1, vec![10]);
        let favorites = FavoritesController::new(backend.clone());

        backend.fail_next(Op::ListFavorites, ApiError::Network("offline".into()));
        assert!(favorites.load_for(1).await.is_err());
        assert_eq!(favorites.user(), Some(1));
        assert!(!favorites.is_loaded());
        assert!(favorites.last_error().is_some());

        favorites.load_for(1).await.unwrap();
        assert!(favorites.is_loaded());
        assert_eq!(favorites.ids(), vec![10]);
        assert_eq!(favorites.last_error(), None);
    }
}
