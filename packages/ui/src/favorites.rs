//! Favorites context and the heart button.
//!
//! The controller in [`store::FavoritesController`] holds the membership; the
//! UI only keeps a revision counter that is bumped whenever membership or the
//! pending set changes, so components re-render.

use dioxus::prelude::*;
use store::{RecipeId, ToggleStart};

use crate::auth::{report_error, use_app, use_auth};
use crate::icons::FaHeart;
use crate::notice::{use_notice, Notice};
use crate::Icon;

/// Revision of the favorites state. Read it to subscribe.
pub fn use_favorites() -> Signal<u64> {
    use_context::<Signal<u64>>()
}

/// Keeps the favorites controller in step with the signed-in user. A set that
/// failed to load is fetched again on the next run.
#[component]
pub fn FavoritesProvider(children: Element) -> Element {
    let app = use_app();
    let auth = use_auth();
    let notice = use_notice();
    let mut revision = use_signal(|| 0u64);

    use_effect(move || {
        let user_id = auth().user.map(|u| u.id);
        let app = app.clone();
        spawn(async move {
            match user_id {
                Some(id) if app.favorites().user() != Some(id) || !app.favorites().is_loaded() => {
                    if let Err(e) = app.favorites().load_for(id).await {
                        report_error(&app, auth, notice, &e);
                    }
                }
                Some(_) => {}
                None => app.favorites().clear(),
            }
            *revision.write() += 1;
        });
    });

    use_context_provider(|| revision);

    rsx! {
        {children}
    }
}

/// Heart toggle for one recipe. Disabled while its toggle is in flight.
#[component]
pub fn FavoriteButton(recipe_id: RecipeId) -> Element {
    let app = use_app();
    let auth = use_auth();
    let mut notice = use_notice();
    let mut revision = use_favorites();

    let _ = revision();
    let favorited = app.favorites().contains(recipe_id);
    let pending = app.favorites().is_pending(recipe_id);

    let onclick = move |_| {
        let app = app.clone();
        async move {
            match app.favorites().begin_toggle(recipe_id) {
                ToggleStart::SignedOut => {
                    notice.set(Some(Notice::info("Please sign in to save favorites.")));
                }
                ToggleStart::InFlight => {}
                ToggleStart::Started(toggle) => {
                    *revision.write() += 1;
                    let result = toggle.settle().await;
                    *revision.write() += 1;
                    if let Err(e) = result {
                        report_error(&app, auth, notice, &e);
                    }
                }
            }
        }
    };

    let class = if favorited {
        "favorite-button favorite-button-active"
    } else {
        "favorite-button"
    };
    let title = if favorited {
        "Remove from favorites"
    } else {
        "Add to favorites"
    };

    rsx! {
        button {
            class: "{class}",
            title: "{title}",
            disabled: pending,
            onclick: onclick,
            Icon { icon: FaHeart, width: 16, height: 16 }
        }
    }
}
