//! Authentication context and hooks for the UI.

use dioxus::prelude::*;
use store::{ClientConfig, ClientError, User};

use crate::kv::{make_state, ClientState};
use crate::notice::{use_notice, Notice};

/// Authentication state for the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

/// Get the current authentication state.
/// Returns a signal that updates when the user logs in or out.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// The shared client state provided by [`AuthProvider`].
pub fn use_app() -> ClientState {
    use_context::<ClientState>()
}

/// Provider component that owns the client state and the auth signal.
/// Wrap your app with this component (inside a [`crate::NoticeProvider`]).
#[component]
pub fn AuthProvider(#[props(default)] config: ClientConfig, children: Element) -> Element {
    let app = use_context_provider(|| make_state(config));
    let mut auth_state = use_signal(|| AuthState {
        user: app.session().user(),
        loading: true,
    });
    let mut notice = use_notice();

    // Reload user-scoped data for a persisted session on mount
    let _ = use_resource(move || {
        let app = app.clone();
        async move {
            if let Err(e) = app.restore().await {
                let message = app.handle_error(&e);
                notice.set(Some(Notice::error(message)));
            }
            auth_state.set(AuthState {
                user: app.session().user(),
                loading: false,
            });
        }
    });

    use_context_provider(|| auth_state);

    rsx! {
        {children}
    }
}

/// Sign in with credentials. The auth signal follows the stored session
/// whether or not the call succeeds.
pub async fn sign_in(
    app: &ClientState,
    mut auth_state: Signal<AuthState>,
    email: &str,
    password: &str,
) -> Result<(), ClientError> {
    let (user, token) = app.backend().login(email, password).await?;
    let result = app.sign_in(user, token).await;
    auth_state.set(AuthState {
        user: app.session().user(),
        loading: false,
    });
    result
}

/// Report an error through the global policy: a 401 ends the session and the
/// auth signal follows.
pub fn report_error(
    app: &ClientState,
    mut auth_state: Signal<AuthState>,
    mut notice: Signal<Option<Notice>>,
    err: &ClientError,
) {
    tracing::error!("{err}");
    let message = app.handle_error(err);
    if !app.session().is_signed_in() && auth_state().user.is_some() {
        auth_state.set(AuthState {
            user: None,
            loading: false,
        });
    }
    notice.set(Some(Notice::error(message)));
}

/// Login form posting to the account endpoint.
#[component]
pub fn LoginForm(#[props(default = "".to_string())] class: String) -> Element {
    let app = use_app();
    let auth_state = use_auth();
    let mut notice = use_notice();
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut loading = use_signal(|| false);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        let app = app.clone();
        async move {
            loading.set(true);
            match sign_in(&app, auth_state, &email(), &password()).await {
                Ok(()) => {
                    if let Some(message) = app.favorites().last_error() {
                        notice.set(Some(Notice::error(message)));
                    }
                }
                Err(e) => report_error(&app, auth_state, notice, &e),
            }
            loading.set(false);
        }
    };

    rsx! {
        form {
            class: "{class}",
            onsubmit: onsubmit,
            input {
                r#type: "email",
                placeholder: "Email",
                value: "{email}",
                oninput: move |evt| email.set(evt.value()),
            }
            input {
                r#type: "password",
                placeholder: "Password",
                value: "{password}",
                oninput: move |evt| password.set(evt.value()),
            }
            button {
                r#type: "submit",
                disabled: loading(),
                if loading() {
                    "Signing in..."
                } else {
                    "Sign in"
                }
            }
        }
    }
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Logout".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let app = use_app();
    let mut auth_state = use_auth();

    let onclick = move |_| {
        app.sign_out();
        auth_state.set(AuthState {
            user: None,
            loading: false,
        });
    };

    rsx! {
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
