use dioxus::prelude::*;
use store::Theme;

use crate::auth::use_app;
use crate::kv::ClientState;
use crate::icons::{FaMoon, FaSun};
use crate::Icon;

/// The active theme, provided as context by [`ThemeProvider`].
pub type ThemeSignal = Signal<Theme>;

/// Read the persisted theme. Light when nothing is stored.
pub fn load_theme_from_storage(app: &ClientState) -> Theme {
    app.session().theme()
}

/// Set `data-theme` on the document element.
pub fn apply_theme(theme: Theme) {
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.document_element())
        {
            let _ = el.set_attribute("data-theme", theme.as_str());
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    tracing::debug!(theme = theme.as_str(), "theme applied");
}

#[component]
pub fn ThemeProvider(children: Element) -> Element {
    let app = use_app();
    let theme: ThemeSignal = use_signal(|| load_theme_from_storage(&app));
    use_effect(move || apply_theme(theme()));
    use_context_provider(|| theme);
    rsx! {
        {children}
    }
}

#[component]
pub fn ThemeToggle() -> Element {
    let app = use_app();
    let mut theme = use_context::<ThemeSignal>();

    let onclick = move |_| {
        let next = theme().toggled();
        app.session().set_theme(next);
        theme.set(next);
    };

    rsx! {
        button {
            class: "theme-toggle",
            title: "Toggle theme",
            onclick: onclick,
            match theme() {
                Theme::Light => rsx! { Icon { icon: FaMoon, width: 14, height: 14 } },
                Theme::Dark => rsx! { Icon { icon: FaSun, width: 14, height: 14 } },
            }
        }
    }
}
