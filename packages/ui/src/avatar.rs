use dioxus::prelude::*;
use store::resolve_photo;

use crate::icons::FaUser;
use crate::Icon;

/// Profile photo, or a placeholder glyph when there is none.
///
/// `version` is appended as a cache-busting query so a freshly uploaded photo
/// replaces the cached one under the same path.
#[component]
pub fn Avatar(
    photo: Option<String>,
    base_url: String,
    #[props(default)] version: Option<u64>,
    #[props(default = 40)] size: u32,
) -> Element {
    let source = resolve_photo(photo.as_deref(), &base_url)
        .map(|src| match version {
            Some(v) => src.with_cache_bust(v),
            None => src,
        });

    match source {
        Some(src) => rsx! {
            img {
                class: "avatar",
                src: "{src}",
                width: "{size}",
                height: "{size}",
                alt: "Profile photo",
            }
        },
        None => rsx! {
            span { class: "avatar avatar-placeholder",
                Icon { icon: FaUser, width: size, height: size }
            }
        },
    }
}

/// A token that changes on every call, for [`Avatar`]'s `version`.
pub fn cache_bust_token() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}
