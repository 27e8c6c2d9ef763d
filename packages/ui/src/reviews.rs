use dioxus::prelude::*;
use store::PageNav;

use crate::auth::use_app;
use crate::icons::{FaChevronLeft, FaChevronRight, FaStar};
use crate::Icon;

/// Pager showing at most `width` page buttons around the current page.
/// `width` defaults to `[reviews] window` from the client config.
#[component]
pub fn PageWindowNav(
    current: u32,
    total: u32,
    #[props(default)] width: Option<u32>,
    on_select: EventHandler<u32>,
) -> Element {
    let app = use_app();
    let width = width.unwrap_or(app.config().reviews.window);
    let pager = PageNav::new(current, total);
    if total <= 1 {
        return rsx! {};
    }
    let prev = pager.prev();
    let next = pager.next();

    rsx! {
        nav { class: "page-nav",
            button {
                class: "page-nav-step",
                disabled: prev.is_none(),
                onclick: move |_| {
                    if let Some(p) = prev {
                        on_select.call(p);
                    }
                },
                Icon { icon: FaChevronLeft, width: 12, height: 12 }
            }
            for page in pager.window(width) {
                button {
                    key: "{page}",
                    class: page_class(page == pager.current),
                    onclick: move |_| on_select.call(page),
                    "{page}"
                }
            }
            button {
                class: "page-nav-step",
                disabled: next.is_none(),
                onclick: move |_| {
                    if let Some(n) = next {
                        on_select.call(n);
                    }
                },
                Icon { icon: FaChevronRight, width: 12, height: 12 }
            }
        }
    }
}

/// Five stars. Read-only without `on_change`.
#[component]
pub fn StarRating(value: u8, #[props(default)] on_change: Option<EventHandler<u8>>) -> Element {
    rsx! {
        div { class: "star-rating",
            for star in 1..=5u8 {
                span {
                    key: "{star}",
                    class: star_class(star <= value),
                    onclick: move |_| {
                        if let Some(handler) = on_change {
                            handler.call(star);
                        }
                    },
                    Icon { icon: FaStar, width: 14, height: 14 }
                }
            }
        }
    }
}

fn page_class(active: bool) -> &'static str {
    if active {
        "page-nav-item page-nav-item-active"
    } else {
        "page-nav-item"
    }
}

fn star_class(filled: bool) -> &'static str {
    if filled {
        "star star-filled"
    } else {
        "star"
    }
}
