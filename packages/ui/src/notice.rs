//! The single user-visible message slot.

use dioxus::prelude::*;

use crate::icons::{FaCircleExclamation, FaCircleInfo, FaXmark};
use crate::Icon;

#[derive(Clone, Debug, PartialEq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub fn use_notice() -> Signal<Option<Notice>> {
    use_context::<Signal<Option<Notice>>>()
}

/// Provides the notice slot. A new notice replaces the previous one.
#[component]
pub fn NoticeProvider(children: Element) -> Element {
    let notice = use_signal(|| None::<Notice>);
    use_context_provider(|| notice);
    rsx! {
        {children}
    }
}

#[component]
pub fn NoticeBanner() -> Element {
    let mut notice = use_notice();
    let Some(current) = notice() else {
        return rsx! {};
    };
    let class = match current.level {
        NoticeLevel::Info => "notice notice-info",
        NoticeLevel::Error => "notice notice-error",
    };

    rsx! {
        div { class: "{class}", role: "alert",
            match current.level {
                NoticeLevel::Info => rsx! { Icon { icon: FaCircleInfo, width: 14, height: 14 } },
                NoticeLevel::Error => rsx! { Icon { icon: FaCircleExclamation, width: 14, height: 14 } },
            }
            span { class: "notice-message", "{current.message}" }
            button {
                class: "notice-dismiss",
                title: "Dismiss",
                onclick: move |_| notice.set(None),
                Icon { icon: FaXmark, width: 12, height: 12 }
            }
        }
    }
}
