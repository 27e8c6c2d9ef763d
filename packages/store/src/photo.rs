//! # Photo Resolver
//!
//! Turns a raw photo field into something an `<img src>` can use. The profile
//! API has returned each of these shapes at some point:
//!
//! | Raw value | Resolved |
//! |-----------|----------|
//! | `None`, `""`, whitespace | `None` (caller shows a placeholder) |
//! | `https://cdn.example.com/a.jpg` | unchanged |
//! | `data:image/png;base64,...` | unchanged |
//! | `/images/ProfilePhoto/a.jpg` | `{base}/images/ProfilePhoto/a.jpg` |
//! | `a.jpg` | `{base}/images/ProfilePhoto/a.jpg` |
//! | `uploads/a.jpg` | `{base}/uploads/a.jpg` |
//!
//! Resolution is pure and idempotent: feeding a resolved value back in returns
//! it unchanged. Cache busting is a separate, explicit step
//! ([`ImageSource::with_cache_bust`]).

use std::fmt;

pub const PROFILE_PHOTO_DIR: &str = "/images/ProfilePhoto/";

/// A value usable directly as an image source.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageSource(String);

impl ImageSource {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Inline Base64 payload rather than a URL.
    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Append a uniqueness token so the browser refetches a replaced photo.
    /// Inline data is returned unchanged.
    pub fn with_cache_bust(&self, token: impl fmt::Display) -> ImageSource {
        if self.is_inline() {
            return self.clone();
        }
        let sep = if self.0.contains('?') { '&' } else { '?' };
        ImageSource(format!("{}{sep}v={token}", self.0))
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ImageSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_absolute(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

/// Resolve a raw profile photo field against the API base URL.
pub fn resolve_photo(raw: Option<&str>, base_url: &str) -> Option<ImageSource> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    let base = base_url.trim_end_matches('/');

    let resolved = if is_absolute(raw) || raw.starts_with("data:image/") {
        raw.to_string()
    } else if raw.starts_with('/') {
        format!("{base}{raw}")
    } else if !raw.contains('/') {
        format!("{base}{PROFILE_PHOTO_DIR}{raw}")
    } else {
        format!("{base}/{raw}")
    };
    Some(ImageSource(resolved))
}

/// Resolve a recipe's image field. Recipe images are stored relative to the
/// server root, sometimes written as `./images/x.jpg`.
pub fn resolve_recipe_image(raw: Option<&str>, base_url: &str) -> Option<ImageSource> {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty())?;
    if is_absolute(raw) || raw.starts_with("data:") {
        return Some(ImageSource(raw.to_string()));
    }
    let base = base_url.trim_end_matches('/');
    let path = raw.trim_start_matches("./").trim_start_matches('/');
    Some(ImageSource(format!("{base}/{path}")))
}
