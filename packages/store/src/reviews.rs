//! # Review Pager
//!
//! Caches review pages per `(recipe, page)` and the aggregate rating per recipe.
//! The aggregate is always fetched on its own so it covers every review, not
//! just the visible page.
//!
//! The cache never patches itself. Anything that changes a recipe's reviews
//! calls [`ReviewPager::invalidate`], and the next read refetches. A response
//! that arrives after an invalidation it raced with is returned to its caller
//! but not cached.
//!
//! Pages are 1-indexed. A page past the end comes back empty with the server's
//! `total_pages`; the pager does not clamp.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::backend::ReviewApi;
use crate::catalog::Catalog;
use crate::error::{ClientError, ValidationError};
use crate::lock;
use crate::models::{NewReview, RatingSummary, RecipeId, Review, ReviewPage, UserId};

/// Label for a review whose recipe is no longer in the catalog.
pub const DELETED_RECIPE_LABEL: &str = "Deleted recipe";

#[derive(Debug, Default)]
struct ReviewCache {
    pages: HashMap<(RecipeId, u32), ReviewPage>,
    ratings: HashMap<RecipeId, RatingSummary>,
    epoch: u64,
}

#[derive(Clone)]
pub struct ReviewPager<A: ReviewApi> {
    api: A,
    page_size: u32,
    cache: Arc<Mutex<ReviewCache>>,
}

impl<A: ReviewApi> ReviewPager<A> {
    pub fn new(api: A, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            cache: Arc::new(Mutex::new(ReviewCache::default())),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// One page of reviews, from cache if present.
    pub async fn get_page(&self, recipe_id: RecipeId, page: u32) -> Result<ReviewPage, ClientError> {
        let page = page.max(1);
        let epoch = {
            let cache = lock(&self.cache);
            if let Some(hit) = cache.pages.get(&(recipe_id, page)) {
                debug!(recipe_id, page, "review page cache hit");
                return Ok(hit.clone());
            }
            cache.epoch
        };

        let fetched = self.api.paged_reviews(recipe_id, page, self.page_size).await?;
        debug!(
            recipe_id,
            page,
            items = fetched.items.len(),
            total_pages = fetched.total_pages,
            "fetched review page"
        );

        let mut cache = lock(&self.cache);
        if cache.epoch == epoch {
            cache.pages.insert((recipe_id, page), fetched.clone());
        }
        Ok(fetched)
    }

    /// Aggregate rating over every review of the recipe.
    pub async fn rating(&self, recipe_id: RecipeId) -> Result<RatingSummary, ClientError> {
        let epoch = {
            let cache = lock(&self.cache);
            if let Some(hit) = cache.ratings.get(&recipe_id) {
                return Ok(*hit);
            }
            cache.epoch
        };

        let summary = self.api.average_rating(recipe_id).await?;
        let mut cache = lock(&self.cache);
        if cache.epoch == epoch {
            cache.ratings.insert(recipe_id, summary);
        }
        Ok(summary)
    }

    /// Post a review, then refetch the first page and the aggregate.
    ///
    /// The rating is checked before any request is made.
    pub async fn submit(&self, review: &NewReview) -> Result<(ReviewPage, RatingSummary), ClientError> {
        if !(1..=5).contains(&review.rating) {
            return Err(ValidationError::RatingOutOfRange(review.rating).into());
        }

        self.api.create_review(review).await?;
        debug!(recipe_id = review.recipe_id, "review submitted");
        self.invalidate(review.recipe_id);

        let page = self.get_page(review.recipe_id, 1).await?;
        let rating = self.rating(review.recipe_id).await?;
        Ok((page, rating))
    }

    /// Drop every cached page and the aggregate for one recipe.
    pub fn invalidate(&self, recipe_id: RecipeId) {
        let mut cache = lock(&self.cache);
        cache.pages.retain(|(id, _), _| *id != recipe_id);
        cache.ratings.remove(&recipe_id);
        cache.epoch += 1;
        debug!(recipe_id, "review cache invalidated");
    }

    pub fn invalidate_all(&self) {
        let mut cache = lock(&self.cache);
        cache.pages.clear();
        cache.ratings.clear();
        cache.epoch += 1;
    }

    /// Every review written by `user_id`, labelled with its recipe's name.
    pub async fn user_reviews(
        &self,
        user_id: UserId,
        catalog: &Catalog,
    ) -> Result<Vec<UserReview>, ClientError> {
        let reviews = self.api.all_reviews().await?;
        Ok(reviews
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .map(|review| UserReview {
                recipe_name: catalog
                    .get(review.recipe_id)
                    .and_then(|r| r.name.clone()),
                review,
            })
            .collect())
    }
}

/// A review on the author's profile page.
#[derive(Clone, Debug, PartialEq)]
pub struct UserReview {
    pub review: Review,
    pub recipe_name: Option<String>,
}

impl UserReview {
    pub fn recipe_label(&self) -> &str {
        self.recipe_name.as_deref().unwrap_or(DELETED_RECIPE_LABEL)
    }
}

/// The page numbers to show: at most `width`, centred on `current`. A page
/// within the first or last `width` pages shows that edge's full window, so
/// with 20 pages and a width of 7, pages 2 to 7 show 1..=7 and pages 14 to 19
/// show 14..=20 even though a centred window would fit.
///
/// ```
/// use store::page_window;
/// assert_eq!(page_window(1, 20, 7), 1..=7);
/// assert_eq!(page_window(10, 20, 7), 7..=13);
/// assert_eq!(page_window(15, 20, 7), 14..=20);
/// assert_eq!(page_window(2, 3, 7), 1..=3);
/// ```
pub fn page_window(current: u32, total: u32, width: u32) -> RangeInclusive<u32> {
    if total == 0 {
        return RangeInclusive::new(1, 0);
    }
    let width = width.max(1);
    if total <= width {
        return 1..=total;
    }
    let current = current.clamp(1, total);

    let start = if current <= width {
        1
    } else if current > total - width {
        total - width + 1
    } else {
        current - width / 2
    };
    start..=(start + width - 1)
}

/// Previous/next navigation around the page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageNav {
    pub current: u32,
    pub total: u32,
}

impl PageNav {
    pub fn new(current: u32, total: u32) -> Self {
        Self { current, total }
    }

    pub fn prev(&self) -> Option<u32> {
        (self.current > 1).then(|| self.current - 1)
    }

    pub fn next(&self) -> Option<u32> {
        (self.current < self.total).then(|| self.current + 1)
    }

    pub fn window(&self, width: u32) -> RangeInclusive<u32> {
        page_window(self.current, self.total, width)
    }
}
