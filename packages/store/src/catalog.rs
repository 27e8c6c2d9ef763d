//! # Catalog Filter
//!
//! Narrowing the recipe list by free text, category and pantry ingredients.
//! Filtering is a stable subset: matching recipes keep their catalog order.
//!
//! A recipe passes when all three hold:
//!
//! - **text**: the query is a case-insensitive substring of its name or
//!   category (missing fields count as empty);
//! - **category**: the filter is [`CategoryFilter::All`], or the recipe's
//!   category equals the selected one ignoring case and surrounding space;
//! - **ingredients**: the pantry is empty, or some pantry entry is a substring
//!   of some ingredient token (`"tomato"` matches `"tomato paste"`).
//!
//! `null` entries in the fetched list are skipped.

use tracing::debug;

use crate::backend::{FavoriteApi, RecipeApi};
use crate::error::ClientError;
use crate::favorites::FavoritesController;
use crate::models::{Recipe, RecipeId};

pub use crate::models::Ingredients;

/// The user's "what can I make" ingredient list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pantry {
    entries: Vec<String>,
}

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, normalised to trimmed lower case. Blank input is ignored.
    /// Returns whether anything was added.
    pub fn add(&mut self, entry: &str) -> bool {
        let entry = entry.trim().to_lowercase();
        if entry.is_empty() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Add every entry of a comma or newline separated list.
    pub fn add_all(&mut self, text: &str) {
        for part in text.split([',', '\n']) {
            self.add(part);
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<String> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matches(&self, recipe: &Recipe) -> bool {
        if self.is_empty() {
            return true;
        }
        let tokens = recipe.ingredient_tokens();
        self.entries
            .iter()
            .any(|wanted| tokens.iter().any(|token| token.contains(wanted.as_str())))
    }
}

/// The category selector's value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Named(String),
}

impl CategoryFilter {
    /// Parse a selector label. `All`, `Tümü` and the empty string select
    /// everything.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case("all") || label == "Tümü" {
            CategoryFilter::All
        } else {
            CategoryFilter::Named(label.to_string())
        }
    }

    fn matches(&self, recipe: &Recipe) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => {
                recipe.category().trim().to_lowercase() == name.trim().to_lowercase()
            }
        }
    }
}

/// Everything the filter bar holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub query: String,
    pub category: CategoryFilter,
    pub pantry: Pantry,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        let query = self.query.trim().to_lowercase();
        let text = query.is_empty()
            || recipe.name().to_lowercase().contains(&query)
            || recipe.category().to_lowercase().contains(&query);
        text && self.category.matches(recipe) && self.pantry.matches(recipe)
    }
}

/// The recipes passing `filter`, in their original order.
pub fn filter_recipes<'a>(recipes: &'a [Option<Recipe>], filter: &RecipeFilter) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .flatten()
        .filter(|recipe| filter.matches(recipe))
        .collect()
}

/// Distinct non-blank categories in first-seen order.
pub fn categories(recipes: &[Option<Recipe>]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for recipe in recipes.iter().flatten() {
        let category = recipe.category().trim();
        if !category.is_empty() && !seen.iter().any(|c| c == category) {
            seen.push(category.to_string());
        }
    }
    seen
}

/// One fetch's worth of recipes. Replaced wholesale on every load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    recipes: Vec<Option<Recipe>>,
}

impl Catalog {
    pub fn new(recipes: Vec<Option<Recipe>>) -> Self {
        Self { recipes }
    }

    /// Replace the contents with a fresh fetch. On failure the previous
    /// contents stay.
    pub async fn load<A: RecipeApi>(&mut self, api: &A) -> Result<(), ClientError> {
        let recipes = api.list_recipes().await?;
        debug!(count = recipes.len(), "loaded recipe catalog");
        self.recipes = recipes;
        Ok(())
    }

    pub fn recipes(&self) -> &[Option<Recipe>] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.iter().flatten().find(|r| r.id == id)
    }

    pub fn filter(&self, filter: &RecipeFilter) -> Vec<&Recipe> {
        filter_recipes(&self.recipes, filter)
    }

    pub fn categories(&self) -> Vec<String> {
        categories(&self.recipes)
    }

    /// Favorited recipes, in catalog order.
    pub fn favorites_of<A: FavoriteApi>(&self, favorites: &FavoritesController<A>) -> Vec<&Recipe> {
        self.recipes
            .iter()
            .flatten()
            .filter(|r| favorites.contains(r.id))
            .collect()
    }
}
