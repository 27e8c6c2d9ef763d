//! # Domain models and their wire shapes
//!
//! The remote API is not consistent about field names: the same value arrives as
//! `recipeId` or `id`, `reviewText` or `comment`, `profileImageBase64` or
//! `profileImageUrl`, and an aggregate rating is sometimes an object and sometimes
//! a bare number. Every struct here absorbs those variations at deserialisation
//! time (serde `alias`, untagged wire enums, `from` conversions) so that nothing
//! past this module ever sniffs shapes.
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Recipe`] | One catalog entry. Immutable on the client; replaced wholesale on every fetch. |
//! | [`Ingredients`] | A recipe's ingredient field, either one delimited string or a list. |
//! | [`User`] | The authenticated account as returned by login/register. |
//! | [`UserProfile`] | The 1:1 profile record; its raw photo field is resolved by [`crate::photo`]. |
//! | [`Review`] / [`ReviewPage`] / [`RatingSummary`] | Review data for one recipe. |
//! | [`NewReview`] | The body of a review submission. |
//! | [`FavoriteRecord`] | One entry of a user's favorites list. |

use serde::{Deserialize, Deserializer, Serialize};

pub type RecipeId = i64;
pub type UserId = i64;
pub type ReviewId = i64;

/// Treat an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A recipe from `GET /api/Recipe/GetRecipes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "recipeId", alias = "id")]
    pub id: RecipeId,
    #[serde(rename = "recipeName", alias = "name", default)]
    pub name: Option<String>,
    #[serde(alias = "recipeCategory", default)]
    pub category: Option<String>,
    #[serde(rename = "recipeIngredients", alias = "ingredients", default)]
    pub ingredients: Option<Ingredients>,
    #[serde(rename = "recipeInstructions", alias = "instructions", default)]
    pub instructions: Option<String>,
    #[serde(rename = "recipeDescription", alias = "description", default)]
    pub description: Option<String>,
    /// Raw image field; resolve with [`crate::photo::resolve_recipe_image`].
    #[serde(rename = "recipeImageUrl", alias = "imageUrl", default)]
    pub image: Option<String>,
    #[serde(alias = "recipeCalories", default)]
    pub calories: Option<f64>,
    #[serde(alias = "recipePrepTime", default)]
    pub prep_time: Option<f64>,
    #[serde(alias = "recipeIsVegetarian", default, deserialize_with = "null_as_default")]
    pub is_vegetarian: bool,
}

impl Recipe {
    /// Name for display and search; empty when the server sent none.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }

    /// Normalised ingredient tokens (see [`Ingredients::tokens`]).
    pub fn ingredient_tokens(&self) -> Vec<String> {
        self.ingredients
            .as_ref()
            .map(Ingredients::tokens)
            .unwrap_or_default()
    }
}

/// A recipe's ingredient field as the server sends it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ingredients {
    /// `"2 tomatoes, 1 onion\nsalt"`
    Text(String),
    /// `["2 tomatoes", "1 onion"]`
    List(Vec<String>),
}

impl Ingredients {
    /// Lower-cased, trimmed, non-empty tokens. Text is split on `,` and newlines.
    pub fn tokens(&self) -> Vec<String> {
        let normalise = |s: &str| s.trim().to_lowercase();
        match self {
            Ingredients::Text(text) => text
                .split([',', '\n'])
                .map(normalise)
                .filter(|s| !s.is_empty())
                .collect(),
            Ingredients::List(items) => items
                .iter()
                .map(|s| normalise(s))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// The signed-in account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userId", alias = "id")]
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
}

impl User {
    /// Username, falling back to the email address.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

/// Profile record, 1:1 with a [`User`].
///
/// Deserialises through [`ProfileRecord`] so the raw photo field is picked up from
/// whichever key the endpoint used; always serialises it as `profileImageBase64`,
/// which is what the update endpoint reads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ProfileRecord")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_profile_id: Option<i64>,
    pub user_id: UserId,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "profileImageBase64")]
    pub photo: Option<String>,
}

impl UserProfile {
    /// A fresh profile seeded from the account, every optional field empty.
    pub fn seeded_from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            ..Self::default()
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRecord {
    #[serde(default, alias = "UserProfileId")]
    user_profile_id: Option<i64>,
    #[serde(alias = "UserId")]
    user_id: UserId,
    #[serde(default, alias = "Username")]
    username: Option<String>,
    #[serde(default, alias = "Email")]
    email: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default, alias = "phone")]
    phone_number: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, alias = "ProfileImageBase64")]
    profile_image_base64: Option<String>,
    #[serde(default, alias = "ProfileImageUrl")]
    profile_image_url: Option<String>,
    #[serde(default, alias = "PhotoUrl")]
    photo_url: Option<String>,
}

impl From<ProfileRecord> for UserProfile {
    fn from(r: ProfileRecord) -> Self {
        let photo = [r.profile_image_base64, r.profile_image_url, r.photo_url]
            .into_iter()
            .flatten()
            .find(|p| !p.trim().is_empty());
        Self {
            user_profile_id: r.user_profile_id,
            user_id: r.user_id,
            username: r.username.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            bio: r.bio,
            location: r.location,
            website: r.website,
            phone_number: r.phone_number,
            date_of_birth: r.date_of_birth,
            created_at: r.created_at,
            photo,
        }
    }
}

/// One review of a recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "reviewId", alias = "id", default)]
    pub id: ReviewId,
    pub recipe_id: RecipeId,
    #[serde(default)]
    pub user_id: UserId,
    pub rating: u8,
    #[serde(
        rename = "reviewText",
        alias = "comment",
        default,
        deserialize_with = "null_as_default"
    )]
    pub body: String,
    /// Author display name, when the endpoint joins it in.
    #[serde(alias = "userName", default)]
    pub username: Option<String>,
}

/// One page of `GET /api/Review/PagedReviewsByRecipe`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
    #[serde(rename = "data", alias = "items", default, deserialize_with = "null_as_default")]
    pub items: Vec<Review>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Aggregate rating over all reviews of a recipe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RatingWire")]
pub struct RatingSummary {
    #[serde(rename = "averageRating")]
    pub average: f64,
    #[serde(rename = "reviewCount")]
    pub count: u32,
}

impl RatingSummary {
    /// The average with one decimal, e.g. `"4.3"`.
    pub fn display(&self) -> String {
        format!("{:.1}", self.average)
    }
}

/// The aggregate endpoint has returned both an object and a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RatingWire {
    Number(f64),
    Object {
        #[serde(rename = "averageRating", alias = "average", default)]
        average: Option<f64>,
        #[serde(rename = "reviewCount", alias = "count", default)]
        count: Option<u32>,
    },
}

impl From<RatingWire> for RatingSummary {
    fn from(wire: RatingWire) -> Self {
        match wire {
            RatingWire::Number(average) => Self { average, count: 0 },
            RatingWire::Object { average, count } => Self {
                average: average.unwrap_or(0.0),
                count: count.unwrap_or(0),
            },
        }
    }
}

/// Body of `POST /api/Review/CreateReview`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub recipe_id: RecipeId,
    pub user_id: UserId,
    pub review_text: String,
    pub rating: u8,
}

/// An entry of `GET /api/Favorite/GetUserFavorites/{userId}`: either a full
/// favorite object or just the recipe id.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FavoriteRecord {
    Id(RecipeId),
    Entry {
        #[serde(rename = "recipeId", alias = "id")]
        recipe_id: RecipeId,
    },
}

impl FavoriteRecord {
    pub fn recipe_id(&self) -> RecipeId {
        match self {
            FavoriteRecord::Id(id) => *id,
            FavoriteRecord::Entry { recipe_id } => *recipe_id,
        }
    }
}

/// Body (and query) of the add/remove favorite calls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_aliases() {
        let recipe: Recipe = serde_json::from_str(
            r#"{"id": 3, "name": "Soup", "recipeCategory": "Main",
                "ingredients": ["Tomato ", "Salt"], "recipeIsVegetarian": null}"#,
        )
        .unwrap();
        assert_eq!(recipe.id, 3);
        assert_eq!(recipe.name(), "Soup");
        assert_eq!(recipe.category(), "Main");
        assert!(!recipe.is_vegetarian);
        assert_eq!(recipe.ingredient_tokens(), vec!["tomato", "salt"]);

        let recipe: Recipe = serde_json::from_str(
            r#"{"recipeId": 4, "recipeName": "Pasta", "recipeIngredients": "Pasta,\n Tomato paste , ",
                "isVegetarian": true, "calories": 420, "prepTime": 25}"#,
        )
        .unwrap();
        assert_eq!(recipe.id, 4);
        assert_eq!(recipe.ingredient_tokens(), vec!["pasta", "tomato paste"]);
        assert!(recipe.is_vegetarian);
        assert_eq!(recipe.calories, Some(420.0));
        assert_eq!(recipe.category(), "");
    }

    #[test]
    fn test_profile_photo_field_shapes() {
        let p: UserProfile =
            serde_json::from_str(r#"{"userId": 1, "profileImageBase64": "data:image/png;base64,AA=="}"#)
                .unwrap();
        assert_eq!(p.photo.as_deref(), Some("data:image/png;base64,AA=="));

        let p: UserProfile = serde_json::from_str(
            r#"{"UserId": 1, "profileImageBase64": null, "ProfileImageUrl": "/images/ProfilePhoto/a.jpg"}"#,
        )
        .unwrap();
        assert_eq!(p.photo.as_deref(), Some("/images/ProfilePhoto/a.jpg"));
        assert_eq!(p.username, "");

        let p: UserProfile = serde_json::from_str(r#"{"userId": 1, "photoUrl": ""}"#).unwrap();
        assert_eq!(p.photo, None);
    }

    #[test]
    fn test_profile_serialises_canonical_photo_key() {
        let profile = UserProfile {
            user_id: 9,
            photo: Some("a.jpg".into()),
            ..UserProfile::default()
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["userId"], 9);
        assert_eq!(json["profileImageBase64"], "a.jpg");
        assert!(json["bio"].is_null());
        assert!(json.get("userProfileId").is_none());
    }

    #[test]
    fn test_rating_summary_shapes() {
        let r: RatingSummary =
            serde_json::from_str(r#"{"averageRating": 4.26, "reviewCount": 8}"#).unwrap();
        assert_eq!(r.count, 8);
        assert_eq!(r.display(), "4.3");

        let r: RatingSummary = serde_json::from_str("3.5").unwrap();
        assert_eq!(r.average, 3.5);
        assert_eq!(r.count, 0);
    }

    #[test]
    fn test_review_page_and_favorites() {
        let page: ReviewPage = serde_json::from_str(
            r#"{"data": [{"reviewId": 1, "recipeId": 2, "userId": 3, "rating": 5, "reviewText": null}],
                "totalPages": 3}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].body, "");
        assert_eq!(page.total_pages, 3);

        let favs: Vec<FavoriteRecord> =
            serde_json::from_str(r#"[{"recipeId": 4, "userId": 1}, 7]"#).unwrap();
        let ids: Vec<RecipeId> = favs.iter().map(FavoriteRecord::recipe_id).collect();
        assert_eq!(ids, vec![4, 7]);
    }
}
