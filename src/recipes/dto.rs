use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{IngredientAmountRow, RecipeRow, ShortRecipeRow};
use crate::{error::ApiError, tags::repo::Tag, users::dto::UserView};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub author: Option<Uuid>,
}

/// One (ingredient, amount) pair as submitted on create/update.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IngredientAmount {
    pub id: Uuid,
    pub amount: i32,
}

/// Request body for recipe create and update.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmount>,
}

impl RecipePayload {
    /// Field checks that need no store access. Runs before anything is
    /// decoded, uploaded or written.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::InvalidField {
                field: "name",
                message: "must not be empty".into(),
            });
        }
        if self.cooking_time <= 0 {
            return Err(ApiError::InvalidField {
                field: "cooking_time",
                message: "must be a positive number of minutes".into(),
            });
        }
        if self.tags.is_empty() {
            return Err(ApiError::EmptyCollection { field: "tags" });
        }
        if self.ingredients.is_empty() {
            return Err(ApiError::EmptyCollection {
                field: "ingredients",
            });
        }
        for item in &self.ingredients {
            if item.amount <= 0 {
                return Err(ApiError::InvalidField {
                    field: "ingredients",
                    message: format!("amount for ingredient {} must be positive", item.id),
                });
            }
        }
        let mut seen = std::collections::HashSet::new();
        for item in &self.ingredients {
            if !seen.insert(item.id) {
                return Err(ApiError::InvalidField {
                    field: "ingredients",
                    message: format!("ingredient {} is listed more than once", item.id),
                });
            }
        }
        Ok(())
    }

    /// Tag ids with duplicates dropped, first occurrence wins; the remaining
    /// order is the stored (and read) order.
    pub fn unique_tags(&self) -> Vec<Uuid> {
        let mut seen = std::collections::HashSet::new();
        self.tags
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// The outward representation of a recipe. Assembled from already-fetched
/// rows; building one has no side effects.
#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientAmountRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeView {
    pub fn project(
        recipe: RecipeRow,
        author: UserView,
        tags: Vec<Tag>,
        ingredients: Vec<IngredientAmountRow>,
        image_url: String,
    ) -> Self {
        Self {
            id: recipe.id,
            tags,
            author,
            ingredients,
            is_favorited: recipe.is_favorited,
            is_in_shopping_cart: recipe.is_in_shopping_cart,
            name: recipe.name,
            image: image_url,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Reduced recipe representation used in favorite/cart responses and in
/// subscription listings.
#[derive(Debug, Serialize)]
pub struct RecipeShortView {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeShortView {
    pub fn project(row: ShortRecipeRow, image_url: String) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image: image_url,
            cooking_time: row.cooking_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn payload() -> RecipePayload {
        RecipePayload {
            name: "Borscht".into(),
            text: "Simmer for an hour.".into(),
            cooking_time: 60,
            image: "data:image/png;base64,aGVsbG8=".into(),
            tags: vec![Uuid::new_v4()],
            ingredients: vec![
                IngredientAmount {
                    id: Uuid::new_v4(),
                    amount: 3,
                },
                IngredientAmount {
                    id: Uuid::new_v4(),
                    amount: 500,
                },
            ],
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_cooking_time() {
        let mut p = payload();
        p.cooking_time = 0;
        let err = p.validate().unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidField {
                field: "cooking_time",
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_tags_and_ingredients() {
        let mut p = payload();
        p.tags.clear();
        assert!(matches!(
            p.validate().unwrap_err(),
            ApiError::EmptyCollection { field: "tags" }
        ));

        let mut p = payload();
        p.ingredients.clear();
        assert!(matches!(
            p.validate().unwrap_err(),
            ApiError::EmptyCollection {
                field: "ingredients"
            }
        ));
    }

    #[test]
    fn rejects_non_positive_amount() {
        let mut p = payload();
        p.ingredients[1].amount = 0;
        assert!(matches!(
            p.validate().unwrap_err(),
            ApiError::InvalidField {
                field: "ingredients",
                ..
            }
        ));
    }

    #[test]
    fn rejects_duplicate_ingredient_ids() {
        let mut p = payload();
        let dup = p.ingredients[0];
        p.ingredients.push(dup);
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn unique_tags_keeps_first_occurrence_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut p = payload();
        p.tags = vec![a, b, a];
        assert_eq!(p.unique_tags(), vec![a, b]);
    }

    #[test]
    fn projection_preserves_ingredient_rows() {
        let recipe = RecipeRow {
            id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            name: "Borscht".into(),
            text: "Simmer.".into(),
            cooking_time: 60,
            image_key: "recipes/x/y.png".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            is_favorited: true,
            is_in_shopping_cart: false,
        };
        let author = UserView {
            id: recipe.author_id,
            username: "chef".into(),
            first_name: "".into(),
            last_name: "".into(),
            email: "chef@example.com".into(),
            is_subscribed: false,
        };
        let ingredients = vec![
            IngredientAmountRow {
                id: Uuid::new_v4(),
                name: "beet".into(),
                measurement_unit: "pcs".into(),
                amount: 3,
            },
            IngredientAmountRow {
                id: Uuid::new_v4(),
                name: "water".into(),
                measurement_unit: "ml".into(),
                amount: 500,
            },
        ];

        let view = RecipeView::project(
            recipe,
            author,
            vec![],
            ingredients,
            "https://media.test/recipes/x/y.png".into(),
        );

        assert_eq!(view.ingredients.len(), 2);
        assert_eq!(view.ingredients[0].amount, 3);
        assert_eq!(view.ingredients[1].amount, 500);
        assert!(view.is_favorited);
        assert!(!view.is_in_shopping_cart);
        assert_eq!(view.image, "https://media.test/recipes/x/y.png");
    }
}
