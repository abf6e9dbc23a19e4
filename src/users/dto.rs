use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::recipes::dto::RecipeShortView;

/// Public user representation with the viewer-relative subscription flag.
/// The flag is false for anonymous viewers and for the viewer themself.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_subscribed: bool,
}

/// A followed author together with a bounded sample of their recipes and
/// the unbounded total.
#[derive(Debug, Serialize)]
pub struct FollowingUserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeShortView>,
    pub recipes_count: i64,
}

impl FollowingUserView {
    pub fn project(user: UserView, recipes: Vec<RecipeShortView>, recipes_count: i64) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed: user.is_subscribed,
            recipes,
            recipes_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    /// Caps the embedded recipe list; the total count ignores it.
    pub recipes_limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FollowQuery {
    pub recipes_limit: Option<i64>,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserView {
        UserView {
            id: Uuid::new_v4(),
            username: "chef".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: "chef@example.com".into(),
            is_subscribed: true,
        }
    }

    #[test]
    fn recipes_count_is_independent_of_the_embedded_list() {
        let recipes = vec![
            RecipeShortView {
                id: Uuid::new_v4(),
                name: "Borscht".into(),
                image: "https://media.test/a.png".into(),
                cooking_time: 60,
            },
            RecipeShortView {
                id: Uuid::new_v4(),
                name: "Okroshka".into(),
                image: "https://media.test/b.png".into(),
                cooking_time: 15,
            },
        ];
        let view = FollowingUserView::project(user(), recipes, 5);
        assert_eq!(view.recipes.len(), 2);
        assert_eq!(view.recipes_count, 5);
        assert!(view.is_subscribed);
    }
}
