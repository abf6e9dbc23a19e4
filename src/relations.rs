use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// The three join entities that share create-exactly-once semantics. Each
/// kind carries its table, target column and duplicate message, so every
/// caller goes through the same atomic insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Favorite,
    ShoppingCart,
    Follow,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Relation::Favorite => "favorites",
            Relation::ShoppingCart => "shopping_cart",
            Relation::Follow => "follows",
        }
    }

    fn target_column(self) -> &'static str {
        match self {
            Relation::Favorite | Relation::ShoppingCart => "recipe_id",
            Relation::Follow => "author_id",
        }
    }

    pub fn duplicate_message(self) -> &'static str {
        match self {
            Relation::Favorite => "recipe is already in favorites",
            Relation::ShoppingCart => "recipe is already in the shopping cart",
            Relation::Follow => "already subscribed to this author",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct RelationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug)]
pub enum LinkOutcome {
    Created(RelationRow),
    AlreadyExists,
}

fn insert_sql(kind: Relation) -> String {
    // Single round trip: the UNIQUE (user_id, target) constraint decides,
    // not a prior existence check, so concurrent identical requests cannot
    // both insert. No row back means the constraint fired.
    format!(
        "INSERT INTO {table} (user_id, {target}) VALUES ($1, $2) \
         ON CONFLICT DO NOTHING \
         RETURNING id, user_id, {target} AS target_id, created_at",
        table = kind.table(),
        target = kind.target_column(),
    )
}

fn delete_sql(kind: Relation) -> String {
    format!(
        "DELETE FROM {table} WHERE user_id = $1 AND {target} = $2",
        table = kind.table(),
        target = kind.target_column(),
    )
}

pub async fn create_unique(
    db: &PgPool,
    kind: Relation,
    user_id: Uuid,
    target_id: Uuid,
) -> anyhow::Result<LinkOutcome> {
    let row = sqlx::query_as::<_, RelationRow>(&insert_sql(kind))
        .bind(user_id)
        .bind(target_id)
        .fetch_optional(db)
        .await
        .with_context(|| format!("insert into {}", kind.table()))?;

    Ok(match row {
        Some(row) => LinkOutcome::Created(row),
        None => LinkOutcome::AlreadyExists,
    })
}

/// `create_unique` with the duplicate outcome mapped to the kind's error.
pub async fn link(
    db: &PgPool,
    kind: Relation,
    user_id: Uuid,
    target_id: Uuid,
) -> Result<RelationRow, ApiError> {
    match create_unique(db, kind, user_id, target_id).await? {
        LinkOutcome::Created(row) => Ok(row),
        LinkOutcome::AlreadyExists => Err(ApiError::DuplicateRelationship {
            message: kind.duplicate_message(),
        }),
    }
}

/// Removes the row, returning whether one existed.
pub async fn unlink(
    db: &PgPool,
    kind: Relation,
    user_id: Uuid,
    target_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(&delete_sql(kind))
        .bind(user_id)
        .bind(target_id)
        .execute(db)
        .await
        .with_context(|| format!("delete from {}", kind.table()))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_targets_its_own_table() {
        assert_eq!(Relation::Favorite.table(), "favorites");
        assert_eq!(Relation::ShoppingCart.table(), "shopping_cart");
        assert_eq!(Relation::Follow.table(), "follows");
        assert_eq!(Relation::Favorite.target_column(), "recipe_id");
        assert_eq!(Relation::Follow.target_column(), "author_id");
    }

    #[test]
    fn insert_is_a_single_conflict_guarded_statement() {
        for kind in [Relation::Favorite, Relation::ShoppingCart, Relation::Follow] {
            let sql = insert_sql(kind);
            assert!(sql.contains("ON CONFLICT DO NOTHING"), "{sql}");
            assert!(sql.contains("RETURNING"), "{sql}");
            assert!(sql.contains(kind.table()), "{sql}");
        }
    }

    #[test]
    fn duplicate_messages_name_the_relationship() {
        assert!(Relation::Favorite.duplicate_message().contains("favorites"));
        assert!(Relation::ShoppingCart
            .duplicate_message()
            .contains("shopping cart"));
        assert!(Relation::Follow.duplicate_message().contains("subscribed"));
    }
}
