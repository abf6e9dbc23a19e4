use std::collections::HashMap;

use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::IngredientAmount;
use crate::tags::repo::Tag;

/// Recipe row with the two viewer-relative flags computed in the query.
/// Both are false for an anonymous viewer.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image_key: String,
    pub created_at: OffsetDateTime,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShortRecipeRow {
    pub id: Uuid,
    pub name: String,
    pub image_key: String,
    pub cooking_time: i32,
}

/// One flattened ingredient line of a recipe: catalog identity plus the
/// amount carried by the join row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IngredientAmountRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

pub async fn fetch(
    db: &PgPool,
    id: Uuid,
    viewer: Option<Uuid>,
) -> anyhow::Result<Option<RecipeRow>> {
    let row = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT r.id, r.author_id, r.name, r.text, r.cooking_time, r.image_key, r.created_at,
               ($2::uuid IS NOT NULL AND EXISTS(
                   SELECT 1 FROM favorites f WHERE f.user_id = $2 AND f.recipe_id = r.id
               )) AS is_favorited,
               ($2::uuid IS NOT NULL AND EXISTS(
                   SELECT 1 FROM shopping_cart sc WHERE sc.user_id = $2 AND sc.recipe_id = r.id
               )) AS is_in_shopping_cart
        FROM recipes r
        WHERE r.id = $1
        "#,
    )
    .bind(id)
    .bind(viewer)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn list(
    db: &PgPool,
    viewer: Option<Uuid>,
    author: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<RecipeRow>> {
    let rows = match author {
        Some(author) => {
            sqlx::query_as::<_, RecipeRow>(
                r#"
                SELECT r.id, r.author_id, r.name, r.text, r.cooking_time, r.image_key, r.created_at,
                       ($1::uuid IS NOT NULL AND EXISTS(
                           SELECT 1 FROM favorites f WHERE f.user_id = $1 AND f.recipe_id = r.id
                       )) AS is_favorited,
                       ($1::uuid IS NOT NULL AND EXISTS(
                           SELECT 1 FROM shopping_cart sc WHERE sc.user_id = $1 AND sc.recipe_id = r.id
                       )) AS is_in_shopping_cart
                FROM recipes r
                WHERE r.author_id = $2
                ORDER BY r.created_at DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(viewer)
            .bind(author)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, RecipeRow>(
                r#"
                SELECT r.id, r.author_id, r.name, r.text, r.cooking_time, r.image_key, r.created_at,
                       ($1::uuid IS NOT NULL AND EXISTS(
                           SELECT 1 FROM favorites f WHERE f.user_id = $1 AND f.recipe_id = r.id
                       )) AS is_favorited,
                       ($1::uuid IS NOT NULL AND EXISTS(
                           SELECT 1 FROM shopping_cart sc WHERE sc.user_id = $1 AND sc.recipe_id = r.id
                       )) AS is_in_shopping_cart
                FROM recipes r
                ORDER BY r.created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(viewer)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?
        }
    };
    Ok(rows)
}

pub async fn tags_for(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<Tag>> {
    let rows = sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name, t.slug, t.color
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY rt.position
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn tags_for_many(
    db: &PgPool,
    recipe_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<Tag>>> {
    #[derive(FromRow)]
    struct Row {
        recipe_id: Uuid,
        id: Uuid,
        name: String,
        slug: String,
        color: String,
    }

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT rt.recipe_id, t.id, t.name, t.slug, t.color
        FROM recipe_tags rt
        JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = ANY($1)
        ORDER BY rt.recipe_id, rt.position
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await?;

    let mut map: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for r in rows {
        map.entry(r.recipe_id).or_default().push(Tag {
            id: r.id,
            name: r.name,
            slug: r.slug,
            color: r.color,
        });
    }
    Ok(map)
}

pub async fn ingredients_for(
    db: &PgPool,
    recipe_id: Uuid,
) -> anyhow::Result<Vec<IngredientAmountRow>> {
    let rows = sqlx::query_as::<_, IngredientAmountRow>(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY ri.position
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn ingredients_for_many(
    db: &PgPool,
    recipe_ids: &[Uuid],
) -> anyhow::Result<HashMap<Uuid, Vec<IngredientAmountRow>>> {
    #[derive(FromRow)]
    struct Row {
        recipe_id: Uuid,
        id: Uuid,
        name: String,
        measurement_unit: String,
        amount: i32,
    }

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        ORDER BY ri.recipe_id, ri.position
        "#,
    )
    .bind(recipe_ids)
    .fetch_all(db)
    .await?;

    let mut map: HashMap<Uuid, Vec<IngredientAmountRow>> = HashMap::new();
    for r in rows {
        map.entry(r.recipe_id).or_default().push(IngredientAmountRow {
            id: r.id,
            name: r.name,
            measurement_unit: r.measurement_unit,
            amount: r.amount,
        });
    }
    Ok(map)
}

pub async fn author_of(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Option<Uuid>> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT author_id FROM recipes WHERE id = $1")
        .bind(recipe_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn short(db: &PgPool, id: Uuid) -> anyhow::Result<Option<ShortRecipeRow>> {
    let row = sqlx::query_as::<_, ShortRecipeRow>(
        r#"
        SELECT id, name, image_key, cooking_time
        FROM recipes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// An author's recipes, newest first. The limit is part of the query so the
/// store never materializes more rows than the caller asked for; NULL means
/// no limit.
pub async fn by_author_short(
    db: &PgPool,
    author_id: Uuid,
    limit: Option<i64>,
) -> anyhow::Result<Vec<ShortRecipeRow>> {
    let rows = sqlx::query_as::<_, ShortRecipeRow>(
        r#"
        SELECT id, name, image_key, cooking_time
        FROM recipes
        WHERE author_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(author_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_by_author(db: &PgPool, author_id: Uuid) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

// ---- transactional writes ----

pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    author_id: Uuid,
    name: &str,
    text: &str,
    cooking_time: i32,
    image_key: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO recipes (id, author_id, name, text, cooking_time, image_key)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(name)
    .bind(text)
    .bind(cooking_time)
    .bind(image_key)
    .execute(&mut **tx)
    .await
    .context("insert recipe")?;
    Ok(())
}

pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    name: &str,
    text: &str,
    cooking_time: i32,
    image_key: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE recipes
        SET name = $2, text = $3, cooking_time = $4, image_key = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(text)
    .bind(cooking_time)
    .bind(image_key)
    .execute(&mut **tx)
    .await
    .context("update recipe")?;
    Ok(())
}

/// Full replace: drop every tag association, then insert the submitted set
/// in order. Create goes through the same path; the delete is then a no-op.
pub async fn replace_tags_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("clear recipe tags")?;

    for (position, tag_id) in tag_ids.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO recipe_tags (recipe_id, tag_id, position)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(recipe_id)
        .bind(tag_id)
        .bind(position as i32)
        .execute(&mut **tx)
        .await
        .context("insert recipe tag")?;
    }
    Ok(())
}

/// Full replace of the owned ingredient rows, same shape as tags.
pub async fn replace_ingredients_tx(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    ingredients: &[IngredientAmount],
) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .context("clear recipe ingredients")?;

    for (position, item) in ingredients.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount, position)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(recipe_id)
        .bind(item.id)
        .bind(item.amount)
        .bind(position as i32)
        .execute(&mut **tx)
        .await
        .context("insert recipe ingredient")?;
    }
    Ok(())
}

/// Cascade removes the owned ingredient rows and tag associations.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete recipe")?;
    Ok(result.rows_affected() > 0)
}

/// Sums ingredient amounts across every recipe in the user's cart.
pub async fn shopping_list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ShoppingListRow>> {
    let rows = sqlx::query_as::<_, ShoppingListRow>(
        r#"
        SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total
        FROM shopping_cart sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
        GROUP BY i.name, i.measurement_unit
        ORDER BY i.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
