use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Catalog entity; referenced by recipes together with an amount.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

pub async fn list(db: &PgPool, name_prefix: Option<&str>) -> anyhow::Result<Vec<Ingredient>> {
    let rows = match name_prefix {
        Some(prefix) => {
            sqlx::query_as::<_, Ingredient>(
                r#"
                SELECT id, name, measurement_unit
                FROM ingredients
                WHERE name ILIKE $1 || '%'
                ORDER BY name
                "#,
            )
            .bind(prefix)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Ingredient>(
                r#"
                SELECT id, name, measurement_unit
                FROM ingredients
                ORDER BY name
                "#,
            )
            .fetch_all(db)
            .await?
        }
    };
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Ingredient>> {
    let row = sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT id, name, measurement_unit
        FROM ingredients
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn existing_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM ingredients WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
