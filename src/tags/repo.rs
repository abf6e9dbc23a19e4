use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Catalog entity; recipes reference tags but never create them.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub color: String,
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Tag>> {
    let rows = sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, name, slug, color
        FROM tags
        ORDER BY name
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn get(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Tag>> {
    let row = sqlx::query_as::<_, Tag>(
        r#"
        SELECT id, name, slug, color
        FROM tags
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Which of the given ids exist. The write composer diffs this against its
/// input to name the first unknown id.
pub async fn existing_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM tags WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
