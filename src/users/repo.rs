use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use super::dto::UserView;

pub async fn user_view(
    db: &PgPool,
    id: Uuid,
    viewer: Option<Uuid>,
) -> anyhow::Result<Option<UserView>> {
    let row = sqlx::query_as::<_, UserView>(
        r#"
        SELECT u.id, u.username, u.first_name, u.last_name, u.email,
               ($2::uuid IS NOT NULL AND u.id <> $2 AND EXISTS(
                   SELECT 1 FROM follows fo WHERE fo.user_id = $2 AND fo.author_id = u.id
               )) AS is_subscribed
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(id)
    .bind(viewer)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn user_views(
    db: &PgPool,
    ids: &[Uuid],
    viewer: Option<Uuid>,
) -> anyhow::Result<HashMap<Uuid, UserView>> {
    let rows = sqlx::query_as::<_, UserView>(
        r#"
        SELECT u.id, u.username, u.first_name, u.last_name, u.email,
               ($2::uuid IS NOT NULL AND u.id <> $2 AND EXISTS(
                   SELECT 1 FROM follows fo WHERE fo.user_id = $2 AND fo.author_id = u.id
               )) AS is_subscribed
        FROM users u
        WHERE u.id = ANY($1)
        "#,
    )
    .bind(ids)
    .bind(viewer)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|u| (u.id, u)).collect())
}

pub async fn list(
    db: &PgPool,
    viewer: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<UserView>> {
    let rows = sqlx::query_as::<_, UserView>(
        r#"
        SELECT u.id, u.username, u.first_name, u.last_name, u.email,
               ($1::uuid IS NOT NULL AND u.id <> $1 AND EXISTS(
                   SELECT 1 FROM follows fo WHERE fo.user_id = $1 AND fo.author_id = u.id
               )) AS is_subscribed
        FROM users u
        ORDER BY u.username
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(viewer)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Authors the user follows, most recent follow first.
pub async fn following_authors(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<UserView>> {
    let rows = sqlx::query_as::<_, UserView>(
        r#"
        SELECT u.id, u.username, u.first_name, u.last_name, u.email,
               TRUE AS is_subscribed
        FROM follows fo
        JOIN users u ON u.id = fo.author_id
        WHERE fo.user_id = $1
        ORDER BY fo.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
