use uuid::Uuid;

use super::{
    dto::{FollowingUserView, UserView},
    repo,
};
use crate::{
    error::ApiError,
    recipes::{self, dto::RecipeShortView},
    relations::{self, Relation},
    state::AppState,
};

/// Builds the subscription view for one author. The recipe list is bounded
/// in the query itself; the count ignores the bound.
pub async fn following_view(
    st: &AppState,
    author: UserView,
    recipes_limit: Option<i64>,
) -> Result<FollowingUserView, ApiError> {
    let rows = recipes::repo::by_author_short(&st.db, author.id, recipes_limit).await?;
    let mut short_views = Vec::with_capacity(rows.len());
    for row in rows {
        let image = st
            .storage
            .presign_get(&row.image_key, recipes::services::PRESIGN_TTL_SECS)
            .await?;
        short_views.push(RecipeShortView::project(row, image));
    }
    let recipes_count = recipes::repo::count_by_author(&st.db, author.id).await?;
    Ok(FollowingUserView::project(author, short_views, recipes_count))
}

pub async fn subscribe(
    st: &AppState,
    user_id: Uuid,
    author_id: Uuid,
    recipes_limit: Option<i64>,
) -> Result<FollowingUserView, ApiError> {
    if user_id == author_id {
        return Err(ApiError::InvalidReference {
            field: "author",
            id: author_id,
        });
    }
    if repo::user_view(&st.db, author_id, Some(user_id))
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("user"));
    }

    relations::link(&st.db, Relation::Follow, user_id, author_id).await?;

    // refetch so is_subscribed reflects the new row
    let author = repo::user_view(&st.db, author_id, Some(user_id))
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    following_view(st, author, recipes_limit).await
}

pub async fn unsubscribe(st: &AppState, user_id: Uuid, author_id: Uuid) -> Result<(), ApiError> {
    if !relations::unlink(&st.db, Relation::Follow, user_id, author_id).await? {
        return Err(ApiError::NotFound("subscription"));
    }
    Ok(())
}

pub async fn subscriptions(
    st: &AppState,
    user_id: Uuid,
    limit: i64,
    offset: i64,
    recipes_limit: Option<i64>,
) -> Result<Vec<FollowingUserView>, ApiError> {
    let authors = repo::following_authors(&st.db, user_id, limit, offset).await?;
    let mut views = Vec::with_capacity(authors.len());
    for author in authors {
        views.push(following_view(st, author, recipes_limit).await?);
    }
    Ok(views)
}
