use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{FollowQuery, FollowingUserView, SubscriptionsQuery, UserView},
    repo, services,
};
use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    error::ApiError,
    recipes::dto::Pagination,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/subscriptions", get(list_subscriptions))
        .route("/users/:id", get(get_user))
        .route("/users/:id/subscribe", post(subscribe).delete(unsubscribe))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = repo::list(&state.db, viewer, p.limit, p.offset).await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    let user = repo::user_view(&state.db, id, viewer)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SubscriptionsQuery>,
) -> Result<Json<Vec<FollowingUserView>>, ApiError> {
    let views =
        services::subscriptions(&state, user_id, q.limit, q.offset, q.recipes_limit).await?;
    Ok(Json(views))
}

#[instrument(skip(state))]
pub async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<FollowQuery>,
) -> Result<(StatusCode, Json<FollowingUserView>), ApiError> {
    let view = services::subscribe(&state, user_id, id, q.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::unsubscribe(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
