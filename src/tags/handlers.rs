use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, Tag};
use crate::{error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags))
        .route("/tags/:id", get(get_tag))
}

#[instrument(skip(state))]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = repo::list(&state.db).await?;
    Ok(Json(tags))
}

#[instrument(skip(state))]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tag>, ApiError> {
    let tag = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("tag"))?;
    Ok(Json(tag))
}
