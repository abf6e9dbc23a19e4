use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, Ingredient};
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients))
        .route("/ingredients/:id", get(get_ingredient))
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(q): Query<IngredientQuery>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let rows = repo::list(&state.db, q.name.as_deref()).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ingredient>, ApiError> {
    let row = repo::get(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("ingredient"))?;
    Ok(Json(row))
}
