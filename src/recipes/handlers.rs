use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{RecipeListQuery, RecipePayload, RecipeShortView, RecipeView},
    services,
};
use crate::{
    auth::extractors::{AuthUser, MaybeAuthUser},
    error::ApiError,
    relations::{self, Relation},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/shopping_list", get(download_shopping_list))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route(
            "/recipes/:id",
            axum::routing::patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
        // inline base64 images arrive in the JSON body
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(q): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeView>>, ApiError> {
    let views = services::list_views(&state, viewer, &q).await?;
    Ok(Json(views))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeView>, ApiError> {
    let view = services::load_view(&state, id, viewer).await?;
    Ok(Json(view))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeView>), ApiError> {
    let view = services::create(&state, author_id, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipePayload>,
) -> Result<Json<RecipeView>, ApiError> {
    let view = services::update(&state, author_id, id, payload).await?;
    Ok(Json(view))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(author_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    services::delete(&state, author_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RecipeShortView>), ApiError> {
    let view = services::short_view(&state, id).await?;
    relations::link(&state.db, Relation::Favorite, user_id, id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !relations::unlink(&state.db, Relation::Favorite, user_id, id).await? {
        return Err(ApiError::NotFound("favorite"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RecipeShortView>), ApiError> {
    let view = services::short_view(&state, id).await?;
    relations::link(&state.db, Relation::ShoppingCart, user_id, id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !relations::unlink(&state.db, Relation::ShoppingCart, user_id, id).await? {
        return Err(ApiError::NotFound("shopping cart entry"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn download_shopping_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, String), ApiError> {
    let body = services::shopping_list_text(&state, user_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"shopping_list.txt\""),
    );
    Ok((headers, body))
}
