use anyhow::Context;
use uuid::Uuid;

use super::{
    dto::{IngredientAmount, RecipeListQuery, RecipePayload, RecipeShortView, RecipeView},
    image::{DecodedImage, ImagePayload},
    repo::{self, ShoppingListRow},
};
use crate::{error::ApiError, ingredients, state::AppState, tags, users};

pub const PRESIGN_TTL_SECS: u64 = 30 * 60;

fn recipe_image_key(author_id: Uuid, recipe_id: Uuid, extension: &str) -> String {
    format!("recipes/{}/{}.{}", author_id, recipe_id, extension)
}

/// Every submitted tag and ingredient id must resolve against the catalogs;
/// the first unknown id is reported.
async fn check_references(
    st: &AppState,
    tag_ids: &[Uuid],
    ingredients: &[IngredientAmount],
) -> Result<(), ApiError> {
    let known = tags::repo::existing_ids(&st.db, tag_ids).await?;
    if let Some(missing) = tag_ids.iter().copied().find(|id| !known.contains(id)) {
        return Err(ApiError::InvalidReference {
            field: "tags",
            id: missing,
        });
    }

    let ids: Vec<Uuid> = ingredients.iter().map(|i| i.id).collect();
    let known = ingredients::repo::existing_ids(&st.db, &ids).await?;
    if let Some(missing) = ids.iter().copied().find(|id| !known.contains(id)) {
        return Err(ApiError::InvalidReference {
            field: "ingredients",
            id: missing,
        });
    }
    Ok(())
}

async fn store_image(
    st: &AppState,
    author_id: Uuid,
    recipe_id: Uuid,
    image: &DecodedImage,
) -> anyhow::Result<String> {
    let key = recipe_image_key(author_id, recipe_id, &image.extension);
    st.storage
        .put_object(&key, image.bytes.clone(), &image.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

/// Read projection of one recipe for the given (possibly anonymous) viewer.
pub async fn load_view(
    st: &AppState,
    id: Uuid,
    viewer: Option<Uuid>,
) -> Result<RecipeView, ApiError> {
    let recipe = repo::fetch(&st.db, id, viewer)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    let author = users::repo::user_view(&st.db, recipe.author_id, viewer)
        .await?
        .context("recipe author row missing")?;
    let tags = repo::tags_for(&st.db, id).await?;
    let ingredients = repo::ingredients_for(&st.db, id).await?;
    let image = st
        .storage
        .presign_get(&recipe.image_key, PRESIGN_TTL_SECS)
        .await?;
    Ok(RecipeView::project(recipe, author, tags, ingredients, image))
}

pub async fn list_views(
    st: &AppState,
    viewer: Option<Uuid>,
    q: &RecipeListQuery,
) -> Result<Vec<RecipeView>, ApiError> {
    let rows = repo::list(&st.db, viewer, q.author, q.limit, q.offset).await?;
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<Uuid> = rows.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let mut tags = repo::tags_for_many(&st.db, &ids).await?;
    let mut ingredients = repo::ingredients_for_many(&st.db, &ids).await?;
    let authors = users::repo::user_views(&st.db, &author_ids, viewer).await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let author = authors
            .get(&row.author_id)
            .cloned()
            .context("recipe author row missing")?;
        let image = st
            .storage
            .presign_get(&row.image_key, PRESIGN_TTL_SECS)
            .await?;
        let id = row.id;
        views.push(RecipeView::project(
            row,
            author,
            tags.remove(&id).unwrap_or_default(),
            ingredients.remove(&id).unwrap_or_default(),
            image,
        ));
    }
    Ok(views)
}

pub async fn short_view(st: &AppState, id: Uuid) -> Result<RecipeShortView, ApiError> {
    let row = repo::short(&st.db, id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    let image = st
        .storage
        .presign_get(&row.image_key, PRESIGN_TTL_SECS)
        .await?;
    Ok(RecipeShortView::project(row, image))
}

/// Create the whole aggregate. The image goes to media storage first; the
/// recipe row, tag associations and ingredient rows then land in one
/// transaction, so readers never see a half-written recipe.
pub async fn create(
    st: &AppState,
    author_id: Uuid,
    payload: RecipePayload,
) -> Result<RecipeView, ApiError> {
    payload.validate()?;

    let image = match ImagePayload::decode(&payload.image)? {
        ImagePayload::Inline(image) => image,
        ImagePayload::Stored(_) => {
            return Err(ApiError::InvalidField {
                field: "image",
                message: "an inline base64 image is required".into(),
            })
        }
    };

    let tag_ids = payload.unique_tags();
    check_references(st, &tag_ids, &payload.ingredients).await?;

    let recipe_id = Uuid::new_v4();
    let image_key = store_image(st, author_id, recipe_id, &image).await?;

    let mut tx = st.db.begin().await.context("begin tx")?;
    repo::insert_tx(
        &mut tx,
        recipe_id,
        author_id,
        payload.name.trim(),
        &payload.text,
        payload.cooking_time,
        &image_key,
    )
    .await?;
    repo::replace_tags_tx(&mut tx, recipe_id, &tag_ids).await?;
    repo::replace_ingredients_tx(&mut tx, recipe_id, &payload.ingredients).await?;
    tx.commit().await.context("commit tx")?;

    tracing::info!(recipe_id = %recipe_id, author_id = %author_id, "recipe created");
    load_view(st, recipe_id, Some(author_id)).await
}

/// Update in place. Tag and ingredient sets are fully replaced inside the
/// same transaction as the scalar fields; validation runs first, so a
/// rejected payload leaves the stored rows untouched.
pub async fn update(
    st: &AppState,
    author_id: Uuid,
    recipe_id: Uuid,
    payload: RecipePayload,
) -> Result<RecipeView, ApiError> {
    let owner = repo::author_of(&st.db, recipe_id)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    if owner != author_id {
        return Err(ApiError::Forbidden);
    }

    payload.validate()?;

    let image_key = match ImagePayload::decode(&payload.image)? {
        ImagePayload::Inline(image) => store_image(st, author_id, recipe_id, &image).await?,
        // not an inline payload: keep the stored image
        ImagePayload::Stored(_) => {
            let recipe = repo::fetch(&st.db, recipe_id, None)
                .await?
                .ok_or(ApiError::NotFound("recipe"))?;
            recipe.image_key
        }
    };

    let tag_ids = payload.unique_tags();
    check_references(st, &tag_ids, &payload.ingredients).await?;

    let mut tx = st.db.begin().await.context("begin tx")?;
    repo::update_tx(
        &mut tx,
        recipe_id,
        payload.name.trim(),
        &payload.text,
        payload.cooking_time,
        &image_key,
    )
    .await?;
    repo::replace_tags_tx(&mut tx, recipe_id, &tag_ids).await?;
    repo::replace_ingredients_tx(&mut tx, recipe_id, &payload.ingredients).await?;
    tx.commit().await.context("commit tx")?;

    tracing::info!(recipe_id = %recipe_id, "recipe updated");
    load_view(st, recipe_id, Some(author_id)).await
}

pub async fn delete(st: &AppState, author_id: Uuid, recipe_id: Uuid) -> Result<(), ApiError> {
    let recipe = repo::fetch(&st.db, recipe_id, None)
        .await?
        .ok_or(ApiError::NotFound("recipe"))?;
    if recipe.author_id != author_id {
        return Err(ApiError::Forbidden);
    }
    repo::delete(&st.db, recipe_id).await?;
    // best effort; an orphaned object is not worth failing the request
    if let Err(e) = st.storage.delete_object(&recipe.image_key).await {
        tracing::warn!(error = %e, key = %recipe.image_key, "stored image not deleted");
    }
    tracing::info!(recipe_id = %recipe_id, "recipe deleted");
    Ok(())
}

pub fn render_shopping_list(rows: &[ShoppingListRow]) -> String {
    let mut out = String::from("Shopping list\n\n");
    for row in rows {
        out.push_str(&format!(
            "{} ({}): {}\n",
            row.name, row.measurement_unit, row.total
        ));
    }
    out
}

pub async fn shopping_list_text(st: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let rows = repo::shopping_list(&st.db, user_id).await?;
    Ok(render_shopping_list(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_key_carries_author_recipe_and_extension() {
        let author = Uuid::new_v4();
        let recipe = Uuid::new_v4();
        let key = recipe_image_key(author, recipe, "png");
        assert_eq!(key, format!("recipes/{}/{}.png", author, recipe));
    }

    #[test]
    fn shopping_list_renders_one_line_per_ingredient() {
        let rows = vec![
            ShoppingListRow {
                name: "beet".into(),
                measurement_unit: "pcs".into(),
                total: 7,
            },
            ShoppingListRow {
                name: "water".into(),
                measurement_unit: "ml".into(),
                total: 1500,
            },
        ];
        let text = render_shopping_list(&rows);
        assert!(text.contains("beet (pcs): 7"));
        assert!(text.contains("water (ml): 1500"));
        assert_eq!(text.lines().filter(|l| !l.is_empty()).count(), 3);
    }

    #[test]
    fn empty_cart_renders_header_only() {
        let text = render_shopping_list(&[]);
        assert_eq!(text, "Shopping list\n\n");
    }
}
