//! HTTP handlers for ingredient ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Ingredient;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::ingredients::{CreateIngredientInput, UpdateIngredientInput};
use crate::services::IngredientService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListIngredientsQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// List ingredients for the kiosk
pub async fn list_ingredients(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListIngredientsQuery>,
) -> AppResult<Json<Vec<Ingredient>>> {
    let service = IngredientService::new(state.storage);
    let ingredients = service
        .list(current_user.0.kiosk_id, query.include_inactive)
        .await?;
    Ok(Json(ingredients))
}

/// Create an ingredient
pub async fn create_ingredient(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateIngredientInput>,
) -> AppResult<Json<Ingredient>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = IngredientService::new(state.storage);
    let ingredient = service.create(current_user.0.kiosk_id, input).await?;
    Ok(Json(ingredient))
}

/// Get one ingredient
pub async fn get_ingredient(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    let service = IngredientService::new(state.storage);
    let ingredient = service.get(current_user.0.kiosk_id, ingredient_id).await?;
    Ok(Json(ingredient))
}

/// Update an ingredient's master data
pub async fn update_ingredient(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
    Json(input): Json<UpdateIngredientInput>,
) -> AppResult<Json<Ingredient>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = IngredientService::new(state.storage);
    let ingredient = service
        .update(current_user.0.kiosk_id, ingredient_id, input)
        .await?;
    Ok(Json(ingredient))
}

/// Soft-deactivate an ingredient
pub async fn deactivate_ingredient(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<Ingredient>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = IngredientService::new(state.storage);
    let ingredient = service
        .deactivate(current_user.0.kiosk_id, ingredient_id)
        .await?;
    Ok(Json(ingredient))
}

/// Hard delete an ingredient; refused while an active recipe references it
pub async fn delete_ingredient(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(ingredient_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = IngredientService::new(state.storage);
    service.delete(current_user.0.kiosk_id, ingredient_id).await?;
    Ok(Json(()))
}
