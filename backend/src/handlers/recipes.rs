//! HTTP handlers for recipe endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{AvailabilityCheck, Recipe};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::recipes::{CreateRecipeInput, UpdateRecipeInput};
use crate::services::RecipeService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListRecipesQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    /// Order quantity to multiply against per-unit ingredient quantities
    pub multiplier: Option<Decimal>,
}

/// List recipes for the kiosk
pub async fn list_recipes(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListRecipesQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    let service = RecipeService::new(state.storage);
    let recipes = service
        .list(current_user.0.kiosk_id, query.include_inactive)
        .await?;
    Ok(Json(recipes))
}

/// Create a recipe
pub async fn create_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<Json<Recipe>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = RecipeService::new(state.storage);
    let recipe = service.create(current_user.0.kiosk_id, input).await?;
    Ok(Json(recipe))
}

/// Get one recipe
pub async fn get_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    let service = RecipeService::new(state.storage);
    let recipe = service.get(current_user.0.kiosk_id, recipe_id).await?;
    Ok(Json(recipe))
}

/// Update a recipe; total cost is recomputed when the ingredient list
/// changes
pub async fn update_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Json(input): Json<UpdateRecipeInput>,
) -> AppResult<Json<Recipe>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = RecipeService::new(state.storage);
    let recipe = service
        .update(current_user.0.kiosk_id, recipe_id, input)
        .await?;
    Ok(Json(recipe))
}

/// The active recipe for a product, or 404 if the product is not
/// stock-tracked
pub async fn get_recipe_by_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<Recipe>> {
    let service = RecipeService::new(state.storage);
    let recipe = service
        .resolve_by_product(current_user.0.kiosk_id, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recipe".to_string()))?;
    Ok(Json(recipe))
}

/// Read-only stock availability preview for a recipe
pub async fn check_recipe_availability(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityCheck>> {
    let service = RecipeService::new(state.storage);
    let recipe = service.get(current_user.0.kiosk_id, recipe_id).await?;
    let multiplier = query.multiplier.unwrap_or(Decimal::ONE);
    let check = service
        .check_availability(current_user.0.kiosk_id, &recipe, multiplier)
        .await?;
    Ok(Json(check))
}
