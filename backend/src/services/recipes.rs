//! Recipe resolver service
//!
//! Maps sellable products to their bill of materials and keeps the derived
//! `total_cost` consistent with the ingredient list on every save.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{
    recipe_total_cost, AvailabilityCheck, MeasureUnit, MissingIngredient, Recipe, RecipeIngredient,
};
use shared::validation::{required_quantity, validate_recipe_ingredients};

use crate::error::{AppError, AppResult};
use crate::storage::{NewRecipe, Storage, StoreError};

/// Recipe resolver service
#[derive(Clone)]
pub struct RecipeService {
    storage: Storage,
}

/// One ingredient line as submitted by the recipe editor
#[derive(Debug, Deserialize)]
pub struct RecipeIngredientInput {
    pub ingredient_id: Uuid,
    pub quantity: Decimal,
    pub cost_per_portion: Decimal,
}

/// Input for creating a recipe
#[derive(Debug, Deserialize)]
pub struct CreateRecipeInput {
    pub product_id: Uuid,
    pub yield_quantity: Decimal,
    pub yield_unit: MeasureUnit,
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// Input for updating a recipe
#[derive(Debug, Deserialize)]
pub struct UpdateRecipeInput {
    pub yield_quantity: Option<Decimal>,
    pub yield_unit: Option<MeasureUnit>,
    pub ingredients: Option<Vec<RecipeIngredientInput>>,
    pub is_active: Option<bool>,
}

impl RecipeService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a recipe for a product
    pub async fn create(&self, kiosk_id: Uuid, input: CreateRecipeInput) -> AppResult<Recipe> {
        if input.yield_quantity <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Yield quantity must be positive".to_string(),
            ));
        }

        let ingredients = self.resolve_lines(kiosk_id, input.ingredients).await?;
        validate_recipe_ingredients(&ingredients)
            .map_err(|msg| AppError::ValidationError(msg.to_string()))?;

        let total_cost = Self::compute_cost(&ingredients);

        let recipe = self
            .storage
            .recipes
            .insert(NewRecipe {
                kiosk_id,
                product_id: input.product_id,
                yield_quantity: input.yield_quantity,
                yield_unit: input.yield_unit,
                ingredients,
                total_cost,
            })
            .await?;

        tracing::info!(
            recipe_id = %recipe.id,
            product_id = %recipe.product_id,
            kiosk_id = %kiosk_id,
            "Recipe created"
        );

        Ok(recipe)
    }

    /// Update a recipe; recomputes `total_cost` whenever the ingredient
    /// list changes
    pub async fn update(
        &self,
        kiosk_id: Uuid,
        id: Uuid,
        input: UpdateRecipeInput,
    ) -> AppResult<Recipe> {
        let mut recipe = self.storage.recipes.get(kiosk_id, id).await?;

        if let Some(yield_quantity) = input.yield_quantity {
            if yield_quantity <= Decimal::ZERO {
                return Err(AppError::ValidationError(
                    "Yield quantity must be positive".to_string(),
                ));
            }
            recipe.yield_quantity = yield_quantity;
        }
        if let Some(yield_unit) = input.yield_unit {
            recipe.yield_unit = yield_unit;
        }
        if let Some(lines) = input.ingredients {
            let ingredients = self.resolve_lines(kiosk_id, lines).await?;
            validate_recipe_ingredients(&ingredients)
                .map_err(|msg| AppError::ValidationError(msg.to_string()))?;
            recipe.total_cost = Self::compute_cost(&ingredients);
            recipe.ingredients = ingredients;
        }
        if let Some(is_active) = input.is_active {
            recipe.is_active = is_active;
        }

        recipe.updated_at = Utc::now();
        Ok(self.storage.recipes.update(&recipe).await?)
    }

    /// Get one recipe
    pub async fn get(&self, kiosk_id: Uuid, id: Uuid) -> AppResult<Recipe> {
        Ok(self.storage.recipes.get(kiosk_id, id).await?)
    }

    /// List recipes for a kiosk
    pub async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> AppResult<Vec<Recipe>> {
        Ok(self.storage.recipes.list(kiosk_id, include_inactive).await?)
    }

    /// The active recipe for a product, or `None` if the product is not
    /// stock-tracked
    pub async fn resolve_by_product(
        &self,
        kiosk_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<Recipe>> {
        Ok(self.storage.recipes.find_by_product(kiosk_id, product_id).await?)
    }

    /// Sum the per-portion costs of an ingredient list
    pub fn compute_cost(ingredients: &[RecipeIngredient]) -> Decimal {
        recipe_total_cost(ingredients)
    }

    /// Read-only availability preview for one recipe at a given multiplier
    ///
    /// Never mutates the ledger; used by the UI to warn before commit. A
    /// dangling ingredient reference counts as missing with zero available.
    pub async fn check_availability(
        &self,
        kiosk_id: Uuid,
        recipe: &Recipe,
        multiplier: Decimal,
    ) -> AppResult<AvailabilityCheck> {
        let mut missing = Vec::new();

        for line in &recipe.ingredients {
            let required = required_quantity(line.quantity, multiplier);
            let available = match self.storage.ingredients.get(kiosk_id, line.ingredient_id).await
            {
                Ok(ingredient) => ingredient.current_stock,
                Err(StoreError::NotFound(_)) => Decimal::ZERO,
                Err(e) => return Err(e.into()),
            };

            if available < required {
                missing.push(MissingIngredient {
                    ingredient_id: line.ingredient_id,
                    ingredient_name: line.ingredient_name.clone(),
                    required,
                    available,
                });
            }
        }

        Ok(AvailabilityCheck {
            available: missing.is_empty(),
            missing,
        })
    }

    /// Resolve editor input lines against the ledger, denormalizing name
    /// and unit from the referenced ingredients
    async fn resolve_lines(
        &self,
        kiosk_id: Uuid,
        lines: Vec<RecipeIngredientInput>,
    ) -> AppResult<Vec<RecipeIngredient>> {
        let mut resolved = Vec::with_capacity(lines.len());
        for line in lines {
            let ingredient = self
                .storage
                .ingredients
                .get(kiosk_id, line.ingredient_id)
                .await?;
            resolved.push(RecipeIngredient {
                ingredient_id: ingredient.id,
                ingredient_name: ingredient.name,
                quantity: line.quantity,
                unit: ingredient.unit,
                cost_per_portion: line.cost_per_portion,
            });
        }
        Ok(resolved)
    }
}
