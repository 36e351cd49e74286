//! Ingredient ledger service
//!
//! Owns the authoritative `current_stock` value per ingredient per kiosk.
//! Stock is mutated only through movement-producing operations; the plain
//! `update` path deliberately excludes `current_stock`.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{Ingredient, MeasureUnit};
use shared::validation::{clamp_stock, validate_ingredient_name, validate_stock_thresholds};

use crate::error::{AppError, AppResult};
use crate::storage::{NewIngredient, Storage};

/// Ingredient ledger service
#[derive(Clone)]
pub struct IngredientService {
    storage: Storage,
}

/// Input for creating an ingredient
#[derive(Debug, Deserialize)]
pub struct CreateIngredientInput {
    pub name: String,
    pub unit: MeasureUnit,
    pub initial_stock: Option<Decimal>,
    pub minimum_stock: Decimal,
    pub maximum_stock: Option<Decimal>,
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
}

/// Input for updating an ingredient's master data
///
/// `current_stock` is intentionally absent: stock changes go through the
/// movement-producing operations so the audit trail stays complete.
#[derive(Debug, Deserialize)]
pub struct UpdateIngredientInput {
    pub name: Option<String>,
    pub unit: Option<MeasureUnit>,
    pub minimum_stock: Option<Decimal>,
    pub maximum_stock: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier: Option<String>,
}

/// Outcome of one clamped ledger write
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    /// The ingredient as stored after the write
    pub ingredient: Ingredient,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
}

impl IngredientService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a new ingredient
    pub async fn create(
        &self,
        kiosk_id: Uuid,
        input: CreateIngredientInput,
    ) -> AppResult<Ingredient> {
        validate_ingredient_name(&input.name).map_err(|msg| validation("name", msg))?;
        validate_stock_thresholds(input.minimum_stock, input.maximum_stock)
            .map_err(|msg| validation("minimum_stock", msg))?;

        let initial_stock = input.initial_stock.unwrap_or(Decimal::ZERO);
        if initial_stock < Decimal::ZERO {
            return Err(validation("initial_stock", "Initial stock cannot be negative"));
        }
        if input.cost_per_unit < Decimal::ZERO {
            return Err(validation("cost_per_unit", "Cost per unit cannot be negative"));
        }

        let ingredient = self
            .storage
            .ingredients
            .insert(NewIngredient {
                kiosk_id,
                name: input.name.trim().to_string(),
                unit: input.unit,
                current_stock: initial_stock,
                minimum_stock: input.minimum_stock,
                maximum_stock: input.maximum_stock,
                cost_per_unit: input.cost_per_unit,
                supplier: input.supplier,
            })
            .await?;

        tracing::info!(
            ingredient_id = %ingredient.id,
            kiosk_id = %kiosk_id,
            "Ingredient created"
        );

        Ok(ingredient)
    }

    /// Get one ingredient
    pub async fn get(&self, kiosk_id: Uuid, id: Uuid) -> AppResult<Ingredient> {
        Ok(self.storage.ingredients.get(kiosk_id, id).await?)
    }

    /// List ingredients for a kiosk
    pub async fn list(
        &self,
        kiosk_id: Uuid,
        include_inactive: bool,
    ) -> AppResult<Vec<Ingredient>> {
        Ok(self.storage.ingredients.list(kiosk_id, include_inactive).await?)
    }

    /// Update an ingredient's master data
    pub async fn update(
        &self,
        kiosk_id: Uuid,
        id: Uuid,
        input: UpdateIngredientInput,
    ) -> AppResult<Ingredient> {
        let mut ingredient = self.storage.ingredients.get(kiosk_id, id).await?;

        if let Some(name) = input.name {
            validate_ingredient_name(&name).map_err(|msg| validation("name", msg))?;
            ingredient.name = name.trim().to_string();
        }
        if let Some(unit) = input.unit {
            ingredient.unit = unit;
        }
        if let Some(minimum) = input.minimum_stock {
            ingredient.minimum_stock = minimum;
        }
        if input.maximum_stock.is_some() {
            ingredient.maximum_stock = input.maximum_stock;
        }
        if let Some(cost) = input.cost_per_unit {
            if cost < Decimal::ZERO {
                return Err(validation("cost_per_unit", "Cost per unit cannot be negative"));
            }
            ingredient.cost_per_unit = cost;
        }
        if input.supplier.is_some() {
            ingredient.supplier = input.supplier;
        }

        validate_stock_thresholds(ingredient.minimum_stock, ingredient.maximum_stock)
            .map_err(|msg| validation("minimum_stock", msg))?;

        ingredient.updated_at = Utc::now();
        Ok(self.storage.ingredients.update(&ingredient).await?)
    }

    /// Soft-deactivate an ingredient; it stays in the ledger for history
    pub async fn deactivate(&self, kiosk_id: Uuid, id: Uuid) -> AppResult<Ingredient> {
        let mut ingredient = self.storage.ingredients.get(kiosk_id, id).await?;
        ingredient.is_active = false;
        ingredient.updated_at = Utc::now();

        tracing::info!(ingredient_id = %id, kiosk_id = %kiosk_id, "Ingredient deactivated");
        Ok(self.storage.ingredients.update(&ingredient).await?)
    }

    /// Hard delete; refused while an active recipe references the ingredient
    pub async fn delete(&self, kiosk_id: Uuid, id: Uuid) -> AppResult<()> {
        let in_use = self
            .storage
            .recipes
            .any_active_using_ingredient(kiosk_id, id)
            .await?;
        if in_use {
            return Err(AppError::Conflict {
                resource: "ingredient".to_string(),
                message: "Ingredient is referenced by an active recipe; deactivate it instead"
                    .to_string(),
                message_es: "El ingrediente está referenciado por una receta activa; \
                             desactívalo en su lugar"
                    .to_string(),
            });
        }

        self.storage.ingredients.delete(kiosk_id, id).await?;
        tracing::info!(ingredient_id = %id, kiosk_id = %kiosk_id, "Ingredient deleted");
        Ok(())
    }

    /// Apply a signed stock delta, clamping at zero
    ///
    /// The clamp means an over-large deduction drains stock to zero rather
    /// than failing here; callers needing a hard floor check availability
    /// first. Callers are also responsible for holding the ingredient's
    /// stock lock and for recording the movement.
    pub async fn apply_delta(
        &self,
        kiosk_id: Uuid,
        id: Uuid,
        signed_delta: Decimal,
    ) -> AppResult<LedgerUpdate> {
        let ingredient = self.storage.ingredients.get(kiosk_id, id).await?;
        let previous_stock = ingredient.current_stock;
        let new_stock = clamp_stock(previous_stock, signed_delta);

        let updated = self
            .storage
            .ingredients
            .update_stock(kiosk_id, id, new_stock)
            .await?;

        Ok(LedgerUpdate {
            ingredient: updated,
            previous_stock,
            new_stock,
        })
    }
}

fn validation(field: &str, message: &str) -> AppError {
    AppError::Validation {
        field: field.to_string(),
        message: message.to_string(),
        message_es: format!("Dato inválido: {}", field),
    }
}
