//! Deduction engine
//!
//! The only write path triggered by order fulfillment. For every ingredient
//! in a recipe it checks availability, applies the clamped deduction,
//! records the movement and evaluates alerts, all under that ingredient's
//! stock lock.
//!
//! Failures are handled per ingredient: a missing or short ingredient adds
//! an error entry and flips `success` to false, but siblings are still
//! processed. A recipe can therefore end up partially deducted; callers
//! surface `errors` to the operator instead of rolling back.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{
    DeductionLine, DeductionResult, Movement, MovementType, OrderLine, StockAlert,
};
use shared::validation::{clamp_stock, required_quantity, validate_movement_quantity};

use crate::error::{AppError, AppResult};
use crate::storage::{Storage, StoreError};

use super::{AlertService, IngredientService, MovementService};

/// Deduction engine service
#[derive(Clone)]
pub struct DeductionService {
    storage: Storage,
    ingredients: IngredientService,
    movements: MovementService,
    alerts: AlertService,
}

/// Input for a manual stock movement
#[derive(Debug, Deserialize)]
pub struct RegisterMovementInput {
    pub ingredient_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub reason: String,
}

/// Outcome of a manual stock movement
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegisterMovementOutcome {
    pub movement: Movement,
    pub new_stock: Decimal,
    /// Alert raised by this mutation, if any
    pub alert: Option<StockAlert>,
}

impl DeductionService {
    pub fn new(storage: Storage) -> Self {
        Self {
            ingredients: IngredientService::new(storage.clone()),
            movements: MovementService::new(storage.clone()),
            alerts: AlertService::new(storage.clone()),
            storage,
        }
    }

    /// Deduct stock for one recipe at the given order multiplier
    ///
    /// A missing recipe fails the whole call with no partial state. After
    /// that, every recipe ingredient is processed independently.
    pub async fn deduct_by_recipe(
        &self,
        kiosk_id: Uuid,
        recipe_id: Uuid,
        multiplier: Decimal,
        order_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<DeductionResult> {
        if multiplier <= Decimal::ZERO {
            return Err(AppError::ValidationError(
                "Multiplier must be positive".to_string(),
            ));
        }

        let recipe = match self.storage.recipes.get(kiosk_id, recipe_id).await {
            Ok(recipe) => recipe,
            Err(StoreError::NotFound(_)) => {
                let mut result = DeductionResult::new();
                result.push_error("Recipe not found");
                return Ok(result);
            }
            Err(e) => return Err(e.into()),
        };

        let mut result = DeductionResult::new();

        for line in &recipe.ingredients {
            // One atomic read-check-write-log-alert sequence per ingredient
            let lock = self.storage.locks.for_ingredient(kiosk_id, line.ingredient_id);
            let _guard = lock.lock().await;

            let ingredient = match self
                .storage
                .ingredients
                .get(kiosk_id, line.ingredient_id)
                .await
            {
                Ok(ingredient) => ingredient,
                Err(StoreError::NotFound(_)) => {
                    result.push_error(format!(
                        "Ingredient {} not found",
                        line.ingredient_name
                    ));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let required = required_quantity(line.quantity, multiplier);

            if ingredient.current_stock < required {
                tracing::warn!(
                    ingredient_id = %ingredient.id,
                    kiosk_id = %kiosk_id,
                    %required,
                    available = %ingredient.current_stock,
                    "Insufficient stock for order deduction"
                );
                result.push_error(format!(
                    "Insufficient stock for {}: required {}, available {}",
                    ingredient.name, required, ingredient.current_stock
                ));
                continue;
            }

            let update = self
                .ingredients
                .apply_delta(kiosk_id, ingredient.id, -required)
                .await?;

            self.movements
                .record(
                    kiosk_id,
                    ingredient.id,
                    MovementType::OrderDeduction,
                    required,
                    update.previous_stock,
                    update.new_stock,
                    format!("Order #{}", order_id),
                    user_id,
                    Some(order_id),
                )
                .await?;

            result.deductions.push(DeductionLine {
                ingredient_id: ingredient.id,
                ingredient_name: ingredient.name.clone(),
                quantity_deducted: required,
                new_stock: update.new_stock,
                is_low_stock: update.new_stock <= ingredient.minimum_stock,
            });

            if let Some(alert) = self.alerts.evaluate(&update.ingredient).await? {
                result.alerts.push(alert);
            }
        }

        tracing::info!(
            recipe_id = %recipe_id,
            order_id = %order_id,
            kiosk_id = %kiosk_id,
            success = result.success,
            deducted = result.deductions.len(),
            errors = result.errors.len(),
            "Order deduction completed"
        );

        Ok(result)
    }

    /// Deduct stock for a whole order
    ///
    /// Lines whose product has no active recipe are not stock-tracked and
    /// are skipped without error.
    pub async fn deduct_for_order(
        &self,
        kiosk_id: Uuid,
        order_id: Uuid,
        user_id: Uuid,
        lines: &[OrderLine],
    ) -> AppResult<DeductionResult> {
        let mut result = DeductionResult::new();

        for line in lines {
            let recipe = self
                .storage
                .recipes
                .find_by_product(kiosk_id, line.product_id)
                .await?;

            let Some(recipe) = recipe else {
                continue;
            };

            let line_result = self
                .deduct_by_recipe(kiosk_id, recipe.id, line.quantity, order_id, user_id)
                .await?;
            result.merge(line_result);
        }

        Ok(result)
    }

    /// Manual stock movement: restock, waste, or count correction
    ///
    /// The quantity is validated before any ledger read, so an invalid
    /// request has no partial effect. Outbound movements clamp at zero; no
    /// availability gate applies to manual entries.
    pub async fn register_movement(
        &self,
        kiosk_id: Uuid,
        user_id: Uuid,
        input: RegisterMovementInput,
    ) -> AppResult<RegisterMovementOutcome> {
        validate_movement_quantity(input.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
            message_es: "La cantidad debe ser positiva".to_string(),
        })?;

        if input.movement_type == MovementType::OrderDeduction {
            return Err(AppError::ValidationError(
                "Order deductions are recorded by the deduction engine, not manually".to_string(),
            ));
        }

        let lock = self.storage.locks.for_ingredient(kiosk_id, input.ingredient_id);
        let _guard = lock.lock().await;

        let ingredient = self.storage.ingredients.get(kiosk_id, input.ingredient_id).await?;

        let signed_delta = input.movement_type.signed_delta(input.quantity);
        let new_stock = clamp_stock(ingredient.current_stock, signed_delta);

        let update = self
            .ingredients
            .apply_delta(kiosk_id, ingredient.id, signed_delta)
            .await?;
        debug_assert_eq!(update.new_stock, new_stock);

        let movement = self
            .movements
            .record(
                kiosk_id,
                ingredient.id,
                input.movement_type,
                input.quantity,
                update.previous_stock,
                update.new_stock,
                input.reason,
                user_id,
                None,
            )
            .await?;

        let alert = self.alerts.evaluate(&update.ingredient).await?;

        Ok(RegisterMovementOutcome {
            movement,
            new_stock: update.new_stock,
            alert,
        })
    }
}
