//! Validation utilities and pure stock arithmetic for the Kiosk Management
//! Platform
//!
//! These functions are shared between the backend services and the WASM
//! bundle so the kiosk UI can pre-validate input and preview stock math
//! without a round trip.

use rust_decimal::Decimal;

use crate::models::RecipeIngredient;

// ============================================================================
// Stock Arithmetic
// ============================================================================

/// Apply a signed delta to a stock level, clamping at zero
///
/// The ledger never goes negative: a deduction larger than the available
/// stock drains it to zero instead of failing. Callers that need a hard
/// floor must check availability before applying the delta.
pub fn clamp_stock(previous: Decimal, signed_delta: Decimal) -> Decimal {
    (previous + signed_delta).max(Decimal::ZERO)
}

/// Quantity of one recipe ingredient required for a given order multiplier
pub fn required_quantity(per_unit: Decimal, multiplier: Decimal) -> Decimal {
    per_unit * multiplier
}

// ============================================================================
// Input Validations
// ============================================================================

/// Validate a manual movement quantity (must be strictly positive)
pub fn validate_movement_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate an ingredient name
pub fn validate_ingredient_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.len() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Validate stock threshold configuration for an ingredient
pub fn validate_stock_thresholds(
    minimum: Decimal,
    maximum: Option<Decimal>,
) -> Result<(), &'static str> {
    if minimum < Decimal::ZERO {
        return Err("Minimum stock cannot be negative");
    }
    if let Some(max) = maximum {
        if max < minimum {
            return Err("Maximum stock cannot be below minimum stock");
        }
    }
    Ok(())
}

/// Validate a recipe's ingredient list
pub fn validate_recipe_ingredients(ingredients: &[RecipeIngredient]) -> Result<(), &'static str> {
    if ingredients.is_empty() {
        return Err("Recipe must have at least one ingredient");
    }
    for line in ingredients {
        if line.quantity <= Decimal::ZERO {
            return Err("Recipe ingredient quantities must be positive");
        }
        if line.cost_per_portion < Decimal::ZERO {
            return Err("Recipe ingredient costs cannot be negative");
        }
    }
    Ok(())
}
