//! WebAssembly module for the Kiosk Management Platform
//!
//! Provides client-side computation for:
//! - Recipe cost calculations
//! - Required ingredient quantity previews
//! - Stock level classification
//! - Offline input validation

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Calculate a recipe's total cost from its ingredient list JSON
#[wasm_bindgen]
pub fn calculate_recipe_cost(ingredients_json: &str) -> Result<f64, JsValue> {
    let ingredients: Vec<RecipeIngredient> = serde_json::from_str(ingredients_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid ingredients JSON: {}", e)))?;

    let total = recipe_total_cost(&ingredients);
    Ok(total.to_string().parse().unwrap_or(0.0))
}

/// Required quantity of one ingredient for an order multiplier
#[wasm_bindgen]
pub fn calculate_required_quantity(per_unit: f64, multiplier: f64) -> f64 {
    let per_unit = Decimal::try_from(per_unit).unwrap_or(Decimal::ZERO);
    let multiplier = Decimal::try_from(multiplier).unwrap_or(Decimal::ZERO);
    required_quantity(per_unit, multiplier)
        .to_string()
        .parse()
        .unwrap_or(0.0)
}

/// Preview the stock level after applying a signed delta (clamped at zero)
#[wasm_bindgen]
pub fn preview_stock_after_delta(current: f64, signed_delta: f64) -> f64 {
    let current = Decimal::try_from(current).unwrap_or(Decimal::ZERO);
    let delta = Decimal::try_from(signed_delta).unwrap_or(Decimal::ZERO);
    clamp_stock(current, delta).to_string().parse().unwrap_or(0.0)
}

/// Classify stock against the reorder threshold ("ok", "low", "out")
#[wasm_bindgen]
pub fn classify_stock(current: f64, minimum: f64) -> String {
    let current = Decimal::try_from(current).unwrap_or(Decimal::ZERO);
    let minimum = Decimal::try_from(minimum).unwrap_or(Decimal::ZERO);
    format!("{}", classify_stock_level(current, minimum))
}

/// Validate a manual movement quantity before submission
#[wasm_bindgen]
pub fn is_valid_movement_quantity(quantity: f64) -> bool {
    Decimal::try_from(quantity)
        .map(|q| validate_movement_quantity(q).is_ok())
        .unwrap_or(false)
}
