//! Recipe models
//!
//! A recipe is the bill of materials for one sellable product: the ordered
//! ingredient list consumed per unit of yield, and the derived total cost.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MeasureUnit;

/// One line of a recipe's bill of materials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub ingredient_id: Uuid,
    /// Denormalized for display; the ledger remains the source of truth
    pub ingredient_name: String,
    /// Quantity consumed per unit of recipe yield
    pub quantity: Decimal,
    pub unit: MeasureUnit,
    pub cost_per_portion: Decimal,
}

/// The ingredient composition of one product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: Uuid,
    pub kiosk_id: Uuid,
    /// One recipe per product
    pub product_id: Uuid,
    pub yield_quantity: Decimal,
    pub yield_unit: MeasureUnit,
    pub ingredients: Vec<RecipeIngredient>,
    /// Always `Σ ingredients[i].cost_per_portion`; recomputed on every save
    pub total_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sum the per-portion costs of a recipe's ingredient list
pub fn recipe_total_cost(ingredients: &[RecipeIngredient]) -> Decimal {
    ingredients.iter().map(|i| i.cost_per_portion).sum()
}

/// One ingredient that cannot cover its required quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingIngredient {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub required: Decimal,
    pub available: Decimal,
}

/// Result of a read-only stock availability preview for a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheck {
    pub available: bool,
    pub missing: Vec<MissingIngredient>,
}
