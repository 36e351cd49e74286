//! Deduction engine result models
//!
//! `DeductionResult` is the per-call return value of the deduction engine.
//! It is never persisted; the persistent trace of a deduction is the set of
//! movements it records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StockAlert;

/// One successfully deducted ingredient within a deduction call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionLine {
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity_deducted: Decimal,
    pub new_stock: Decimal,
    pub is_low_stock: bool,
}

/// Aggregate outcome of one deduction call
///
/// The engine continues past per-ingredient failures, so a result can carry
/// both deductions and errors; `success` is false as soon as any ingredient
/// could not be fully deducted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionResult {
    pub success: bool,
    pub deductions: Vec<DeductionLine>,
    pub alerts: Vec<StockAlert>,
    pub errors: Vec<String>,
}

impl DeductionResult {
    pub fn new() -> Self {
        Self {
            success: true,
            deductions: Vec::new(),
            alerts: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Record a per-ingredient failure without aborting the batch
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.success = false;
        self.errors.push(message.into());
    }

    /// Fold another result into this one (used when an order spans
    /// several recipe-backed lines)
    pub fn merge(&mut self, other: DeductionResult) {
        self.success = self.success && other.success;
        self.deductions.extend(other.deductions);
        self.alerts.extend(other.alerts);
        self.errors.extend(other.errors);
    }
}

impl Default for DeductionResult {
    fn default() -> Self {
        Self::new()
    }
}

/// One order line handed to the fulfillment entry point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: Decimal,
}
