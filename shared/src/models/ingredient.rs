//! Ingredient and stock-level models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Units of measure for ingredients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MeasureUnit {
    Kg,
    G,
    Mg,
    L,
    Ml,
    Unit,
    Dozen,
    Pack,
}

impl MeasureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureUnit::Kg => "kg",
            MeasureUnit::G => "g",
            MeasureUnit::Mg => "mg",
            MeasureUnit::L => "l",
            MeasureUnit::Ml => "ml",
            MeasureUnit::Unit => "unit",
            MeasureUnit::Dozen => "dozen",
            MeasureUnit::Pack => "pack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "kg" => Some(MeasureUnit::Kg),
            "g" => Some(MeasureUnit::G),
            "mg" => Some(MeasureUnit::Mg),
            "l" => Some(MeasureUnit::L),
            "ml" => Some(MeasureUnit::Ml),
            "unit" => Some(MeasureUnit::Unit),
            "dozen" => Some(MeasureUnit::Dozen),
            "pack" => Some(MeasureUnit::Pack),
            _ => None,
        }
    }
}

impl std::fmt::Display for MeasureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stock-tracked raw material scoped to one kiosk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub kiosk_id: Uuid,
    pub name: String,
    pub unit: MeasureUnit,
    /// Stock on hand; every write clamps at zero, so this never goes negative
    pub current_stock: Decimal,
    /// Reorder threshold; stock at or below this level raises an alert
    pub minimum_stock: Decimal,
    pub maximum_stock: Option<Decimal>,
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ingredient {
    /// Classify this ingredient's current stock against its threshold
    pub fn stock_level(&self) -> StockLevel {
        classify_stock_level(self.current_stock, self.minimum_stock)
    }

    /// Total value of the stock on hand
    pub fn stock_value(&self) -> Decimal {
        self.current_stock * self.cost_per_unit
    }
}

/// Stock position relative to the reorder threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    /// Above the reorder threshold
    Ok,
    /// At or below the threshold but not empty
    Low,
    /// Fully depleted
    Out,
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockLevel::Ok => write!(f, "ok"),
            StockLevel::Low => write!(f, "low"),
            StockLevel::Out => write!(f, "out"),
        }
    }
}

/// Classify a stock quantity against a reorder threshold
pub fn classify_stock_level(current: Decimal, minimum: Decimal) -> StockLevel {
    if current <= Decimal::ZERO {
        StockLevel::Out
    } else if current <= minimum {
        StockLevel::Low
    } else {
        StockLevel::Ok
    }
}
