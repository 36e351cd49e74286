//! Stock movement models
//!
//! Movements are the append-only audit trail of the ledger: every change to
//! an ingredient's stock produces exactly one movement capturing the
//! before/after values.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Manual stock intake (delivery, restock)
    In,
    /// Manual stock removal (waste, spoilage)
    Out,
    /// Manual correction after a physical count
    Adjustment,
    /// Automatic deduction driven by order fulfillment
    OrderDeduction,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
            MovementType::OrderDeduction => "order_deduction",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "in" => Some(MovementType::In),
            "out" => Some(MovementType::Out),
            "adjustment" => Some(MovementType::Adjustment),
            "order_deduction" => Some(MovementType::OrderDeduction),
            _ => None,
        }
    }

    /// Whether this movement type adds to stock
    pub fn is_inbound(&self) -> bool {
        matches!(self, MovementType::In | MovementType::Adjustment)
    }

    /// Turn an unsigned movement quantity into a signed stock delta
    pub fn signed_delta(&self, quantity: Decimal) -> Decimal {
        if self.is_inbound() {
            quantity
        } else {
            -quantity
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable audit record of one ledger change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: Uuid,
    pub kiosk_id: Uuid,
    pub ingredient_id: Uuid,
    pub movement_type: MovementType,
    /// Unsigned quantity; direction comes from `movement_type`
    pub quantity: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reason: String,
    /// Set only for `order_deduction` movements
    pub order_id: Option<Uuid>,
    pub user_id: Uuid,
    /// Monotonic per-store sequence; orders movements causally even when
    /// two share the same timestamp
    pub sequence: i64,
    pub created_at: DateTime<Utc>,
}
