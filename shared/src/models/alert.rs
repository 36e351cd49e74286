//! Stock alert models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of stock alert
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Stock at or below the reorder threshold
    LowStock,
    /// Stock fully depleted
    OutOfStock,
    /// Perishable stock nearing its expiry date
    ExpiringSoon,
    /// Perishable stock past its expiry date
    Expired,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::OutOfStock => "out_of_stock",
            AlertType::ExpiringSoon => "expiring_soon",
            AlertType::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low_stock" => Some(AlertType::LowStock),
            "out_of_stock" => Some(AlertType::OutOfStock),
            "expiring_soon" => Some(AlertType::ExpiringSoon),
            "expired" => Some(AlertType::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A derived notification that an ingredient crossed a threshold
///
/// At most one unresolved alert exists per (`kiosk_id`, `ingredient_id`)
/// at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAlert {
    pub id: Uuid,
    pub kiosk_id: Uuid,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub alert_type: AlertType,
    /// Stock level at the moment the alert was raised
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub is_read: bool,
    /// Terminal once set; resolution is always an explicit action
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
