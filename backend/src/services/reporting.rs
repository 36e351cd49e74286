//! Inventory reporting service
//!
//! Dashboard metrics and CSV export of the movement history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::models::StockLevel;

use crate::error::{AppError, AppResult};
use crate::storage::{MovementFilter, Storage};

/// Inventory reporting service
#[derive(Clone)]
pub struct ReportingService {
    storage: Storage,
}

/// Kiosk inventory dashboard metrics
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub total_ingredients: u64,
    pub active_ingredients: u64,
    pub low_stock_count: u64,
    pub out_of_stock_count: u64,
    pub open_alerts: u64,
    /// Σ current_stock × cost_per_unit over active ingredients
    pub inventory_value: Decimal,
    pub movements_today: u64,
}

impl ReportingService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Compute dashboard metrics for a kiosk
    pub async fn dashboard(&self, kiosk_id: Uuid) -> AppResult<DashboardMetrics> {
        let all = self.storage.ingredients.list(kiosk_id, true).await?;

        let mut active = 0u64;
        let mut low = 0u64;
        let mut out = 0u64;
        let mut value = Decimal::ZERO;

        for ingredient in all.iter().filter(|i| i.is_active) {
            active += 1;
            value += ingredient.stock_value();
            match ingredient.stock_level() {
                StockLevel::Low => low += 1,
                StockLevel::Out => out += 1,
                StockLevel::Ok => {}
            }
        }

        let open_alerts = self.storage.alerts.count_unresolved(kiosk_id).await?;

        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| AppError::Internal("Failed to compute start of day".to_string()))?;
        let movements_today = self.storage.movements.count_since(kiosk_id, midnight).await?;

        Ok(DashboardMetrics {
            total_ingredients: all.len() as u64,
            active_ingredients: active,
            low_stock_count: low,
            out_of_stock_count: out,
            open_alerts,
            inventory_value: value,
            movements_today,
        })
    }

    /// Export filtered movement history as CSV, newest first
    pub async fn export_movements_csv(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Option<Uuid>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<String> {
        let filter = MovementFilter {
            ingredient_id,
            start,
            end,
        };
        let movements = self.storage.movements.list(kiosk_id, &filter).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "sequence",
                "created_at",
                "ingredient_id",
                "movement_type",
                "quantity",
                "previous_stock",
                "new_stock",
                "reason",
                "order_id",
                "user_id",
            ])
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;

        for m in &movements {
            writer
                .write_record([
                    m.sequence.to_string(),
                    m.created_at.to_rfc3339(),
                    m.ingredient_id.to_string(),
                    m.movement_type.to_string(),
                    m.quantity.to_string(),
                    m.previous_stock.to_string(),
                    m.new_stock.to_string(),
                    m.reason.clone(),
                    m.order_id.map(|id| id.to_string()).unwrap_or_default(),
                    m.user_id.to_string(),
                ])
                .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding: {}", e)))
    }
}
