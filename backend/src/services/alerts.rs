//! Alert generator service
//!
//! Evaluates an ingredient's post-mutation state and raises threshold
//! alerts, deduplicated to at most one unresolved alert per
//! (kiosk, ingredient). An open alert is never escalated or auto-resolved;
//! resolution is always an explicit call.

use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{AlertType, Ingredient, StockAlert};

use crate::error::AppResult;
use crate::storage::{NewAlert, Storage, StoreError};

/// Alert generator service
#[derive(Clone)]
pub struct AlertService {
    storage: Storage,
}

impl AlertService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Evaluate one ingredient's state after a mutation
    ///
    /// Returns the newly created alert, or `None` when stock is above the
    /// threshold or an unresolved alert already covers this ingredient.
    pub async fn evaluate(&self, ingredient: &Ingredient) -> AppResult<Option<StockAlert>> {
        if ingredient.current_stock > ingredient.minimum_stock {
            return Ok(None);
        }

        // Dedup: an existing unresolved alert is left untouched, whatever
        // its type
        if self
            .storage
            .alerts
            .find_unresolved(ingredient.kiosk_id, ingredient.id)
            .await?
            .is_some()
        {
            return Ok(None);
        }

        let alert_type = if ingredient.current_stock == Decimal::ZERO {
            AlertType::OutOfStock
        } else {
            AlertType::LowStock
        };

        let result = self
            .storage
            .alerts
            .insert(NewAlert {
                kiosk_id: ingredient.kiosk_id,
                ingredient_id: ingredient.id,
                ingredient_name: ingredient.name.clone(),
                alert_type,
                current_stock: ingredient.current_stock,
                minimum_stock: ingredient.minimum_stock,
            })
            .await;

        match result {
            Ok(alert) => {
                tracing::warn!(
                    ingredient_id = %ingredient.id,
                    kiosk_id = %ingredient.kiosk_id,
                    alert_type = %alert.alert_type,
                    current_stock = %ingredient.current_stock,
                    minimum_stock = %ingredient.minimum_stock,
                    "Stock alert raised"
                );
                Ok(Some(alert))
            }
            // A concurrent mutation won the insert; the dedup invariant
            // holds, so this evaluation simply yields nothing new
            Err(StoreError::Conflict(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List alerts for a kiosk, optionally unread only
    pub async fn list(&self, kiosk_id: Uuid, unread_only: bool) -> AppResult<Vec<StockAlert>> {
        Ok(self.storage.alerts.list(kiosk_id, unread_only).await?)
    }

    /// Mark an alert as read
    pub async fn acknowledge(&self, kiosk_id: Uuid, alert_id: Uuid) -> AppResult<StockAlert> {
        Ok(self.storage.alerts.mark_read(kiosk_id, alert_id).await?)
    }

    /// Resolve an alert; terminal, no further transitions
    pub async fn resolve(&self, kiosk_id: Uuid, alert_id: Uuid) -> AppResult<StockAlert> {
        let alert = self.storage.alerts.resolve(kiosk_id, alert_id).await?;
        tracing::info!(alert_id = %alert_id, kiosk_id = %kiosk_id, "Stock alert resolved");
        Ok(alert)
    }
}
