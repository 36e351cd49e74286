//! Movement recorder service
//!
//! Appends one immutable audit entry per ledger mutation and serves the
//! history queries. Ordering relies on the store's monotonic sequence, not
//! on wall-clock timestamps, so same-millisecond writes cannot tie.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{Movement, MovementType};
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

use crate::error::AppResult;
use crate::storage::{MovementFilter, NewMovement, Storage};

/// Movement recorder service
#[derive(Clone)]
pub struct MovementService {
    storage: Storage,
}

impl MovementService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Append one movement; called exactly once per ledger mutation
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
        movement_type: MovementType,
        quantity: Decimal,
        previous_stock: Decimal,
        new_stock: Decimal,
        reason: String,
        user_id: Uuid,
        order_id: Option<Uuid>,
    ) -> AppResult<Movement> {
        let movement = self
            .storage
            .movements
            .append(NewMovement {
                kiosk_id,
                ingredient_id,
                movement_type,
                quantity,
                previous_stock,
                new_stock,
                reason,
                order_id,
                user_id,
            })
            .await?;

        tracing::debug!(
            movement_id = %movement.id,
            ingredient_id = %ingredient_id,
            movement_type = %movement_type,
            %quantity,
            "Movement recorded"
        );

        Ok(movement)
    }

    /// Filtered movement history, newest first
    pub async fn history(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Option<Uuid>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<Movement>> {
        let filter = MovementFilter {
            ingredient_id,
            start,
            end,
        };
        Ok(self.storage.movements.list(kiosk_id, &filter).await?)
    }

    /// Paginated kiosk-wide movement listing
    pub async fn history_paginated(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Option<Uuid>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Movement>> {
        let filter = MovementFilter {
            ingredient_id,
            start,
            end,
        };
        let (movements, total) = self
            .storage
            .movements
            .list_paginated(kiosk_id, &filter, &pagination)
            .await?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total),
            data: movements,
        })
    }
}
