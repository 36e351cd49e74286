//! HTTP handlers for movement history and manual stock entries

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::Movement;
use shared::types::{PaginatedResponse, Pagination};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::deduction::{RegisterMovementInput, RegisterMovementOutcome};
use crate::services::{DeductionService, MovementService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct MovementHistoryQuery {
    pub ingredient_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MovementHistoryQuery {
    fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            per_page: self.per_page.unwrap_or(default.per_page),
        }
    }
}

/// Paginated movement history for the kiosk
pub async fn get_movement_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementHistoryQuery>,
) -> AppResult<Json<PaginatedResponse<Movement>>> {
    let service = MovementService::new(state.storage);
    let history = service
        .history_paginated(
            current_user.0.kiosk_id,
            query.ingredient_id,
            query.start_date,
            query.end_date,
            query.pagination(),
        )
        .await?;
    Ok(Json(history))
}

/// Register a manual stock movement (restock, waste, correction)
pub async fn register_movement(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterMovementInput>,
) -> AppResult<Json<RegisterMovementOutcome>> {
    if !current_user.0.can_manage_inventory() {
        return Err(AppError::InsufficientPermissions);
    }
    let service = DeductionService::new(state.storage);
    let outcome = service
        .register_movement(current_user.0.kiosk_id, current_user.0.user_id, input)
        .await?;

    // Webhook push happens after the stock lock is released
    if let Some(alert) = &outcome.alert {
        state.notifier.dispatch(vec![alert.clone()]);
    }

    Ok(Json(outcome))
}
