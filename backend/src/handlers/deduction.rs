//! HTTP handlers for the deduction engine entry points

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::models::{DeductionResult, OrderLine};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::DeductionService;
use crate::AppState;

/// Input for deducting one recipe
#[derive(Debug, Deserialize)]
pub struct DeductRecipeInput {
    pub recipe_id: Uuid,
    pub multiplier: Decimal,
    pub order_id: Uuid,
}

/// Input for deducting a whole order
#[derive(Debug, Deserialize)]
pub struct DeductOrderInput {
    pub order_id: Uuid,
    pub lines: Vec<OrderLine>,
}

/// Deduct stock for one recipe at an order multiplier
///
/// Per-ingredient failures land in `errors` with `success = false`; the
/// caller surfaces them to the operator but does not block order
/// completion.
pub async fn deduct_by_recipe(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DeductRecipeInput>,
) -> AppResult<Json<DeductionResult>> {
    let service = DeductionService::new(state.storage);
    let result = service
        .deduct_by_recipe(
            current_user.0.kiosk_id,
            input.recipe_id,
            input.multiplier,
            input.order_id,
            current_user.0.user_id,
        )
        .await?;

    // Webhook push happens after the stock locks are released
    state.notifier.dispatch(result.alerts.clone());

    Ok(Json(result))
}

/// Deduct stock for every recipe-backed line of an order
pub async fn deduct_for_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<DeductOrderInput>,
) -> AppResult<Json<DeductionResult>> {
    let service = DeductionService::new(state.storage);
    let result = service
        .deduct_for_order(
            current_user.0.kiosk_id,
            input.order_id,
            current_user.0.user_id,
            &input.lines,
        )
        .await?;

    state.notifier.dispatch(result.alerts.clone());

    Ok(Json(result))
}
