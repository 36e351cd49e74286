//! HTTP handlers for stock alert endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::StockAlert;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AlertService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// List alerts for the kiosk
pub async fn list_alerts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListAlertsQuery>,
) -> AppResult<Json<Vec<StockAlert>>> {
    let service = AlertService::new(state.storage);
    let alerts = service
        .list(current_user.0.kiosk_id, query.unread_only)
        .await?;
    Ok(Json(alerts))
}

/// Mark an alert as read
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<StockAlert>> {
    let service = AlertService::new(state.storage);
    let alert = service
        .acknowledge(current_user.0.kiosk_id, alert_id)
        .await?;
    Ok(Json(alert))
}

/// Resolve an alert; terminal
pub async fn resolve_alert(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<StockAlert>> {
    let service = AlertService::new(state.storage);
    let alert = service.resolve(current_user.0.kiosk_id, alert_id).await?;
    Ok(Json(alert))
}
