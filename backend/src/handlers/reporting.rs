//! HTTP handlers for inventory reporting endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reporting::DashboardMetrics;
use crate::services::ReportingService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub ingredient_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Inventory dashboard metrics for the kiosk
pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<DashboardMetrics>> {
    let service = ReportingService::new(state.storage);
    let metrics = service.dashboard(current_user.0.kiosk_id).await?;
    Ok(Json(metrics))
}

/// Export movement history as CSV
pub async fn export_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ReportingService::new(state.storage);
    let csv = service
        .export_movements_csv(
            current_user.0.kiosk_id,
            query.ingredient_id,
            query.start_date,
            query.end_date,
        )
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"movements.csv\"",
            ),
        ],
        csv,
    ))
}
