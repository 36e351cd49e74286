//! Route definitions for the Kiosk Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - ingredient ledger
        .nest("/ingredients", ingredient_routes())
        // Protected routes - recipes
        .nest("/recipes", recipe_routes())
        // Protected routes - movement history and manual entries
        .nest("/movements", movement_routes())
        // Protected routes - stock alerts
        .nest("/alerts", alert_routes())
        // Protected routes - order-driven deduction
        .nest("/deductions", deduction_routes())
        // Protected routes - reporting
        .nest("/reports", reporting_routes())
}

/// Ingredient ledger routes (protected)
fn ingredient_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_ingredients).post(handlers::create_ingredient),
        )
        .route(
            "/:ingredient_id",
            get(handlers::get_ingredient)
                .put(handlers::update_ingredient)
                .delete(handlers::delete_ingredient),
        )
        .route(
            "/:ingredient_id/deactivate",
            post(handlers::deactivate_ingredient),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Recipe routes (protected)
fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_recipes).post(handlers::create_recipe))
        .route(
            "/:recipe_id",
            get(handlers::get_recipe).put(handlers::update_recipe),
        )
        .route(
            "/:recipe_id/availability",
            get(handlers::check_recipe_availability),
        )
        .route(
            "/by-product/:product_id",
            get(handlers::get_recipe_by_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Movement routes (protected)
fn movement_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::get_movement_history).post(handlers::register_movement),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Alert routes (protected)
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_alerts))
        .route("/:alert_id/read", post(handlers::acknowledge_alert))
        .route("/:alert_id/resolve", post(handlers::resolve_alert))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Deduction engine routes (protected)
fn deduction_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe", post(handlers::deduct_by_recipe))
        .route("/order", post(handlers::deduct_for_order))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Reporting routes (protected)
fn reporting_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/movements/export", get(handlers::export_movements))
        .route_layer(middleware::from_fn(auth_middleware))
}
