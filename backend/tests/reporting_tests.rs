//! Reporting service tests

use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use kiosk_management_backend::services::deduction::RegisterMovementInput;
use kiosk_management_backend::services::ingredients::CreateIngredientInput;
use kiosk_management_backend::services::{DeductionService, IngredientService, ReportingService};
use kiosk_management_backend::storage::Storage;
use shared::models::{Ingredient, MeasureUnit, MovementType};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn seed_ingredient(
    storage: &Storage,
    kiosk_id: Uuid,
    name: &str,
    stock: &str,
    minimum: &str,
    cost: &str,
) -> Ingredient {
    IngredientService::new(storage.clone())
        .create(
            kiosk_id,
            CreateIngredientInput {
                name: name.to_string(),
                unit: MeasureUnit::Kg,
                initial_stock: Some(dec(stock)),
                minimum_stock: dec(minimum),
                maximum_stock: None,
                cost_per_unit: dec(cost),
                supplier: None,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn dashboard_aggregates_stock_levels_and_value() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    // ok: 10 kg at 2.00
    seed_ingredient(&storage, kiosk_id, "Flour", "10", "5", "2.00").await;
    // low: 3 kg at 4.00
    let sugar = seed_ingredient(&storage, kiosk_id, "Sugar", "4", "5", "4.00").await;
    // out: depleted via a movement so it also counts toward movements_today
    DeductionService::new(storage.clone())
        .register_movement(
            kiosk_id,
            user_id,
            RegisterMovementInput {
                ingredient_id: sugar.id,
                movement_type: MovementType::Out,
                quantity: dec("1"),
                reason: "waste".to_string(),
            },
        )
        .await
        .unwrap();
    seed_ingredient(&storage, kiosk_id, "Salt", "0", "2", "1.00").await;
    // inactive ingredients are excluded from the active aggregates
    let retired = seed_ingredient(&storage, kiosk_id, "Vanilla", "8", "1", "30.00").await;
    let service = IngredientService::new(storage.clone());
    service.deactivate(kiosk_id, retired.id).await.unwrap();

    let metrics = ReportingService::new(storage)
        .dashboard(kiosk_id)
        .await
        .unwrap();

    assert_eq!(metrics.total_ingredients, 4);
    assert_eq!(metrics.active_ingredients, 3);
    assert_eq!(metrics.low_stock_count, 1);
    assert_eq!(metrics.out_of_stock_count, 1);
    // 10*2.00 + 3*4.00 + 0*1.00
    assert_eq!(metrics.inventory_value, dec("32.00"));
    assert_eq!(metrics.movements_today, 1);
    // The sugar deduction crossed the threshold
    assert_eq!(metrics.open_alerts, 1);
}

#[tokio::test]
async fn dashboard_is_scoped_to_kiosk() {
    let storage = Storage::memory();
    let kiosk_a = Uuid::new_v4();
    let kiosk_b = Uuid::new_v4();
    seed_ingredient(&storage, kiosk_a, "Flour", "10", "5", "2.00").await;

    let metrics = ReportingService::new(storage)
        .dashboard(kiosk_b)
        .await
        .unwrap();
    assert_eq!(metrics.total_ingredients, 0);
    assert_eq!(metrics.inventory_value, Decimal::ZERO);
}

#[tokio::test]
async fn csv_export_contains_header_and_movement_rows() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let flour = seed_ingredient(&storage, kiosk_id, "Flour", "10", "2", "2.00").await;

    DeductionService::new(storage.clone())
        .register_movement(
            kiosk_id,
            user_id,
            RegisterMovementInput {
                ingredient_id: flour.id,
                movement_type: MovementType::Out,
                quantity: dec("3"),
                reason: "spillage".to_string(),
            },
        )
        .await
        .unwrap();

    let csv = ReportingService::new(storage)
        .export_movements_csv(kiosk_id, None, None, None)
        .await
        .unwrap();

    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("sequence,created_at,ingredient_id,movement_type"));

    let row = lines.next().unwrap();
    assert!(row.contains(&flour.id.to_string()));
    assert!(row.contains("out"));
    assert!(row.contains("spillage"));
    assert!(row.contains(&user_id.to_string()));
    assert!(lines.next().is_none());
}

#[tokio::test]
async fn csv_export_honors_ingredient_filter() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let flour = seed_ingredient(&storage, kiosk_id, "Flour", "10", "2", "2.00").await;
    let sugar = seed_ingredient(&storage, kiosk_id, "Sugar", "10", "2", "4.00").await;

    let service = DeductionService::new(storage.clone());
    for ingredient_id in [flour.id, sugar.id] {
        service
            .register_movement(
                kiosk_id,
                user_id,
                RegisterMovementInput {
                    ingredient_id,
                    movement_type: MovementType::Out,
                    quantity: dec("1"),
                    reason: "waste".to_string(),
                },
            )
            .await
            .unwrap();
    }

    let csv = ReportingService::new(storage)
        .export_movements_csv(kiosk_id, Some(flour.id), None, None)
        .await
        .unwrap();

    // Header plus exactly one data row
    assert_eq!(csv.lines().count(), 2);
    assert!(csv.contains(&flour.id.to_string()));
    assert!(!csv.contains(&sugar.id.to_string()));
}
