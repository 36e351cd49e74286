//! Movement recorder tests
//!
//! Covers the ledger/movement consistency invariant, causal ordering via
//! the monotonic sequence, and history filtering.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use kiosk_management_backend::services::deduction::RegisterMovementInput;
use kiosk_management_backend::services::ingredients::CreateIngredientInput;
use kiosk_management_backend::services::{DeductionService, IngredientService, MovementService};
use kiosk_management_backend::storage::Storage;
use shared::models::{Ingredient, MeasureUnit, MovementType};
use shared::types::Pagination;
use shared::validation::clamp_stock;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn seed_ingredient(storage: &Storage, kiosk_id: Uuid, name: &str, stock: &str) -> Ingredient {
    IngredientService::new(storage.clone())
        .create(
            kiosk_id,
            CreateIngredientInput {
                name: name.to_string(),
                unit: MeasureUnit::Kg,
                initial_stock: Some(dec(stock)),
                minimum_stock: dec("5"),
                maximum_stock: None,
                cost_per_unit: dec("1.00"),
                supplier: None,
            },
        )
        .await
        .unwrap()
}

async fn register(
    storage: &Storage,
    kiosk_id: Uuid,
    user_id: Uuid,
    ingredient_id: Uuid,
    movement_type: MovementType,
    quantity: &str,
) -> kiosk_management_backend::services::deduction::RegisterMovementOutcome {
    DeductionService::new(storage.clone())
        .register_movement(
            kiosk_id,
            user_id,
            RegisterMovementInput {
                ingredient_id,
                movement_type,
                quantity: dec(quantity),
                reason: "test".to_string(),
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn every_mutation_records_exactly_one_movement() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Flour", "20").await;

    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Out, "6").await;
    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::In, "10").await;
    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Adjustment, "1").await;

    let movements = MovementService::new(storage)
        .history(kiosk_id, Some(ingredient.id), None, None)
        .await
        .unwrap();
    assert_eq!(movements.len(), 3);
}

#[tokio::test]
async fn movements_carry_consistent_before_after_values() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Rice", "20").await;

    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Out, "8").await;
    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Out, "50").await;
    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::In, "30").await;

    let movements = MovementService::new(storage)
        .history(kiosk_id, Some(ingredient.id), None, None)
        .await
        .unwrap();

    for m in &movements {
        let signed = m.movement_type.signed_delta(m.quantity);
        assert_eq!(
            m.new_stock,
            clamp_stock(m.previous_stock, signed),
            "movement {} violates the clamp invariant",
            m.id
        );
    }
}

#[tokio::test]
async fn history_is_ordered_by_sequence_newest_first() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Oats", "100").await;

    for _ in 0..5 {
        register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Out, "1").await;
    }

    let movements = MovementService::new(storage)
        .history(kiosk_id, Some(ingredient.id), None, None)
        .await
        .unwrap();

    // Strictly descending sequence; no same-millisecond ties possible
    for pair in movements.windows(2) {
        assert!(pair[0].sequence > pair[1].sequence);
    }

    // Consecutive movements chain: each previous_stock equals the next
    // (older) movement's new_stock
    for pair in movements.windows(2) {
        assert_eq!(pair[0].previous_stock, pair[1].new_stock);
    }
}

#[tokio::test]
async fn history_filters_by_ingredient() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let flour = seed_ingredient(&storage, kiosk_id, "Flour", "50").await;
    let sugar = seed_ingredient(&storage, kiosk_id, "Sugar", "50").await;

    register(&storage, kiosk_id, user_id, flour.id, MovementType::Out, "2").await;
    register(&storage, kiosk_id, user_id, sugar.id, MovementType::Out, "3").await;
    register(&storage, kiosk_id, user_id, flour.id, MovementType::In, "5").await;

    let service = MovementService::new(storage);
    let flour_history = service
        .history(kiosk_id, Some(flour.id), None, None)
        .await
        .unwrap();
    assert_eq!(flour_history.len(), 2);
    assert!(flour_history.iter().all(|m| m.ingredient_id == flour.id));

    let all = service.history(kiosk_id, None, None, None).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn history_filters_by_date_range() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Tea", "50").await;

    register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Out, "2").await;

    let service = MovementService::new(storage);
    let now = chrono::Utc::now();

    let within = service
        .history(
            kiosk_id,
            None,
            Some(now - chrono::Duration::hours(1)),
            Some(now + chrono::Duration::hours(1)),
        )
        .await
        .unwrap();
    assert_eq!(within.len(), 1);

    let before = service
        .history(
            kiosk_id,
            None,
            Some(now - chrono::Duration::hours(2)),
            Some(now - chrono::Duration::hours(1)),
        )
        .await
        .unwrap();
    assert!(before.is_empty());
}

#[tokio::test]
async fn paginated_history_reports_totals() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Coffee", "100").await;

    for _ in 0..7 {
        register(&storage, kiosk_id, user_id, ingredient.id, MovementType::Out, "1").await;
    }

    let page = MovementService::new(storage)
        .history_paginated(
            kiosk_id,
            None,
            None,
            None,
            Pagination {
                page: 2,
                per_page: 3,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.data.len(), 3);
    assert_eq!(page.pagination.total_items, 7);
    assert_eq!(page.pagination.total_pages, 3);
}

#[tokio::test]
async fn invalid_quantity_is_rejected_before_any_ledger_effect() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Honey", "10").await;

    let service = DeductionService::new(storage.clone());
    for quantity in ["0", "-3"] {
        let result = service
            .register_movement(
                kiosk_id,
                user_id,
                RegisterMovementInput {
                    ingredient_id: ingredient.id,
                    movement_type: MovementType::Out,
                    quantity: dec(quantity),
                    reason: "bad".to_string(),
                },
            )
            .await;
        assert!(result.is_err());
    }

    // Fail fast: no stock change, no movements
    let stored = IngredientService::new(storage.clone())
        .get(kiosk_id, ingredient.id)
        .await
        .unwrap();
    assert_eq!(stored.current_stock, dec("10"));
    let movements = MovementService::new(storage)
        .history(kiosk_id, None, None, None)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn manual_order_deduction_type_is_rejected() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Lemon", "10").await;

    let result = DeductionService::new(storage)
        .register_movement(
            kiosk_id,
            Uuid::new_v4(),
            RegisterMovementInput {
                ingredient_id: ingredient.id,
                movement_type: MovementType::OrderDeduction,
                quantity: dec("1"),
                reason: "sneaky".to_string(),
            },
        )
        .await;
    assert!(result.is_err());
}

// ============================================================================
// Property Tests
// ============================================================================

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|n| Decimal::new(n, 3))
}

fn type_strategy() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::In),
        Just(MovementType::Out),
        Just(MovementType::Adjustment),
        Just(MovementType::OrderDeduction),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Ledger/movement consistency: new_stock is always the clamped
    /// application of the signed quantity
    #[test]
    fn prop_movement_arithmetic_is_clamped(
        previous in (0i64..1_000_000).prop_map(|n| Decimal::new(n, 3)),
        quantity in quantity_strategy(),
        movement_type in type_strategy()
    ) {
        let signed = movement_type.signed_delta(quantity);
        let new_stock = clamp_stock(previous, signed);

        prop_assert!(new_stock >= Decimal::ZERO);
        if movement_type.is_inbound() {
            prop_assert_eq!(new_stock, previous + quantity);
        } else if previous >= quantity {
            prop_assert_eq!(new_stock, previous - quantity);
        } else {
            prop_assert_eq!(new_stock, Decimal::ZERO);
        }
    }
}
