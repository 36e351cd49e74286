//! Ingredient ledger tests
//!
//! Covers ingredient CRUD, the zero-clamped `apply_delta` write path, and
//! the non-negativity property of the ledger.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use kiosk_management_backend::services::ingredients::{
    CreateIngredientInput, UpdateIngredientInput,
};
use kiosk_management_backend::services::recipes::{CreateRecipeInput, RecipeIngredientInput};
use kiosk_management_backend::services::{IngredientService, RecipeService};
use kiosk_management_backend::storage::Storage;
use shared::models::{Ingredient, MeasureUnit};
use shared::validation::clamp_stock;

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
                cost_per_unit: dec("2.50"),
                supplier: None,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn create_and_get_ingredient() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let service = IngredientService::new(storage.clone());

    let created = seed_ingredient(&storage, kiosk_id, "Flour", "25", "5").await;
    assert_eq!(created.current_stock, dec("25"));
    assert!(created.is_active);

    let fetched = service.get(kiosk_id, created.id).await.unwrap();
    assert_eq!(fetched.name, "Flour");
    assert_eq!(fetched.minimum_stock, dec("5"));
}

#[tokio::test]
async fn get_is_scoped_to_kiosk() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Sugar", "10", "2").await;

    let service = IngredientService::new(storage);
    let err = service.get(Uuid::new_v4(), ingredient.id).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let service = IngredientService::new(storage);

    let result = service
        .create(
            kiosk_id,
            CreateIngredientInput {
                name: "  ".to_string(),
                unit: MeasureUnit::Kg,
                initial_stock: None,
                minimum_stock: dec("1"),
                maximum_stock: None,
                cost_per_unit: dec("1"),
                supplier: None,
            },
        )
        .await;
    assert!(result.is_err(), "blank name must be rejected");

    let result = service
        .create(
            kiosk_id,
            CreateIngredientInput {
                name: "Salt".to_string(),
                unit: MeasureUnit::Kg,
                initial_stock: None,
                minimum_stock: dec("10"),
                maximum_stock: Some(dec("5")),
                cost_per_unit: dec("1"),
                supplier: None,
            },
        )
        .await;
    assert!(result.is_err(), "maximum below minimum must be rejected");
}

#[tokio::test]
async fn update_changes_master_data_but_not_stock() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Butter", "12", "3").await;

    let service = IngredientService::new(storage);
    let updated = service
        .update(
            kiosk_id,
            ingredient.id,
            UpdateIngredientInput {
                name: Some("Unsalted butter".to_string()),
                unit: None,
                minimum_stock: Some(dec("4")),
                maximum_stock: None,
                cost_per_unit: Some(dec("3.10")),
                supplier: Some("Dairy Co".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Unsalted butter");
    assert_eq!(updated.minimum_stock, dec("4"));
    // Stock only moves through movement-producing operations
    assert_eq!(updated.current_stock, dec("12"));
}

#[tokio::test]
async fn apply_delta_clamps_at_zero() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Milk", "4", "5").await;

    let service = IngredientService::new(storage);
    let update = service
        .apply_delta(kiosk_id, ingredient.id, dec("-10"))
        .await
        .unwrap();

    assert_eq!(update.previous_stock, dec("4"));
    assert_eq!(update.new_stock, Decimal::ZERO);
    assert_eq!(update.ingredient.current_stock, Decimal::ZERO);
}

#[tokio::test]
async fn apply_delta_sequence_never_goes_negative() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Cocoa", "10", "2").await;

    let service = IngredientService::new(storage.clone());
    let deltas = ["-3", "-4", "2", "-9", "-1", "5", "-100"];
    for delta in deltas {
        let update = service
            .apply_delta(kiosk_id, ingredient.id, dec(delta))
            .await
            .unwrap();
        assert!(update.new_stock >= Decimal::ZERO);
    }

    let stored = service.get(kiosk_id, ingredient.id).await.unwrap();
    assert_eq!(stored.current_stock, Decimal::ZERO);
}

#[tokio::test]
async fn deactivate_hides_from_default_listing() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Yeast", "3", "1").await;
    seed_ingredient(&storage, kiosk_id, "Water", "100", "10").await;

    let service = IngredientService::new(storage);
    service.deactivate(kiosk_id, ingredient.id).await.unwrap();

    let active = service.list(kiosk_id, false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Water");

    let all = service.list(kiosk_id, true).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn delete_refused_while_referenced_by_active_recipe() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Espresso beans", "8", "2").await;

    RecipeService::new(storage.clone())
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![RecipeIngredientInput {
                    ingredient_id: ingredient.id,
                    quantity: dec("0.018"),
                    cost_per_portion: dec("0.42"),
                }],
            },
        )
        .await
        .unwrap();

    let service = IngredientService::new(storage);
    let result = service.delete(kiosk_id, ingredient.id).await;
    assert!(result.is_err(), "delete must be refused while a recipe uses it");

    // Soft-deactivation is the supported path
    let deactivated = service.deactivate(kiosk_id, ingredient.id).await.unwrap();
    assert!(!deactivated.is_active);
}

#[tokio::test]
async fn delete_succeeds_when_unreferenced() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let ingredient = seed_ingredient(&storage, kiosk_id, "Cinnamon", "1", "0").await;

    let service = IngredientService::new(storage);
    service.delete(kiosk_id, ingredient.id).await.unwrap();
    assert!(service.get(kiosk_id, ingredient.id).await.is_err());
}

// ============================================================================
// Property Tests
// ============================================================================

fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000).prop_map(|n| Decimal::new(n, 3))
}

fn delta_strategy() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000).prop_map(|n| Decimal::new(n, 3))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Non-negativity: any sequence of clamped writes keeps stock >= 0
    #[test]
    fn prop_clamped_stock_never_negative(
        initial in quantity_strategy(),
        deltas in prop::collection::vec(delta_strategy(), 0..40)
    ) {
        let mut stock = initial;
        for delta in deltas {
            stock = clamp_stock(stock, delta);
            prop_assert!(stock >= Decimal::ZERO);
        }
    }

    /// The clamp only engages when the delta would overdraw the stock
    #[test]
    fn prop_clamp_is_exact_when_stock_suffices(
        initial in quantity_strategy(),
        delta in delta_strategy()
    ) {
        let result = clamp_stock(initial, delta);
        if initial + delta >= Decimal::ZERO {
            prop_assert_eq!(result, initial + delta);
        } else {
            prop_assert_eq!(result, Decimal::ZERO);
        }
    }
}
