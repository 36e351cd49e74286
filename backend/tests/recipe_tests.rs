//! Recipe resolver tests
//!
//! Covers cost derivation on create/update, product resolution, and the
//! read-only availability preview.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use kiosk_management_backend::services::ingredients::CreateIngredientInput;
use kiosk_management_backend::services::recipes::{
    CreateRecipeInput, RecipeIngredientInput, UpdateRecipeInput,
};
use kiosk_management_backend::services::{IngredientService, MovementService, RecipeService};
use kiosk_management_backend::storage::Storage;
use shared::models::{recipe_total_cost, Ingredient, MeasureUnit, RecipeIngredient};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn seed_ingredient(
    storage: &Storage,
    kiosk_id: Uuid,
    name: &str,
    stock: &str,
) -> Ingredient {
    IngredientService::new(storage.clone())
        .create(
            kiosk_id,
            CreateIngredientInput {
                name: name.to_string(),
                unit: MeasureUnit::G,
                initial_stock: Some(dec(stock)),
                minimum_stock: dec("50"),
                maximum_stock: None,
                cost_per_unit: dec("0.02"),
                supplier: None,
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn create_computes_total_cost() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "1000").await;
    let milk = seed_ingredient(&storage, kiosk_id, "Milk", "2000").await;

    let recipe = RecipeService::new(storage)
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![
                    RecipeIngredientInput {
                        ingredient_id: beans.id,
                        quantity: dec("18"),
                        cost_per_portion: dec("0.42"),
                    },
                    RecipeIngredientInput {
                        ingredient_id: milk.id,
                        quantity: dec("200"),
                        cost_per_portion: dec("0.18"),
                    },
                ],
            },
        )
        .await
        .unwrap();

    assert_eq!(recipe.total_cost, dec("0.60"));
    // Names and units are denormalized from the ledger
    assert_eq!(recipe.ingredients[0].ingredient_name, "Beans");
    assert_eq!(recipe.ingredients[0].unit, MeasureUnit::G);
}

#[tokio::test]
async fn update_recomputes_total_cost_when_list_changes() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "1000").await;

    let service = RecipeService::new(storage);
    let recipe = service
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![RecipeIngredientInput {
                    ingredient_id: beans.id,
                    quantity: dec("18"),
                    cost_per_portion: dec("0.42"),
                }],
            },
        )
        .await
        .unwrap();
    assert_eq!(recipe.total_cost, dec("0.42"));

    let updated = service
        .update(
            kiosk_id,
            recipe.id,
            UpdateRecipeInput {
                yield_quantity: None,
                yield_unit: None,
                ingredients: Some(vec![RecipeIngredientInput {
                    ingredient_id: beans.id,
                    quantity: dec("20"),
                    cost_per_portion: dec("0.47"),
                }]),
                is_active: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.total_cost, dec("0.47"));
    assert_eq!(
        updated.total_cost,
        recipe_total_cost(&updated.ingredients)
    );
}

#[tokio::test]
async fn create_rejects_unknown_ingredient() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();

    let result = RecipeService::new(storage)
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![RecipeIngredientInput {
                    ingredient_id: Uuid::new_v4(),
                    quantity: dec("10"),
                    cost_per_portion: dec("0.10"),
                }],
            },
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn second_recipe_for_same_product_is_rejected() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "1000").await;

    let service = RecipeService::new(storage.clone());
    let input = |ingredient_id: Uuid, cost: &str| CreateRecipeInput {
        product_id,
        yield_quantity: dec("1"),
        yield_unit: MeasureUnit::Unit,
        ingredients: vec![RecipeIngredientInput {
            ingredient_id,
            quantity: dec("18"),
            cost_per_portion: dec(cost),
        }],
    };

    let first = service.create(kiosk_id, input(beans.id, "0.42")).await.unwrap();

    // One recipe per (kiosk, product)
    let result = service.create(kiosk_id, input(beans.id, "0.50")).await;
    assert!(result.is_err(), "duplicate recipe for a product must conflict");

    let resolved = service
        .resolve_by_product(kiosk_id, product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, first.id);
    assert_eq!(resolved.total_cost, dec("0.42"));

    // The same product id in another kiosk is a separate namespace
    let other_kiosk = Uuid::new_v4();
    let other_beans = seed_ingredient(&storage, other_kiosk, "Beans", "1000").await;
    service
        .create(other_kiosk, input(other_beans.id, "0.42"))
        .await
        .unwrap();
}

#[tokio::test]
async fn resolve_by_product_returns_active_recipe_or_none() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "1000").await;

    let service = RecipeService::new(storage);

    // Product without a recipe is not stock-tracked
    assert!(service
        .resolve_by_product(kiosk_id, product_id)
        .await
        .unwrap()
        .is_none());

    let recipe = service
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id,
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![RecipeIngredientInput {
                    ingredient_id: beans.id,
                    quantity: dec("18"),
                    cost_per_portion: dec("0.42"),
                }],
            },
        )
        .await
        .unwrap();

    let resolved = service
        .resolve_by_product(kiosk_id, product_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.id, recipe.id);

    // Deactivated recipes no longer resolve
    service
        .update(
            kiosk_id,
            recipe.id,
            UpdateRecipeInput {
                yield_quantity: None,
                yield_unit: None,
                ingredients: None,
                is_active: Some(false),
            },
        )
        .await
        .unwrap();
    assert!(service
        .resolve_by_product(kiosk_id, product_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn availability_check_reports_shortfalls() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "100").await;
    let milk = seed_ingredient(&storage, kiosk_id, "Milk", "1000").await;

    let service = RecipeService::new(storage);
    let recipe = service
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![
                    RecipeIngredientInput {
                        ingredient_id: beans.id,
                        quantity: dec("18"),
                        cost_per_portion: dec("0.42"),
                    },
                    RecipeIngredientInput {
                        ingredient_id: milk.id,
                        quantity: dec("200"),
                        cost_per_portion: dec("0.18"),
                    },
                ],
            },
        )
        .await
        .unwrap();

    // At x5, beans need 90 (have 100) and milk needs 1000 (have 1000)
    let check = service
        .check_availability(kiosk_id, &recipe, dec("5"))
        .await
        .unwrap();
    assert!(check.available);
    assert!(check.missing.is_empty());

    // At x6, beans need 108 and milk needs 1200; both fall short
    let check = service
        .check_availability(kiosk_id, &recipe, dec("6"))
        .await
        .unwrap();
    assert!(!check.available);
    assert_eq!(check.missing.len(), 2);
    let beans_missing = check
        .missing
        .iter()
        .find(|m| m.ingredient_id == beans.id)
        .unwrap();
    assert_eq!(beans_missing.required, dec("108"));
    assert_eq!(beans_missing.available, dec("100"));
}

#[tokio::test]
async fn availability_check_is_read_only_and_idempotent() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "100").await;

    let service = RecipeService::new(storage.clone());
    let recipe = service
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![RecipeIngredientInput {
                    ingredient_id: beans.id,
                    quantity: dec("18"),
                    cost_per_portion: dec("0.42"),
                }],
            },
        )
        .await
        .unwrap();

    let first = service
        .check_availability(kiosk_id, &recipe, dec("6"))
        .await
        .unwrap();
    let second = service
        .check_availability(kiosk_id, &recipe, dec("6"))
        .await
        .unwrap();
    assert_eq!(first.available, second.available);
    assert_eq!(first.missing.len(), second.missing.len());

    // No ledger mutation and no movements from previewing
    let ingredient = IngredientService::new(storage.clone())
        .get(kiosk_id, beans.id)
        .await
        .unwrap();
    assert_eq!(ingredient.current_stock, dec("100"));
    let movements = MovementService::new(storage)
        .history(kiosk_id, None, None, None)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn availability_counts_dangling_reference_as_missing() {
    let storage = Storage::memory();
    let kiosk_id = Uuid::new_v4();
    let beans = seed_ingredient(&storage, kiosk_id, "Beans", "100").await;

    let service = RecipeService::new(storage.clone());
    let mut recipe = service
        .create(
            kiosk_id,
            CreateRecipeInput {
                product_id: Uuid::new_v4(),
                yield_quantity: dec("1"),
                yield_unit: MeasureUnit::Unit,
                ingredients: vec![RecipeIngredientInput {
                    ingredient_id: beans.id,
                    quantity: dec("18"),
                    cost_per_portion: dec("0.42"),
                }],
            },
        )
        .await
        .unwrap();

    // Simulate a dangling foreign key in the stored recipe
    recipe.ingredients[0].ingredient_id = Uuid::new_v4();

    let check = service
        .check_availability(kiosk_id, &recipe, dec("1"))
        .await
        .unwrap();
    assert!(!check.available);
    assert_eq!(check.missing.len(), 1);
    assert_eq!(check.missing[0].available, Decimal::ZERO);
}

// ============================================================================
// Property Tests
// ============================================================================

fn cost_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|n| Decimal::new(n, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Cost derivation: total cost equals the sum of per-portion costs
    #[test]
    fn prop_total_cost_is_sum_of_portions(
        costs in prop::collection::vec(cost_strategy(), 0..20)
    ) {
        let ingredients: Vec<RecipeIngredient> = costs
            .iter()
            .map(|cost| RecipeIngredient {
                ingredient_id: Uuid::new_v4(),
                ingredient_name: "x".to_string(),
                quantity: Decimal::ONE,
                unit: MeasureUnit::G,
                cost_per_portion: *cost,
            })
            .collect();

        let expected: Decimal = costs.iter().sum();
        prop_assert_eq!(recipe_total_cost(&ingredients), expected);
    }
}
