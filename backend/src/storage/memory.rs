//! In-memory storage backend
//!
//! Concurrent-map stores with an atomically assigned movement sequence.
//! This is the default backend in development and the one the test suite
//! runs against; data lives for the process lifetime only.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{Ingredient, Movement, Recipe, StockAlert};
use shared::types::Pagination;

use super::{
    AlertRepository, IngredientRepository, MovementFilter, MovementRepository, NewAlert,
    NewIngredient, NewMovement, NewRecipe, RecipeRepository, StoreError, StoreResult,
};

/// All four entity stores behind one struct
pub struct MemoryStorage {
    ingredients: DashMap<Uuid, Ingredient>,
    recipes: DashMap<Uuid, Recipe>,
    movements: DashMap<Uuid, Movement>,
    alerts: DashMap<Uuid, StockAlert>,
    /// Monotonic movement sequence; causal order even for same-millisecond
    /// appends
    movement_sequence: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            ingredients: DashMap::new(),
            recipes: DashMap::new(),
            movements: DashMap::new(),
            alerts: DashMap::new(),
            movement_sequence: AtomicI64::new(0),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IngredientRepository for MemoryStorage {
    async fn insert(&self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        let now = Utc::now();
        let record = Ingredient {
            id: Uuid::new_v4(),
            kiosk_id: ingredient.kiosk_id,
            name: ingredient.name,
            unit: ingredient.unit,
            current_stock: ingredient.current_stock,
            minimum_stock: ingredient.minimum_stock,
            maximum_stock: ingredient.maximum_stock,
            cost_per_unit: ingredient.cost_per_unit,
            supplier: ingredient.supplier,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.ingredients.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<Ingredient> {
        self.ingredients
            .get(&id)
            .filter(|i| i.kiosk_id == kiosk_id)
            .map(|i| i.clone())
            .ok_or(StoreError::NotFound("Ingredient"))
    }

    async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> StoreResult<Vec<Ingredient>> {
        let mut items: Vec<Ingredient> = self
            .ingredients
            .iter()
            .filter(|i| i.kiosk_id == kiosk_id && (include_inactive || i.is_active))
            .map(|i| i.clone())
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn update(&self, ingredient: &Ingredient) -> StoreResult<Ingredient> {
        let mut entry = self
            .ingredients
            .get_mut(&ingredient.id)
            .filter(|i| i.kiosk_id == ingredient.kiosk_id)
            .ok_or(StoreError::NotFound("Ingredient"))?;
        *entry = ingredient.clone();
        Ok(entry.clone())
    }

    async fn update_stock(
        &self,
        kiosk_id: Uuid,
        id: Uuid,
        new_stock: Decimal,
    ) -> StoreResult<Ingredient> {
        let mut entry = self
            .ingredients
            .get_mut(&id)
            .filter(|i| i.kiosk_id == kiosk_id)
            .ok_or(StoreError::NotFound("Ingredient"))?;
        entry.current_stock = new_stock;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn delete(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<()> {
        let owned = self
            .ingredients
            .get(&id)
            .map(|i| i.kiosk_id == kiosk_id)
            .unwrap_or(false);
        if !owned {
            return Err(StoreError::NotFound("Ingredient"));
        }
        self.ingredients.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl RecipeRepository for MemoryStorage {
    async fn insert(&self, recipe: NewRecipe) -> StoreResult<Recipe> {
        // One recipe per (kiosk, product), matching the unique index in
        // the Postgres backend
        let duplicate = self
            .recipes
            .iter()
            .any(|r| r.kiosk_id == recipe.kiosk_id && r.product_id == recipe.product_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "Product already has a recipe".to_string(),
            ));
        }

        let now = Utc::now();
        let record = Recipe {
            id: Uuid::new_v4(),
            kiosk_id: recipe.kiosk_id,
            product_id: recipe.product_id,
            yield_quantity: recipe.yield_quantity,
            yield_unit: recipe.yield_unit,
            ingredients: recipe.ingredients,
            total_cost: recipe.total_cost,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.recipes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<Recipe> {
        self.recipes
            .get(&id)
            .filter(|r| r.kiosk_id == kiosk_id)
            .map(|r| r.clone())
            .ok_or(StoreError::NotFound("Recipe"))
    }

    async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> StoreResult<Vec<Recipe>> {
        let mut items: Vec<Recipe> = self
            .recipes
            .iter()
            .filter(|r| r.kiosk_id == kiosk_id && (include_inactive || r.is_active))
            .map(|r| r.clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update(&self, recipe: &Recipe) -> StoreResult<Recipe> {
        let mut entry = self
            .recipes
            .get_mut(&recipe.id)
            .filter(|r| r.kiosk_id == recipe.kiosk_id)
            .ok_or(StoreError::NotFound("Recipe"))?;
        *entry = recipe.clone();
        Ok(entry.clone())
    }

    async fn find_by_product(
        &self,
        kiosk_id: Uuid,
        product_id: Uuid,
    ) -> StoreResult<Option<Recipe>> {
        Ok(self
            .recipes
            .iter()
            .find(|r| r.kiosk_id == kiosk_id && r.product_id == product_id && r.is_active)
            .map(|r| r.clone()))
    }

    async fn any_active_using_ingredient(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<bool> {
        Ok(self.recipes.iter().any(|r| {
            r.kiosk_id == kiosk_id
                && r.is_active
                && r.ingredients.iter().any(|i| i.ingredient_id == ingredient_id)
        }))
    }
}

#[async_trait]
impl MovementRepository for MemoryStorage {
    async fn append(&self, movement: NewMovement) -> StoreResult<Movement> {
        let sequence = self.movement_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let record = Movement {
            id: Uuid::new_v4(),
            kiosk_id: movement.kiosk_id,
            ingredient_id: movement.ingredient_id,
            movement_type: movement.movement_type,
            quantity: movement.quantity,
            previous_stock: movement.previous_stock,
            new_stock: movement.new_stock,
            reason: movement.reason,
            order_id: movement.order_id,
            user_id: movement.user_id,
            sequence,
            created_at: Utc::now(),
        };
        self.movements.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list(&self, kiosk_id: Uuid, filter: &MovementFilter) -> StoreResult<Vec<Movement>> {
        let mut items: Vec<Movement> = self
            .movements
            .iter()
            .filter(|m| matches_filter(m, kiosk_id, filter))
            .map(|m| m.clone())
            .collect();
        items.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(items)
    }

    async fn list_paginated(
        &self,
        kiosk_id: Uuid,
        filter: &MovementFilter,
        pagination: &Pagination,
    ) -> StoreResult<(Vec<Movement>, u64)> {
        let all = MovementRepository::list(self, kiosk_id, filter).await?;
        let total = all.len() as u64;
        let page = all
            .into_iter()
            .skip(pagination.offset())
            .take(pagination.per_page as usize)
            .collect();
        Ok((page, total))
    }

    async fn count_since(&self, kiosk_id: Uuid, since: DateTime<Utc>) -> StoreResult<u64> {
        Ok(self
            .movements
            .iter()
            .filter(|m| m.kiosk_id == kiosk_id && m.created_at >= since)
            .count() as u64)
    }
}

fn matches_filter(movement: &Movement, kiosk_id: Uuid, filter: &MovementFilter) -> bool {
    if movement.kiosk_id != kiosk_id {
        return false;
    }
    if let Some(ingredient_id) = filter.ingredient_id {
        if movement.ingredient_id != ingredient_id {
            return false;
        }
    }
    if let Some(start) = filter.start {
        if movement.created_at < start {
            return false;
        }
    }
    if let Some(end) = filter.end {
        if movement.created_at > end {
            return false;
        }
    }
    true
}

#[async_trait]
impl AlertRepository for MemoryStorage {
    async fn insert(&self, alert: NewAlert) -> StoreResult<StockAlert> {
        // At most one unresolved alert per (kiosk, ingredient), matching
        // the partial unique index in the Postgres backend
        let open = self.alerts.iter().any(|a| {
            a.kiosk_id == alert.kiosk_id
                && a.ingredient_id == alert.ingredient_id
                && !a.is_resolved
        });
        if open {
            return Err(StoreError::Conflict(
                "An unresolved alert already exists for this ingredient".to_string(),
            ));
        }

        let record = StockAlert {
            id: Uuid::new_v4(),
            kiosk_id: alert.kiosk_id,
            ingredient_id: alert.ingredient_id,
            ingredient_name: alert.ingredient_name,
            alert_type: alert.alert_type,
            current_stock: alert.current_stock,
            minimum_stock: alert.minimum_stock,
            is_read: false,
            is_resolved: false,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.alerts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert> {
        self.alerts
            .get(&id)
            .filter(|a| a.kiosk_id == kiosk_id)
            .map(|a| a.clone())
            .ok_or(StoreError::NotFound("Alert"))
    }

    async fn find_unresolved(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<Option<StockAlert>> {
        Ok(self
            .alerts
            .iter()
            .find(|a| {
                a.kiosk_id == kiosk_id && a.ingredient_id == ingredient_id && !a.is_resolved
            })
            .map(|a| a.clone()))
    }

    async fn list(&self, kiosk_id: Uuid, unread_only: bool) -> StoreResult<Vec<StockAlert>> {
        let mut items: Vec<StockAlert> = self
            .alerts
            .iter()
            .filter(|a| a.kiosk_id == kiosk_id && (!unread_only || !a.is_read))
            .map(|a| a.clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn mark_read(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert> {
        let mut entry = self
            .alerts
            .get_mut(&id)
            .filter(|a| a.kiosk_id == kiosk_id)
            .ok_or(StoreError::NotFound("Alert"))?;
        entry.is_read = true;
        Ok(entry.clone())
    }

    async fn resolve(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert> {
        let mut entry = self
            .alerts
            .get_mut(&id)
            .filter(|a| a.kiosk_id == kiosk_id)
            .ok_or(StoreError::NotFound("Alert"))?;
        if entry.is_resolved {
            return Err(StoreError::Conflict("Alert is already resolved".to_string()));
        }
        entry.is_resolved = true;
        entry.resolved_at = Some(Utc::now());
        Ok(entry.clone())
    }

    async fn count_unresolved(&self, kiosk_id: Uuid) -> StoreResult<u64> {
        Ok(self
            .alerts
            .iter()
            .filter(|a| a.kiosk_id == kiosk_id && !a.is_resolved)
            .count() as u64)
    }
}
