//! Storage layer for the inventory accounting engine
//!
//! One repository trait per entity, injected as `Arc<dyn …>` so the service
//! layer is storage-agnostic. Two backends: an in-memory store used in
//! development and tests, and PostgreSQL for production.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use shared::models::{
    AlertType, Ingredient, MeasureUnit, Movement, MovementType, Recipe, RecipeIngredient,
    StockAlert,
};
use shared::types::Pagination;

/// Storage layer errors, converted into `AppError` at the service boundary
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields for inserting a new ingredient; id and timestamps are assigned by
/// the repository
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub kiosk_id: Uuid,
    pub name: String,
    pub unit: MeasureUnit,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub maximum_stock: Option<Decimal>,
    pub cost_per_unit: Decimal,
    pub supplier: Option<String>,
}

/// Fields for inserting a new recipe
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub kiosk_id: Uuid,
    pub product_id: Uuid,
    pub yield_quantity: Decimal,
    pub yield_unit: MeasureUnit,
    pub ingredients: Vec<RecipeIngredient>,
    pub total_cost: Decimal,
}

/// Fields for appending a movement; id, sequence and created_at are assigned
/// by the repository
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub kiosk_id: Uuid,
    pub ingredient_id: Uuid,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub previous_stock: Decimal,
    pub new_stock: Decimal,
    pub reason: String,
    pub order_id: Option<Uuid>,
    pub user_id: Uuid,
}

/// Fields for inserting a new alert
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub kiosk_id: Uuid,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub alert_type: AlertType,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
}

/// Filter for movement history queries
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub ingredient_id: Option<Uuid>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Repository for the ingredient ledger
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    async fn insert(&self, ingredient: NewIngredient) -> StoreResult<Ingredient>;

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<Ingredient>;

    async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> StoreResult<Vec<Ingredient>>;

    /// Full-row update; the caller sets `updated_at`
    async fn update(&self, ingredient: &Ingredient) -> StoreResult<Ingredient>;

    /// Write a new stock level for one ingredient
    async fn update_stock(
        &self,
        kiosk_id: Uuid,
        id: Uuid,
        new_stock: Decimal,
    ) -> StoreResult<Ingredient>;

    /// Hard delete; callers must first check recipe references
    async fn delete(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<()>;
}

/// Repository for recipes
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn insert(&self, recipe: NewRecipe) -> StoreResult<Recipe>;

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<Recipe>;

    async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> StoreResult<Vec<Recipe>>;

    async fn update(&self, recipe: &Recipe) -> StoreResult<Recipe>;

    /// The active recipe for a product, or `None` if the product is not
    /// stock-tracked
    async fn find_by_product(&self, kiosk_id: Uuid, product_id: Uuid)
        -> StoreResult<Option<Recipe>>;

    /// Whether any active recipe references the ingredient
    async fn any_active_using_ingredient(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<bool>;
}

/// Repository for the append-only movement log
#[async_trait]
pub trait MovementRepository: Send + Sync {
    /// Append one movement; assigns id, monotonic sequence and created_at
    async fn append(&self, movement: NewMovement) -> StoreResult<Movement>;

    /// Filtered history, newest first
    async fn list(&self, kiosk_id: Uuid, filter: &MovementFilter) -> StoreResult<Vec<Movement>>;

    /// Paginated filtered history with total count, newest first
    async fn list_paginated(
        &self,
        kiosk_id: Uuid,
        filter: &MovementFilter,
        pagination: &Pagination,
    ) -> StoreResult<(Vec<Movement>, u64)>;

    /// Number of movements recorded at or after the given instant
    async fn count_since(&self, kiosk_id: Uuid, since: DateTime<Utc>) -> StoreResult<u64>;
}

/// Repository for stock alerts
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: NewAlert) -> StoreResult<StockAlert>;

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert>;

    /// The unresolved alert for an ingredient, if one exists (the dedup key
    /// allows at most one)
    async fn find_unresolved(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<Option<StockAlert>>;

    async fn list(&self, kiosk_id: Uuid, unread_only: bool) -> StoreResult<Vec<StockAlert>>;

    async fn mark_read(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert>;

    /// Terminal transition; conflicts if the alert is already resolved
    async fn resolve(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert>;

    async fn count_unresolved(&self, kiosk_id: Uuid) -> StoreResult<u64>;
}

/// Per-ingredient async locks
///
/// `(kiosk_id, ingredient_id)` is the unit of serializability: every ledger
/// mutation (availability check, stock write, movement append, alert
/// evaluation) runs while holding the ingredient's lock, so concurrent
/// orders cannot race on the read-modify-write of `current_stock`.
#[derive(Clone, Default)]
pub struct StockLocks {
    inner: Arc<DashMap<(Uuid, Uuid), Arc<Mutex<()>>>>,
}

impl StockLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding one ingredient's ledger entry
    pub fn for_ingredient(&self, kiosk_id: Uuid, ingredient_id: Uuid) -> Arc<Mutex<()>> {
        self.inner
            .entry((kiosk_id, ingredient_id))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Bundle of repositories plus the lock registry, shared across services
#[derive(Clone)]
pub struct Storage {
    pub ingredients: Arc<dyn IngredientRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
    pub movements: Arc<dyn MovementRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub locks: StockLocks,
}

impl Storage {
    /// In-memory backend
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStorage::new());
        Self {
            ingredients: store.clone(),
            recipes: store.clone(),
            movements: store.clone(),
            alerts: store,
            locks: StockLocks::new(),
        }
    }

    /// PostgreSQL backend
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PostgresStorage::new(pool));
        Self {
            ingredients: store.clone(),
            recipes: store.clone(),
            movements: store.clone(),
            alerts: store,
            locks: StockLocks::new(),
        }
    }
}
