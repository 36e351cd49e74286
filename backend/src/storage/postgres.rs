//! PostgreSQL storage backend
//!
//! String queries via `sqlx::query_as`; enums are stored as text columns,
//! recipe ingredient lists as JSONB, and the movement sequence is a
//! `BIGSERIAL`. The unresolved-alert dedup key is enforced by a partial
//! unique index, so the lookup-then-insert in the alert generator cannot
//! race into a duplicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::{
    AlertType, Ingredient, MeasureUnit, Movement, MovementType, Recipe, RecipeIngredient,
    StockAlert,
};
use shared::types::Pagination;

use super::{
    AlertRepository, IngredientRepository, MovementFilter, MovementRepository, NewAlert,
    NewIngredient, NewMovement, NewRecipe, RecipeRepository, StoreError, StoreResult,
};

/// All four entity stores backed by one connection pool
#[derive(Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_error(message: String) -> StoreError {
    StoreError::Database(sqlx::Error::Decode(message.into()))
}

fn unit_from_db(s: &str) -> StoreResult<MeasureUnit> {
    MeasureUnit::from_str(s).ok_or_else(|| decode_error(format!("unknown unit: {}", s)))
}

fn movement_type_from_db(s: &str) -> StoreResult<MovementType> {
    MovementType::from_str(s).ok_or_else(|| decode_error(format!("unknown movement type: {}", s)))
}

fn alert_type_from_db(s: &str) -> StoreResult<AlertType> {
    AlertType::from_str(s).ok_or_else(|| decode_error(format!("unknown alert type: {}", s)))
}

/// Whether a sqlx error is a unique constraint violation
fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[derive(FromRow)]
struct IngredientRow {
    id: Uuid,
    kiosk_id: Uuid,
    name: String,
    unit: String,
    current_stock: Decimal,
    minimum_stock: Decimal,
    maximum_stock: Option<Decimal>,
    cost_per_unit: Decimal,
    supplier: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IngredientRow {
    fn into_model(self) -> StoreResult<Ingredient> {
        Ok(Ingredient {
            id: self.id,
            kiosk_id: self.kiosk_id,
            name: self.name,
            unit: unit_from_db(&self.unit)?,
            current_stock: self.current_stock,
            minimum_stock: self.minimum_stock,
            maximum_stock: self.maximum_stock,
            cost_per_unit: self.cost_per_unit,
            supplier: self.supplier,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RecipeRow {
    id: Uuid,
    kiosk_id: Uuid,
    product_id: Uuid,
    yield_quantity: Decimal,
    yield_unit: String,
    ingredients: Json<Vec<RecipeIngredient>>,
    total_cost: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RecipeRow {
    fn into_model(self) -> StoreResult<Recipe> {
        Ok(Recipe {
            id: self.id,
            kiosk_id: self.kiosk_id,
            product_id: self.product_id,
            yield_quantity: self.yield_quantity,
            yield_unit: unit_from_db(&self.yield_unit)?,
            ingredients: self.ingredients.0,
            total_cost: self.total_cost,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MovementRow {
    id: Uuid,
    kiosk_id: Uuid,
    ingredient_id: Uuid,
    movement_type: String,
    quantity: Decimal,
    previous_stock: Decimal,
    new_stock: Decimal,
    reason: String,
    order_id: Option<Uuid>,
    user_id: Uuid,
    sequence: i64,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_model(self) -> StoreResult<Movement> {
        Ok(Movement {
            id: self.id,
            kiosk_id: self.kiosk_id,
            ingredient_id: self.ingredient_id,
            movement_type: movement_type_from_db(&self.movement_type)?,
            quantity: self.quantity,
            previous_stock: self.previous_stock,
            new_stock: self.new_stock,
            reason: self.reason,
            order_id: self.order_id,
            user_id: self.user_id,
            sequence: self.sequence,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct AlertRow {
    id: Uuid,
    kiosk_id: Uuid,
    ingredient_id: Uuid,
    ingredient_name: String,
    alert_type: String,
    current_stock: Decimal,
    minimum_stock: Decimal,
    is_read: bool,
    is_resolved: bool,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl AlertRow {
    fn into_model(self) -> StoreResult<StockAlert> {
        Ok(StockAlert {
            id: self.id,
            kiosk_id: self.kiosk_id,
            ingredient_id: self.ingredient_id,
            ingredient_name: self.ingredient_name,
            alert_type: alert_type_from_db(&self.alert_type)?,
            current_stock: self.current_stock,
            minimum_stock: self.minimum_stock,
            is_read: self.is_read,
            is_resolved: self.is_resolved,
            created_at: self.created_at,
            resolved_at: self.resolved_at,
        })
    }
}

const INGREDIENT_COLUMNS: &str = "id, kiosk_id, name, unit, current_stock, minimum_stock, \
     maximum_stock, cost_per_unit, supplier, is_active, created_at, updated_at";

const RECIPE_COLUMNS: &str = "id, kiosk_id, product_id, yield_quantity, yield_unit, \
     ingredients, total_cost, is_active, created_at, updated_at";

const MOVEMENT_COLUMNS: &str = "id, kiosk_id, ingredient_id, movement_type, quantity, \
     previous_stock, new_stock, reason, order_id, user_id, sequence, created_at";

const ALERT_COLUMNS: &str = "id, kiosk_id, ingredient_id, ingredient_name, alert_type, \
     current_stock, minimum_stock, is_read, is_resolved, created_at, resolved_at";

#[async_trait]
impl IngredientRepository for PostgresStorage {
    async fn insert(&self, ingredient: NewIngredient) -> StoreResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            INSERT INTO ingredients (kiosk_id, name, unit, current_stock, minimum_stock,
                                     maximum_stock, cost_per_unit, supplier)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(ingredient.kiosk_id)
        .bind(&ingredient.name)
        .bind(ingredient.unit.as_str())
        .bind(ingredient.current_stock)
        .bind(ingredient.minimum_stock)
        .bind(ingredient.maximum_stock)
        .bind(ingredient.cost_per_unit)
        .bind(&ingredient.supplier)
        .fetch_one(&self.pool)
        .await?;

        row.into_model()
    }

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            "SELECT {} FROM ingredients WHERE id = $1 AND kiosk_id = $2",
            INGREDIENT_COLUMNS
        ))
        .bind(id)
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Ingredient"))?;

        row.into_model()
    }

    async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> StoreResult<Vec<Ingredient>> {
        let rows = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            SELECT {} FROM ingredients
            WHERE kiosk_id = $1 AND (is_active OR $2)
            ORDER BY name
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IngredientRow::into_model).collect()
    }

    async fn update(&self, ingredient: &Ingredient) -> StoreResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            UPDATE ingredients
            SET name = $1, unit = $2, current_stock = $3, minimum_stock = $4,
                maximum_stock = $5, cost_per_unit = $6, supplier = $7, is_active = $8,
                updated_at = $9
            WHERE id = $10 AND kiosk_id = $11
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(&ingredient.name)
        .bind(ingredient.unit.as_str())
        .bind(ingredient.current_stock)
        .bind(ingredient.minimum_stock)
        .bind(ingredient.maximum_stock)
        .bind(ingredient.cost_per_unit)
        .bind(&ingredient.supplier)
        .bind(ingredient.is_active)
        .bind(ingredient.updated_at)
        .bind(ingredient.id)
        .bind(ingredient.kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Ingredient"))?;

        row.into_model()
    }

    async fn update_stock(
        &self,
        kiosk_id: Uuid,
        id: Uuid,
        new_stock: Decimal,
    ) -> StoreResult<Ingredient> {
        let row = sqlx::query_as::<_, IngredientRow>(&format!(
            r#"
            UPDATE ingredients
            SET current_stock = $1, updated_at = NOW()
            WHERE id = $2 AND kiosk_id = $3
            RETURNING {}
            "#,
            INGREDIENT_COLUMNS
        ))
        .bind(new_stock)
        .bind(id)
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Ingredient"))?;

        row.into_model()
    }

    async fn delete(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1 AND kiosk_id = $2")
            .bind(id)
            .bind(kiosk_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Ingredient"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeRepository for PostgresStorage {
    async fn insert(&self, recipe: NewRecipe) -> StoreResult<Recipe> {
        let result = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes (kiosk_id, product_id, yield_quantity, yield_unit,
                                 ingredients, total_cost)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(recipe.kiosk_id)
        .bind(recipe.product_id)
        .bind(recipe.yield_quantity)
        .bind(recipe.yield_unit.as_str())
        .bind(Json(&recipe.ingredients))
        .bind(recipe.total_cost)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.into_model(),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(
                "Product already has a recipe".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {} FROM recipes WHERE id = $1 AND kiosk_id = $2",
            RECIPE_COLUMNS
        ))
        .bind(id)
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Recipe"))?;

        row.into_model()
    }

    async fn list(&self, kiosk_id: Uuid, include_inactive: bool) -> StoreResult<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {} FROM recipes
            WHERE kiosk_id = $1 AND (is_active OR $2)
            ORDER BY created_at DESC
            "#,
            RECIPE_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RecipeRow::into_model).collect()
    }

    async fn update(&self, recipe: &Recipe) -> StoreResult<Recipe> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            UPDATE recipes
            SET yield_quantity = $1, yield_unit = $2, ingredients = $3, total_cost = $4,
                is_active = $5, updated_at = $6
            WHERE id = $7 AND kiosk_id = $8
            RETURNING {}
            "#,
            RECIPE_COLUMNS
        ))
        .bind(recipe.yield_quantity)
        .bind(recipe.yield_unit.as_str())
        .bind(Json(&recipe.ingredients))
        .bind(recipe.total_cost)
        .bind(recipe.is_active)
        .bind(recipe.updated_at)
        .bind(recipe.id)
        .bind(recipe.kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Recipe"))?;

        row.into_model()
    }

    async fn find_by_product(
        &self,
        kiosk_id: Uuid,
        product_id: Uuid,
    ) -> StoreResult<Option<Recipe>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            SELECT {} FROM recipes
            WHERE kiosk_id = $1 AND product_id = $2 AND is_active
            "#,
            RECIPE_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(RecipeRow::into_model).transpose()
    }

    async fn any_active_using_ingredient(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM recipes r, jsonb_array_elements(r.ingredients) AS line
                WHERE r.kiosk_id = $1 AND r.is_active
                AND line->>'ingredient_id' = $2::text
            )
            "#,
        )
        .bind(kiosk_id)
        .bind(ingredient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[async_trait]
impl MovementRepository for PostgresStorage {
    async fn append(&self, movement: NewMovement) -> StoreResult<Movement> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO movements (kiosk_id, ingredient_id, movement_type, quantity,
                                   previous_stock, new_stock, reason, order_id, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(movement.kiosk_id)
        .bind(movement.ingredient_id)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(movement.previous_stock)
        .bind(movement.new_stock)
        .bind(&movement.reason)
        .bind(movement.order_id)
        .bind(movement.user_id)
        .fetch_one(&self.pool)
        .await?;

        row.into_model()
    }

    async fn list(&self, kiosk_id: Uuid, filter: &MovementFilter) -> StoreResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            SELECT {} FROM movements
            WHERE kiosk_id = $1
            AND ($2::uuid IS NULL OR ingredient_id = $2)
            AND ($3::timestamptz IS NULL OR created_at >= $3)
            AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY sequence DESC
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(filter.ingredient_id)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MovementRow::into_model).collect()
    }

    async fn list_paginated(
        &self,
        kiosk_id: Uuid,
        filter: &MovementFilter,
        pagination: &Pagination,
    ) -> StoreResult<(Vec<Movement>, u64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM movements
            WHERE kiosk_id = $1
            AND ($2::uuid IS NULL OR ingredient_id = $2)
            AND ($3::timestamptz IS NULL OR created_at >= $3)
            AND ($4::timestamptz IS NULL OR created_at <= $4)
            "#,
        )
        .bind(kiosk_id)
        .bind(filter.ingredient_id)
        .bind(filter.start)
        .bind(filter.end)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            SELECT {} FROM movements
            WHERE kiosk_id = $1
            AND ($2::uuid IS NULL OR ingredient_id = $2)
            AND ($3::timestamptz IS NULL OR created_at >= $3)
            AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY sequence DESC
            LIMIT $5 OFFSET $6
            "#,
            MOVEMENT_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(filter.ingredient_id)
        .bind(filter.start)
        .bind(filter.end)
        .bind(pagination.per_page as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let movements = rows
            .into_iter()
            .map(MovementRow::into_model)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((movements, total as u64))
    }

    async fn count_since(&self, kiosk_id: Uuid, since: DateTime<Utc>) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM movements WHERE kiosk_id = $1 AND created_at >= $2",
        )
        .bind(kiosk_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}

#[async_trait]
impl AlertRepository for PostgresStorage {
    async fn insert(&self, alert: NewAlert) -> StoreResult<StockAlert> {
        let result = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            INSERT INTO stock_alerts (kiosk_id, ingredient_id, ingredient_name, alert_type,
                                      current_stock, minimum_stock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(alert.kiosk_id)
        .bind(alert.ingredient_id)
        .bind(&alert.ingredient_name)
        .bind(alert.alert_type.as_str())
        .bind(alert.current_stock)
        .bind(alert.minimum_stock)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.into_model(),
            // The partial unique index caught a concurrent insert for the
            // same ingredient
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(
                "An unresolved alert already exists for this ingredient".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {} FROM stock_alerts WHERE id = $1 AND kiosk_id = $2",
            ALERT_COLUMNS
        ))
        .bind(id)
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Alert"))?;

        row.into_model()
    }

    async fn find_unresolved(
        &self,
        kiosk_id: Uuid,
        ingredient_id: Uuid,
    ) -> StoreResult<Option<StockAlert>> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            SELECT {} FROM stock_alerts
            WHERE kiosk_id = $1 AND ingredient_id = $2 AND NOT is_resolved
            "#,
            ALERT_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(ingredient_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AlertRow::into_model).transpose()
    }

    async fn list(&self, kiosk_id: Uuid, unread_only: bool) -> StoreResult<Vec<StockAlert>> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            SELECT {} FROM stock_alerts
            WHERE kiosk_id = $1 AND (NOT is_read OR NOT $2)
            ORDER BY created_at DESC
            "#,
            ALERT_COLUMNS
        ))
        .bind(kiosk_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AlertRow::into_model).collect()
    }

    async fn mark_read(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            UPDATE stock_alerts SET is_read = TRUE
            WHERE id = $1 AND kiosk_id = $2
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(id)
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Alert"))?;

        row.into_model()
    }

    async fn resolve(&self, kiosk_id: Uuid, id: Uuid) -> StoreResult<StockAlert> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            UPDATE stock_alerts SET is_resolved = TRUE, resolved_at = NOW()
            WHERE id = $1 AND kiosk_id = $2 AND NOT is_resolved
            RETURNING {}
            "#,
            ALERT_COLUMNS
        ))
        .bind(id)
        .bind(kiosk_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_model(),
            // Distinguish "already resolved" from "no such alert"
            None => {
                let _ = AlertRepository::get(self, kiosk_id, id).await?;
                Err(StoreError::Conflict("Alert is already resolved".to_string()))
            }
        }
    }

    async fn count_unresolved(&self, kiosk_id: Uuid) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM stock_alerts WHERE kiosk_id = $1 AND NOT is_resolved",
        )
        .bind(kiosk_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }
}
