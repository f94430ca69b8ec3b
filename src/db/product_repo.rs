// src/db/product_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::catalog::Product};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Reads
    // ---

    pub async fn list(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE company_id = $1 AND (status OR $2)
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    pub async fn low_stock(&self, company_id: Uuid, threshold: i32) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE company_id = $1 AND status AND stock_available <= $2
            ORDER BY stock_available ASC, name ASC
            "#,
        )
        .bind(company_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    // ---
    // Administrative writes
    // ---

    pub async fn create(
        &self,
        company_id: Uuid,
        name: &str,
        price: Decimal,
        stock_available: i32,
        image: Option<&str>,
    ) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, company_id, name, price, stock_available, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(name)
        .bind(price)
        .bind(stock_available)
        .bind(image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, || AppError::DuplicateName(format!("Product '{name}'"))))
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        price: Option<Decimal>,
        stock_available: Option<i32>,
        image: Option<&str>,
    ) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = COALESCE($3, name),
                price = COALESCE($4, price),
                stock_available = COALESCE($5, stock_available),
                image = COALESCE($6, image),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(name)
        .bind(price)
        .bind(stock_available)
        .bind(image)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, || {
                AppError::DuplicateName(format!("Product '{}'", name.unwrap_or_default()))
            })
        })
    }

    /// Flips `status` to false. Returns `None` when no active row matched.
    pub async fn soft_delete(&self, company_id: Uuid, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET status = FALSE, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    // ---
    // Stock mutation (order placement)
    // ---

    /// Decrements stock and books the sale in one conditional statement.
    /// `None` means the row is missing, inactive, or short on stock; nothing was written.
    pub async fn sell<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                stock_available = stock_available - $3,
                total_sales = total_sales + $3,
                total_revenue = total_revenue + ($3 * price),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status AND stock_available >= $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(quantity)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }
}
