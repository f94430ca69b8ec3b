// src/db/cart_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::cart::{Cart, SaveCartPayload},
};

#[derive(Clone)]
pub struct CartRepository {
    pool: PgPool,
}

impl CartRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, company_id: Uuid, client_id: &str) -> Result<Option<Cart>, AppError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT * FROM carts WHERE client_id = $1 AND company_id = $2",
        )
        .bind(client_id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cart)
    }

    pub async fn upsert(&self, company_id: Uuid, input: &SaveCartPayload) -> Result<Cart, AppError> {
        let cart = sqlx::query_as::<_, Cart>(
            r#"
            INSERT INTO carts (client_id, company_id, products, gift_boxes, discount, total, gst, grand_total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (client_id, company_id) DO UPDATE SET
                products = EXCLUDED.products,
                gift_boxes = EXCLUDED.gift_boxes,
                discount = EXCLUDED.discount,
                total = EXCLUDED.total,
                gst = EXCLUDED.gst,
                grand_total = EXCLUDED.grand_total,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&input.id)
        .bind(company_id)
        .bind(Json(&input.products))
        .bind(Json(&input.gift_boxes))
        .bind(input.discount)
        .bind(input.total)
        .bind(Json(&input.gst))
        .bind(input.grand_total)
        .fetch_one(&self.pool)
        .await?;
        Ok(cart)
    }

    pub async fn clear(&self, company_id: Uuid, client_id: &str) -> Result<bool, AppError> {
        self.delete(&self.pool, company_id, client_id).await
    }

    /// Returns whether a draft existed.
    pub async fn delete<'e, E>(&self, executor: E, company_id: Uuid, client_id: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM carts WHERE client_id = $1 AND company_id = $2")
            .bind(client_id)
            .bind(company_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
