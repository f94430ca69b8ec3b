// src/db/giftbox_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{GiftBox, GiftBoxComponent, GiftBoxItem},
};

#[derive(Clone)]
pub struct GiftBoxRepository {
    pool: PgPool,
}

impl GiftBoxRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Reads
    // ---

    pub async fn list(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<GiftBox>, AppError> {
        let boxes = sqlx::query_as::<_, GiftBox>(
            r#"
            SELECT * FROM gift_boxes
            WHERE company_id = $1 AND (status OR $2)
            ORDER BY name ASC
            "#,
        )
        .bind(company_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;
        Ok(boxes)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<GiftBox>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let gift_box = sqlx::query_as::<_, GiftBox>(
            "SELECT * FROM gift_boxes WHERE id = $1 AND company_id = $2",
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;
        Ok(gift_box)
    }

    /// Contents of a box in their stored order, joined with product name and current price.
    pub async fn items<'e, E>(&self, executor: E, gift_box_id: Uuid) -> Result<Vec<GiftBoxItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, GiftBoxItem>(
            r#"
            SELECT gi.product_id, p.name AS product_name, p.price, gi.quantity
            FROM gift_box_items gi
            JOIN products p ON p.id = gi.product_id
            WHERE gi.gift_box_id = $1
            ORDER BY gi.position ASC
            "#,
        )
        .bind(gift_box_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    /// Number of distinct ids in `product_ids` that are active products of the company.
    pub async fn count_owned_products<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM products
            WHERE company_id = $1 AND status AND id = ANY($2)
            "#,
        )
        .bind(company_id)
        .bind(product_ids)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    // ---
    // Administrative writes (run inside the caller's transaction)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        discount: Decimal,
        total: Decimal,
        grand_total: Decimal,
        stock_available: i32,
    ) -> Result<GiftBox, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, GiftBox>(
            r#"
            INSERT INTO gift_boxes (id, company_id, name, discount, total, grand_total, stock_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(name)
        .bind(discount)
        .bind(total)
        .bind(grand_total)
        .bind(stock_available)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, || AppError::DuplicateName(format!("Gift box '{name}'"))))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        discount: Option<Decimal>,
        total: Option<Decimal>,
        grand_total: Option<Decimal>,
        stock_available: Option<i32>,
    ) -> Result<Option<GiftBox>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, GiftBox>(
            r#"
            UPDATE gift_boxes SET
                name = COALESCE($3, name),
                discount = COALESCE($4, discount),
                total = COALESCE($5, total),
                grand_total = COALESCE($6, grand_total),
                stock_available = COALESCE($7, stock_available),
                updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .bind(name)
        .bind(discount)
        .bind(total)
        .bind(grand_total)
        .bind(stock_available)
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            AppError::from_unique_violation(e, || {
                AppError::DuplicateName(format!("Gift box '{}'", name.unwrap_or_default()))
            })
        })
    }

    pub async fn clear_items<'e, E>(&self, executor: E, gift_box_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM gift_box_items WHERE gift_box_id = $1")
            .bind(gift_box_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Stores the contents; positions follow slice order.
    pub async fn insert_items<'e, E>(
        &self,
        executor: E,
        gift_box_id: Uuid,
        components: &[GiftBoxComponent],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product_ids: Vec<Uuid> = components.iter().map(|c| c.product_id).collect();
        let quantities: Vec<i32> = components.iter().map(|c| c.quantity).collect();

        sqlx::query(
            r#"
            INSERT INTO gift_box_items (gift_box_id, position, product_id, quantity)
            SELECT $1, t.ord::int - 1, t.product_id, t.quantity
            FROM UNNEST($2::uuid[], $3::int[]) WITH ORDINALITY AS t(product_id, quantity, ord)
            "#,
        )
        .bind(gift_box_id)
        .bind(&product_ids)
        .bind(&quantities)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn soft_delete(&self, company_id: Uuid, id: Uuid) -> Result<Option<GiftBox>, AppError> {
        let gift_box = sqlx::query_as::<_, GiftBox>(
            r#"
            UPDATE gift_boxes SET status = FALSE, updated_at = NOW()
            WHERE id = $1 AND company_id = $2 AND status
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(gift_box)
    }

    // ---
    // Stock mutation (order placement)
    // ---

    /// Same contract as `ProductRepository::sell`; the box's grand total is its unit price.
    pub async fn sell<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
        quantity: i32,
    ) -> Result<Option<GiftBox>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let gift_box = sqlx::query_as::<_, GiftBox>(
            r#"
            UPDATE gift_boxes SET
                stock_available = stock_available - $3,
                total_sales = total_sales + $3,
                total_revenue = total_revenue + ($3 * grand_total),
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
        Ok(gift_box)
    }
}
