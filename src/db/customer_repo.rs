// src/db/customer_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::customer::{CreateCustomerPayload, Customer, HistoryLine, UpdateCustomerPayload},
};

// The order history is derived from `orders.customer_id`, oldest first.
const ORDER_IDS: &str = "COALESCE((SELECT array_agg(o.id ORDER BY o.created_at) \
                         FROM orders o WHERE o.customer_id = c.id), '{}'::uuid[]) AS orders";

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<Customer>, AppError> {
        let sql = format!(
            "SELECT c.*, {ORDER_IDS} FROM customers c \
             WHERE c.company_id = $1 AND (c.status OR $2) ORDER BY c.name ASC"
        );
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .bind(company_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT c.*, {ORDER_IDS} FROM customers c WHERE c.id = $1 AND c.company_id = $2"
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn get(&self, company_id: Uuid, id: Uuid) -> Result<Option<Customer>, AppError> {
        self.find(&self.pool, company_id, id).await
    }

    pub async fn create(&self, company_id: Uuid, input: &CreateCustomerPayload) -> Result<Customer, AppError> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, company_id, name, phone, address, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *, '{}'::uuid[] AS orders
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(input.name.trim())
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(input.city.as_deref())
        .bind(input.state.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(customer)
    }

    pub async fn update(
        &self,
        company_id: Uuid,
        id: Uuid,
        input: &UpdateCustomerPayload,
    ) -> Result<Option<Customer>, AppError> {
        let sql = format!(
            r#"
            UPDATE customers c SET
                name = COALESCE($3, name),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                updated_at = NOW()
            WHERE c.id = $1 AND c.company_id = $2 AND c.status
            RETURNING c.*, {ORDER_IDS}
            "#
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(company_id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.phone.as_deref())
            .bind(input.address.as_deref())
            .bind(input.city.as_deref())
            .bind(input.state.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    pub async fn soft_delete(&self, company_id: Uuid, id: Uuid) -> Result<Option<Customer>, AppError> {
        let sql = format!(
            r#"
            UPDATE customers c SET status = FALSE, updated_at = NOW()
            WHERE c.id = $1 AND c.company_id = $2 AND c.status
            RETURNING c.*, {ORDER_IDS}
            "#
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    // ---
    // History
    // ---

    /// Headers of the customer's orders, newest first.
    pub async fn order_headers(
        &self,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<(Uuid, DateTime<Utc>, Decimal, Option<String>)>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, DateTime<Utc>, Decimal, Option<String>)>(
            r#"
            SELECT id, created_at, grand_total, invoice_pdf FROM orders
            WHERE company_id = $1 AND customer_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every line of every order of the customer, priced from the current catalog.
    pub async fn history_lines(&self, company_id: Uuid, customer_id: Uuid) -> Result<Vec<HistoryLine>, AppError> {
        let lines = sqlx::query_as::<_, HistoryLine>(
            r#"
            SELECT oi.order_id, oi.product_id AS item_id, p.name, 'product' AS kind,
                   oi.quantity, p.price AS unit_price, p.price * oi.quantity AS line_total,
                   0 AS section, oi.position
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE o.company_id = $1 AND o.customer_id = $2
            UNION ALL
            SELECT og.order_id, og.gift_box_id, g.name, 'giftbox',
                   og.quantity, g.grand_total, g.grand_total * og.quantity,
                   1, og.position
            FROM order_gift_boxes og
            JOIN orders o ON o.id = og.order_id
            JOIN gift_boxes g ON g.id = og.gift_box_id
            WHERE o.company_id = $1 AND o.customer_id = $2
            ORDER BY order_id, section, position
            "#,
        )
        .bind(company_id)
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
