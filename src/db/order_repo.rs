// src/db/order_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        customer::HistoryLine,
        order::{GiftBoxLineInput, NewOrder, Order, OrderLine, OrderStats, OrderSummary, ProductLineInput},
    },
};

const SUMMARY_COLUMNS: &str = "o.id, o.customer_id, o.customer_info->>'name' AS customer_name, \
                               o.total, o.grand_total, o.gst_status, o.invoice_pdf, \
                               o.invoice_status, o.created_at";

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Placement (inside the placement transaction)
    // ---

    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewOrder) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (
                id, company_id, customer_id, customer_info,
                gst_status, gst_percentage, gst_amount,
                discount, total, grand_total, invoice_status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'PENDING')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.company_id)
        .bind(order.customer_id)
        .bind(Json(&order.customer_info))
        .bind(order.gst.status)
        .bind(order.gst.percentage)
        .bind(order.gst.amount)
        .bind(order.discount)
        .bind(order.total)
        .bind(order.grand_total)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert_product_lines<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        lines: &[ProductLineInput],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, position, product_id, quantity)
            SELECT $1, t.ord::int - 1, t.item_id, t.quantity
            FROM UNNEST($2::uuid[], $3::int[]) WITH ORDINALITY AS t(item_id, quantity, ord)
            "#,
        )
        .bind(order_id)
        .bind(&ids)
        .bind(&quantities)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_gift_box_lines<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        lines: &[GiftBoxLineInput],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let ids: Vec<Uuid> = lines.iter().map(|l| l.gift_box_id).collect();
        let quantities: Vec<i32> = lines.iter().map(|l| l.quantity).collect();
        sqlx::query(
            r#"
            INSERT INTO order_gift_boxes (order_id, position, gift_box_id, quantity)
            SELECT $1, t.ord::int - 1, t.item_id, t.quantity
            FROM UNNEST($2::uuid[], $3::int[]) WITH ORDINALITY AS t(item_id, quantity, ord)
            "#,
        )
        .bind(order_id)
        .bind(&ids)
        .bind(&quantities)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Invoice state
    // ---

    pub async fn mark_invoice_ready(&self, order_id: Uuid, url: &str) -> Result<Order, AppError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET
                invoice_pdf = $2,
                invoice_status = 'READY',
                invoice_attempts = invoice_attempts + 1,
                invoice_error = NULL
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(order_id)
        .bind(url)
        .fetch_one(&self.pool)
        .await?;
        Ok(order)
    }

    pub async fn mark_invoice_failed(&self, order_id: Uuid, reason: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE orders SET
                invoice_status = 'FAILED',
                invoice_attempts = invoice_attempts + 1,
                invoice_error = $2
            WHERE id = $1 AND invoice_status <> 'READY'
            "#,
        )
        .bind(order_id)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Orders whose invoice never completed: FAILED ones, and PENDING ones older than
    /// `stale_after_secs` (a placement that died mid-flight). Oldest first.
    pub async fn list_unfinished_invoices(
        &self,
        max_attempts: i32,
        stale_after_secs: i64,
        limit: i64,
    ) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE invoice_attempts < $1
              AND (invoice_status = 'FAILED'
                   OR (invoice_status = 'PENDING'
                       AND created_at < NOW() - make_interval(secs => $2::double precision)))
            ORDER BY created_at ASC
            LIMIT $3
            "#,
        )
        .bind(max_attempts)
        .bind(stale_after_secs as f64)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    // ---
    // Reads
    // ---

    pub async fn find(&self, company_id: Uuid, id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 AND company_id = $2")
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    /// Normalized `(product lines, gift-box lines)` in stored order.
    pub async fn lines(&self, order_id: Uuid) -> Result<(Vec<OrderLine>, Vec<OrderLine>), AppError> {
        let products = sqlx::query_as::<_, OrderLine>(
            "SELECT product_id AS item_id, quantity FROM order_items WHERE order_id = $1 ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        let gift_boxes = sqlx::query_as::<_, OrderLine>(
            "SELECT gift_box_id AS item_id, quantity FROM order_gift_boxes WHERE order_id = $1 ORDER BY position",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok((products, gift_boxes))
    }

    /// Lines with names and unit prices from the current catalog; products first.
    pub async fn priced_lines(&self, order_id: Uuid) -> Result<Vec<HistoryLine>, AppError> {
        let lines = sqlx::query_as::<_, HistoryLine>(
            r#"
            SELECT oi.order_id, oi.product_id AS item_id, p.name, 'product' AS kind,
                   oi.quantity, p.price AS unit_price, p.price * oi.quantity AS line_total,
                   0 AS section, oi.position
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            UNION ALL
            SELECT og.order_id, og.gift_box_id, g.name, 'giftbox',
                   og.quantity, g.grand_total, g.grand_total * og.quantity,
                   1, og.position
            FROM order_gift_boxes og
            JOIN gift_boxes g ON g.id = og.gift_box_id
            WHERE og.order_id = $1
            ORDER BY section, position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    pub async fn list(&self, company_id: Uuid) -> Result<Vec<OrderSummary>, AppError> {
        let sql = format!(
            "SELECT {SUMMARY_COLUMNS} FROM orders o WHERE o.company_id = $1 ORDER BY o.created_at DESC"
        );
        let orders = sqlx::query_as::<_, OrderSummary>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    pub async fn monthly(
        &self,
        company_id: Uuid,
        month: u32,
        year: i32,
        timezone: &str,
    ) -> Result<Vec<OrderSummary>, AppError> {
        let sql = format!(
            r#"
            SELECT {SUMMARY_COLUMNS} FROM orders o
            WHERE o.company_id = $1
              AND EXTRACT(MONTH FROM o.created_at AT TIME ZONE $4)::int = $2
              AND EXTRACT(YEAR FROM o.created_at AT TIME ZONE $4)::int = $3
            ORDER BY o.created_at DESC
            "#
        );
        let orders = sqlx::query_as::<_, OrderSummary>(&sql)
            .bind(company_id)
            .bind(month as i32)
            .bind(year)
            .bind(timezone)
            .fetch_all(&self.pool)
            .await?;
        Ok(orders)
    }

    /// Dashboard counters; "today" is the calendar day in `timezone`.
    pub async fn stats(&self, company_id: Uuid, timezone: &str) -> Result<OrderStats, AppError> {
        let stats = sqlx::query_as::<_, OrderStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM orders WHERE company_id = $1) AS total_orders,
                (SELECT COALESCE(SUM(grand_total), 0) FROM orders WHERE company_id = $1) AS total_revenue,
                (SELECT COUNT(*) FROM customers WHERE company_id = $1 AND status) AS total_customers,
                (SELECT COUNT(*) FROM products WHERE company_id = $1 AND status) AS total_products,
                (SELECT COUNT(*) FROM gift_boxes WHERE company_id = $1 AND status) AS total_gift_boxes,
                (SELECT COUNT(*) FROM orders
                  WHERE company_id = $1
                    AND (created_at AT TIME ZONE $2)::date = (NOW() AT TIME ZONE $2)::date) AS orders_today,
                (SELECT COALESCE(SUM(grand_total), 0) FROM orders
                  WHERE company_id = $1
                    AND (created_at AT TIME ZONE $2)::date = (NOW() AT TIME ZONE $2)::date) AS revenue_today,
                (SELECT COUNT(*) FROM orders
                  WHERE company_id = $1 AND invoice_status <> 'READY') AS pending_invoices
            "#,
        )
        .bind(company_id)
        .bind(timezone)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
