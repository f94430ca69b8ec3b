// src/db/analytics_repo.rs

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::analytics::{
        CustomerLeader, DateWindow, ExportRow, GstBucket, Granularity, HourlyPoint, ItemLeader,
        MonthlyTotal, RealtimeSnapshot, RegionPoint, RevenuePoint, StockBand, StockLevelCount,
        WeekdayPoint, WindowSummary,
    },
};

// Read-only aggregation queries. Every query is scoped by company and by the
// half-open window [from, to).
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves calendar dates in `timezone` to UTC bounds. Defaults: `to` = today,
    /// `from` = 30 days before `to`.
    pub async fn window(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        timezone: &str,
    ) -> Result<DateWindow, AppError> {
        let window = sqlx::query_as::<_, DateWindow>(
            r#"
            WITH bounds AS (
                SELECT COALESCE($2::date, (NOW() AT TIME ZONE $3)::date) AS to_day
            )
            SELECT (COALESCE($1::date, to_day - 30)::timestamp AT TIME ZONE $3) AS "from",
                   ((to_day + 1)::timestamp AT TIME ZONE $3) AS "to"
            FROM bounds
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(timezone)
        .fetch_one(&self.pool)
        .await?;
        Ok(window)
    }

    pub async fn summary(&self, company_id: Uuid, window: DateWindow) -> Result<WindowSummary, AppError> {
        let row = sqlx::query_as::<_, WindowSummary>(
            r#"
            SELECT COUNT(*) AS orders,
                   COALESCE(SUM(grand_total), 0) AS revenue,
                   COUNT(DISTINCT customer_id) AS customers
            FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn revenue_series(
        &self,
        company_id: Uuid,
        window: DateWindow,
        granularity: Granularity,
        timezone: &str,
    ) -> Result<Vec<RevenuePoint>, AppError> {
        let rows = sqlx::query_as::<_, RevenuePoint>(
            r#"
            SELECT date_trunc($4, created_at AT TIME ZONE $5)::date AS period,
                   COUNT(*) AS orders,
                   COALESCE(SUM(grand_total), 0) AS revenue
            FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY period
            ORDER BY period ASC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(granularity.trunc_unit())
        .bind(timezone)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Leaderboards
    // ---

    pub async fn top_products(&self, company_id: Uuid, window: DateWindow, limit: i64) -> Result<Vec<ItemLeader>, AppError> {
        let rows = sqlx::query_as::<_, ItemLeader>(
            r#"
            SELECT p.id, p.name,
                   SUM(oi.quantity)::bigint AS quantity,
                   COALESCE(SUM(oi.quantity * p.price), 0) AS revenue
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE o.company_id = $1 AND o.created_at >= $2 AND o.created_at < $3
            GROUP BY p.id, p.name
            ORDER BY quantity DESC, revenue DESC
            LIMIT $4
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn top_gift_boxes(&self, company_id: Uuid, window: DateWindow, limit: i64) -> Result<Vec<ItemLeader>, AppError> {
        let rows = sqlx::query_as::<_, ItemLeader>(
            r#"
            SELECT g.id, g.name,
                   SUM(og.quantity)::bigint AS quantity,
                   COALESCE(SUM(og.quantity * g.grand_total), 0) AS revenue
            FROM order_gift_boxes og
            JOIN orders o ON o.id = og.order_id
            JOIN gift_boxes g ON g.id = og.gift_box_id
            WHERE o.company_id = $1 AND o.created_at >= $2 AND o.created_at < $3
            GROUP BY g.id, g.name
            ORDER BY quantity DESC, revenue DESC
            LIMIT $4
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn top_customers(&self, company_id: Uuid, window: DateWindow, limit: i64) -> Result<Vec<CustomerLeader>, AppError> {
        let rows = sqlx::query_as::<_, CustomerLeader>(
            r#"
            SELECT c.id, c.name, c.phone,
                   COUNT(o.id) AS orders,
                   COALESCE(SUM(o.grand_total), 0) AS revenue
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.company_id = $1 AND o.created_at >= $2 AND o.created_at < $3
            GROUP BY c.id, c.name, c.phone
            ORDER BY revenue DESC, orders DESC
            LIMIT $4
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Inventory
    // ---

    /// Active products grouped by exact stock level; banding happens in the service.
    pub async fn product_stock_levels(&self, company_id: Uuid) -> Result<Vec<StockLevelCount>, AppError> {
        let rows = sqlx::query_as::<_, StockLevelCount>(
            r#"
            SELECT stock_available, COUNT(*) AS items FROM products
            WHERE company_id = $1 AND status
            GROUP BY stock_available
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn gift_box_stock_levels(&self, company_id: Uuid) -> Result<Vec<StockLevelCount>, AppError> {
        let rows = sqlx::query_as::<_, StockLevelCount>(
            r#"
            SELECT stock_available, COUNT(*) AS items FROM gift_boxes
            WHERE company_id = $1 AND status
            GROUP BY stock_available
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Trends
    // ---

    pub async fn hourly(&self, company_id: Uuid, window: DateWindow, timezone: &str) -> Result<Vec<HourlyPoint>, AppError> {
        let rows = sqlx::query_as::<_, HourlyPoint>(
            r#"
            SELECT EXTRACT(HOUR FROM created_at AT TIME ZONE $4)::int AS hour,
                   COUNT(*) AS orders,
                   COALESCE(SUM(grand_total), 0) AS revenue
            FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY hour
            ORDER BY hour ASC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(timezone)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn weekdays(&self, company_id: Uuid, window: DateWindow, timezone: &str) -> Result<Vec<WeekdayPoint>, AppError> {
        let rows = sqlx::query_as::<_, WeekdayPoint>(
            r#"
            SELECT EXTRACT(DOW FROM created_at AT TIME ZONE $4)::int AS day,
                   COUNT(*) AS orders,
                   COALESCE(SUM(grand_total), 0) AS revenue
            FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(timezone)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn regions(&self, company_id: Uuid, window: DateWindow) -> Result<Vec<RegionPoint>, AppError> {
        let rows = sqlx::query_as::<_, RegionPoint>(
            r#"
            SELECT c.city, c.state,
                   COUNT(DISTINCT c.id) AS customers,
                   COUNT(o.id) AS orders,
                   COALESCE(SUM(o.grand_total), 0) AS revenue
            FROM orders o
            JOIN customers c ON c.id = o.customer_id
            WHERE o.company_id = $1 AND o.created_at >= $2 AND o.created_at < $3
            GROUP BY c.city, c.state
            ORDER BY revenue DESC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn gst_breakdown(&self, company_id: Uuid, window: DateWindow) -> Result<Vec<GstBucket>, AppError> {
        let rows = sqlx::query_as::<_, GstBucket>(
            r#"
            SELECT gst_status,
                   COUNT(*) AS orders,
                   COALESCE(SUM(grand_total), 0) AS revenue,
                   COALESCE(SUM(gst_amount) FILTER (WHERE gst_status), 0) AS gst_collected
            FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY gst_status
            ORDER BY gst_status DESC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Calendar-month totals (in `timezone`) for every month touching the window.
    pub async fn monthly_totals(&self, company_id: Uuid, window: DateWindow, timezone: &str) -> Result<Vec<MonthlyTotal>, AppError> {
        let rows = sqlx::query_as::<_, MonthlyTotal>(
            r#"
            SELECT date_trunc('month', created_at AT TIME ZONE $4)::date AS month,
                   COUNT(*) AS orders,
                   COALESCE(SUM(grand_total), 0) AS revenue
            FROM orders
            WHERE company_id = $1 AND created_at >= $2 AND created_at < $3
            GROUP BY month
            ORDER BY month ASC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .bind(timezone)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Export & realtime
    // ---

    pub async fn export_rows(&self, company_id: Uuid, window: DateWindow) -> Result<Vec<ExportRow>, AppError> {
        let rows = sqlx::query_as::<_, ExportRow>(
            r#"
            SELECT o.id AS order_id, o.created_at,
                   o.customer_info->>'name' AS customer_name,
                   o.customer_info->>'phone' AS phone,
                   c.city, c.state,
                   (SELECT COALESCE(SUM(quantity), 0) FROM order_items WHERE order_id = o.id)::bigint
                     + (SELECT COALESCE(SUM(quantity), 0) FROM order_gift_boxes WHERE order_id = o.id)::bigint
                     AS items,
                   o.total, o.discount, o.gst_status, o.gst_amount, o.grand_total, o.invoice_pdf
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.company_id = $1 AND o.created_at >= $2 AND o.created_at < $3
            ORDER BY o.created_at ASC
            "#,
        )
        .bind(company_id)
        .bind(window.from)
        .bind(window.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn realtime(&self, company_id: Uuid, timezone: &str, now: DateTime<Utc>) -> Result<RealtimeSnapshot, AppError> {
        let row = sqlx::query_as::<_, RealtimeSnapshot>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE (o.created_at AT TIME ZONE $2)::date = ($3 AT TIME ZONE $2)::date) AS orders_today,
                COALESCE(SUM(o.grand_total) FILTER (WHERE (o.created_at AT TIME ZONE $2)::date = ($3 AT TIME ZONE $2)::date), 0) AS revenue_today,
                COUNT(*) FILTER (WHERE o.created_at >= $3 - INTERVAL '1 hour') AS orders_last_hour,
                COALESCE(SUM(o.grand_total) FILTER (WHERE o.created_at >= $3 - INTERVAL '1 hour'), 0) AS revenue_last_hour,
                (SELECT COUNT(*) FROM products
                  WHERE company_id = $1 AND status AND stock_available <= $4) AS low_stock_products,
                COUNT(*) FILTER (WHERE o.invoice_status <> 'READY') AS pending_invoices,
                $3 AS generated_at
            FROM orders o
            WHERE o.company_id = $1
            "#,
        )
        .bind(company_id)
        .bind(timezone)
        .bind(now)
        .bind(StockBand::LOW_MAX)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
