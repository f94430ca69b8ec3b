// src/models/analytics.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::order::OrderStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Unit understood by Postgres `date_trunc`.
    pub fn trunc_unit(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Inclusive start date (YYYY-MM-DD). Defaults to 30 days before `to`.
    pub from: Option<NaiveDate>,
    /// Inclusive end date (YYYY-MM-DD). Defaults to today.
    pub to: Option<NaiveDate>,
    pub granularity: Option<Granularity>,
    /// Leaderboard size, 1..=100.
    pub limit: Option<i64>,
}

/// Half-open UTC interval `[from, to)` covering whole calendar days in the analytics time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowSummary {
    pub orders: i64,
    pub revenue: Decimal,
    pub customers: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub period: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemLeader {
    pub id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLeader {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockBand {
    Out,
    Low,
    Medium,
    High,
}

impl StockBand {
    pub const LOW_MAX: i32 = 10;
    pub const MEDIUM_MAX: i32 = 50;

    pub fn classify(stock: i32) -> Self {
        match stock {
            s if s <= 0 => StockBand::Out,
            s if s <= Self::LOW_MAX => StockBand::Low,
            s if s <= Self::MEDIUM_MAX => StockBand::Medium,
            _ => StockBand::High,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StockLevelCount {
    pub stock_available: i32,
    pub items: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockBandCount {
    pub band: StockBand,
    pub products: i64,
    pub gift_boxes: i64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HourlyPoint {
    pub hour: i32,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayPoint {
    /// 0 = Sunday .. 6 = Saturday
    pub day: i32,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionPoint {
    pub city: Option<String>,
    pub state: Option<String>,
    pub customers: i64,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GstBucket {
    pub gst_status: bool,
    pub orders: i64,
    pub revenue: Decimal,
    pub gst_collected: Decimal,
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthlyTotal {
    pub month: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyGrowth {
    pub month: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
    /// Percent change against the previous month; absent for the first month or a zero base.
    pub revenue_growth_pct: Option<Decimal>,
    pub orders_growth_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedAnalytics {
    pub window: DateWindow,
    pub summary: WindowSummary,
    pub revenue: Vec<RevenuePoint>,
    pub top_products: Vec<ItemLeader>,
    pub top_gift_boxes: Vec<ItemLeader>,
    pub top_customers: Vec<CustomerLeader>,
    pub stock_bands: Vec<StockBandCount>,
    pub hourly: Vec<HourlyPoint>,
    pub weekdays: Vec<WeekdayPoint>,
    pub regions: Vec<RegionPoint>,
    pub gst: Vec<GstBucket>,
    pub growth: Vec<MonthlyGrowth>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    /// True when the advanced queries failed and only the legacy dashboard is returned.
    pub fallback: bool,
    pub advanced: Option<AdvancedAnalytics>,
    pub legacy: Option<OrderStats>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub items: i64,
    pub total: Decimal,
    pub discount: Decimal,
    pub gst_status: bool,
    pub gst_amount: Decimal,
    pub grand_total: Decimal,
    pub invoice_pdf: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeSnapshot {
    pub orders_today: i64,
    pub revenue_today: Decimal,
    pub orders_last_hour: i64,
    pub revenue_last_hour: Decimal,
    pub low_stock_products: i64,
    pub pending_invoices: i64,
    pub generated_at: DateTime<Utc>,
}
