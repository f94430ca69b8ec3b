// src/services/analytics_service.rs

use chrono::{Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AnalyticsRepository, OrderRepository},
    models::{
        analytics::{
            AdvancedAnalytics, AnalyticsQuery, AnalyticsResponse, DateWindow, ExportRow, MonthlyGrowth,
            MonthlyTotal, RealtimeSnapshot, StockBand, StockBandCount, StockLevelCount,
        },
        order::{MonthlyOrdersPayload, OrderStats, OrderSummary},
    },
};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;
const GROWTH_LOOKBACK_DAYS: i64 = 365;

#[derive(Clone)]
pub struct AnalyticsService {
    analytics_repo: AnalyticsRepository,
    order_repo: OrderRepository,
    timezone: String,
}

impl AnalyticsService {
    pub fn new(analytics_repo: AnalyticsRepository, order_repo: OrderRepository, timezone: String) -> Self {
        Self { analytics_repo, order_repo, timezone }
    }

    /// Full dashboard; falls back to the legacy counters when any advanced query fails.
    pub async fn advanced(&self, company_id: Uuid, query: &AnalyticsQuery) -> Result<AnalyticsResponse, AppError> {
        validate_range(query)?;
        match self.compute_advanced(company_id, query).await {
            Ok(advanced) => Ok(AnalyticsResponse { fallback: false, advanced: Some(advanced), legacy: None }),
            Err(err) => {
                tracing::warn!(%company_id, error = ?err, "Advanced analytics failed, serving legacy stats");
                let legacy = self.order_stats(company_id).await?;
                Ok(AnalyticsResponse { fallback: true, advanced: None, legacy: Some(legacy) })
            }
        }
    }

    async fn compute_advanced(&self, company_id: Uuid, query: &AnalyticsQuery) -> Result<AdvancedAnalytics, AppError> {
        let repo = &self.analytics_repo;
        let tz = self.timezone.as_str();
        let window = repo.window(query.from, query.to, tz).await?;
        let limit = clamp_limit(query.limit);
        let granularity = query.granularity.unwrap_or_default();

        let growth_window = DateWindow {
            from: window.from.min(window.to - Duration::days(GROWTH_LOOKBACK_DAYS)),
            to: window.to,
        };

        let summary = repo.summary(company_id, window).await?;
        let revenue = repo.revenue_series(company_id, window, granularity, tz).await?;
        let top_products = repo.top_products(company_id, window, limit).await?;
        let top_gift_boxes = repo.top_gift_boxes(company_id, window, limit).await?;
        let top_customers = repo.top_customers(company_id, window, limit).await?;
        let product_levels = repo.product_stock_levels(company_id).await?;
        let gift_box_levels = repo.gift_box_stock_levels(company_id).await?;
        let hourly = repo.hourly(company_id, window, tz).await?;
        let weekdays = repo.weekdays(company_id, window, tz).await?;
        let regions = repo.regions(company_id, window).await?;
        let gst = repo.gst_breakdown(company_id, window).await?;
        let monthly = repo.monthly_totals(company_id, growth_window, tz).await?;

        Ok(AdvancedAnalytics {
            window,
            summary,
            revenue,
            top_products,
            top_gift_boxes,
            top_customers,
            stock_bands: stock_bands(&product_levels, &gift_box_levels),
            hourly,
            weekdays,
            regions,
            gst,
            growth: growth_series(&monthly),
        })
    }

    pub async fn export(&self, company_id: Uuid, query: &AnalyticsQuery) -> Result<Vec<ExportRow>, AppError> {
        validate_range(query)?;
        let window = self.analytics_repo.window(query.from, query.to, &self.timezone).await?;
        self.analytics_repo.export_rows(company_id, window).await
    }

    pub async fn realtime(&self, company_id: Uuid) -> Result<RealtimeSnapshot, AppError> {
        self.analytics_repo.realtime(company_id, &self.timezone, Utc::now()).await
    }

    // ---
    // Order dashboard
    // ---

    pub async fn order_stats(&self, company_id: Uuid) -> Result<OrderStats, AppError> {
        self.order_repo.stats(company_id, &self.timezone).await
    }

    pub async fn monthly_orders(
        &self,
        company_id: Uuid,
        payload: &MonthlyOrdersPayload,
    ) -> Result<Vec<OrderSummary>, AppError> {
        self.order_repo
            .monthly(company_id, payload.month, payload.year, &self.timezone)
            .await
    }
}

fn validate_range(query: &AnalyticsQuery) -> Result<(), AppError> {
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(AppError::BadRequest("`from` must not be after `to`.".into()));
        }
    }
    Ok(())
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Folds exact stock levels into the four bands, always returned in band order.
pub fn stock_bands(products: &[StockLevelCount], gift_boxes: &[StockLevelCount]) -> Vec<StockBandCount> {
    let mut bands: Vec<StockBandCount> = [StockBand::Out, StockBand::Low, StockBand::Medium, StockBand::High]
        .into_iter()
        .map(|band| StockBandCount { band, products: 0, gift_boxes: 0 })
        .collect();

    let slot = |stock: i32| match StockBand::classify(stock) {
        StockBand::Out => 0,
        StockBand::Low => 1,
        StockBand::Medium => 2,
        StockBand::High => 3,
    };
    for level in products {
        bands[slot(level.stock_available)].products += level.items;
    }
    for level in gift_boxes {
        bands[slot(level.stock_available)].gift_boxes += level.items;
    }
    bands
}

/// Month-over-month change in percent, rounded to two places. `None` for the
/// first month and whenever the previous month is zero.
pub fn growth_series(months: &[MonthlyTotal]) -> Vec<MonthlyGrowth> {
    let mut out = Vec::with_capacity(months.len());
    let mut previous: Option<&MonthlyTotal> = None;
    for month in months {
        let (revenue_growth_pct, orders_growth_pct) = match previous {
            Some(prev) => (
                percent_change(prev.revenue, month.revenue),
                percent_change(Decimal::from(prev.orders), Decimal::from(month.orders)),
            ),
            None => (None, None),
        };
        out.push(MonthlyGrowth {
            month: month.month,
            orders: month.orders,
            revenue: month.revenue,
            revenue_growth_pct,
            orders_growth_pct,
        });
        previous = Some(month);
    }
    out
}

fn percent_change(before: Decimal, after: Decimal) -> Option<Decimal> {
    if before.is_zero() {
        return None;
    }
    let change = (after - before) / before * Decimal::ONE_HUNDRED;
    Some(change.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
