// src/services/order_service.rs

use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{
        CartRepository, CompanyRepository, CustomerRepository, GiftBoxRepository, OrderRepository,
        ProductRepository,
    },
    models::{
        company::Company,
        customer::HistoryLine,
        order::{
            CustomerInfo, InvoiceStatus, NewOrder, Order, OrderDetail, OrderSummary, PlaceOrderPayload, PlaceOrderResponse,
            PlacementStage,
        },
    },
    services::{
        document_service::{render_with_retry, InvoiceDocument, InvoiceLine, InvoiceRenderer},
        pricing,
        storage_service::DocumentStorage,
    },
};

/// PENDING orders younger than this are assumed to still be in flight.
const STALE_PENDING_SECS: i64 = 120;
const RECONCILE_BATCH: i64 = 20;

#[derive(Clone)]
pub struct OrderService {
    pool: PgPool,
    order_repo: OrderRepository,
    product_repo: ProductRepository,
    giftbox_repo: GiftBoxRepository,
    customer_repo: CustomerRepository,
    company_repo: CompanyRepository,
    cart_repo: CartRepository,
    renderer: Arc<dyn InvoiceRenderer>,
    storage: Arc<dyn DocumentStorage>,
    invoice_retry_delay: Duration,
}

impl OrderService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        order_repo: OrderRepository,
        product_repo: ProductRepository,
        giftbox_repo: GiftBoxRepository,
        customer_repo: CustomerRepository,
        company_repo: CompanyRepository,
        cart_repo: CartRepository,
        renderer: Arc<dyn InvoiceRenderer>,
        storage: Arc<dyn DocumentStorage>,
        invoice_retry_delay: Duration,
    ) -> Self {
        Self {
            pool,
            order_repo,
            product_repo,
            giftbox_repo,
            customer_repo,
            company_repo,
            cart_repo,
            renderer,
            storage,
            invoice_retry_delay,
        }
    }

    // ---
    // Placement
    // ---

    /// Validates, books stock and the order atomically, then produces the invoice.
    ///
    /// Precondition failures leave no trace. Once the order is committed, an
    /// invoice failure keeps the order (status FAILED) and surfaces its id so the
    /// invoice can be regenerated.
    pub async fn place_order(&self, company: &Company, payload: PlaceOrderPayload) -> Result<PlaceOrderResponse, AppError> {
        payload.validate()?;
        let (Some(customer_id), Some(products), Some(discount), Some(total), Some(grand_total), Some(gst)) = (
            payload.customer_id,
            payload.products.as_ref(),
            payload.discount,
            payload.total,
            payload.grand_total,
            payload.gst.as_ref(),
        ) else {
            return Err(AppError::BadRequest("Missing required order fields.".into()));
        };
        let gift_boxes = &payload.gift_boxes;
        let gst = pricing::normalize_gst(gst)?;

        let customer = self
            .customer_repo
            .get(company.id, customer_id)
            .await?
            .filter(|c| c.status)
            .ok_or_else(|| AppError::NotFound("Customer".into()))?;

        // Availability and prices, line by line; the first failure wins.
        let mut priced: Vec<(Decimal, i32)> = Vec::with_capacity(products.len() + gift_boxes.len());
        for line in products {
            ensure_quantity(line.quantity)?;
            let product = self
                .product_repo
                .find(&self.pool, company.id, line.product_id)
                .await?
                .filter(|p| p.status)
                .ok_or_else(|| AppError::NotFound("Product".into()))?;
            if product.stock_available < line.quantity {
                return Err(AppError::InsufficientStock {
                    name: product.name,
                    available: product.stock_available,
                    requested: line.quantity,
                });
            }
            priced.push((product.price, line.quantity));
        }
        for line in gift_boxes {
            ensure_quantity(line.quantity)?;
            let gift_box = self
                .giftbox_repo
                .find(&self.pool, company.id, line.gift_box_id)
                .await?
                .filter(|g| g.status)
                .ok_or_else(|| AppError::NotFound("Gift box".into()))?;
            if gift_box.stock_available < line.quantity {
                return Err(AppError::InsufficientStock {
                    name: gift_box.name,
                    available: gift_box.stock_available,
                    requested: line.quantity,
                });
            }
            priced.push((gift_box.grand_total, line.quantity));
        }

        let totals = pricing::compute_totals(&priced, discount, &gst)?;
        pricing::verify_client_totals(&totals, total, grand_total)?;
        let mut stage = PlacementStage::Validated;

        // --- Stock and order, one transaction ---
        let mut tx = self.pool.begin().await?;

        for line in products {
            let sold = self
                .product_repo
                .sell(&mut *tx, company.id, line.product_id, line.quantity)
                .await?;
            if sold.is_none() {
                // a concurrent sale won the race; dropping `tx` rolls back earlier lines
                let current = self.product_repo.find(&self.pool, company.id, line.product_id).await?;
                return Err(stock_conflict("Product", current.map(|p| (p.name, p.stock_available)), line.quantity));
            }
        }
        for line in gift_boxes {
            let sold = self
                .giftbox_repo
                .sell(&mut *tx, company.id, line.gift_box_id, line.quantity)
                .await?;
            if sold.is_none() {
                let current = self.giftbox_repo.find(&self.pool, company.id, line.gift_box_id).await?;
                return Err(stock_conflict("Gift box", current.map(|g| (g.name, g.stock_available)), line.quantity));
            }
        }
        advance(&mut stage, PlacementStage::StockReserved);

        let order = self
            .order_repo
            .insert_order(
                &mut *tx,
                &NewOrder {
                    company_id: company.id,
                    customer_id: customer.id,
                    customer_info: CustomerInfo {
                        name: customer.name.clone(),
                        phone: customer.phone.clone(),
                        address: customer.address.clone(),
                    },
                    gst,
                    discount,
                    total: totals.total,
                    grand_total: totals.grand_total,
                },
            )
            .await?;
        self.order_repo.insert_product_lines(&mut *tx, order.id, products).await?;
        self.order_repo.insert_gift_box_lines(&mut *tx, order.id, gift_boxes).await?;
        tx.commit().await?;
        advance(&mut stage, PlacementStage::OrderPersisted);

        tracing::info!(
            company_id = %company.id,
            order_id = %order.id,
            customer_id = %customer.id,
            grand_total = %order.grand_total,
            "Order placed"
        );

        // --- Invoice ---
        advance(&mut stage, PlacementStage::InvoiceRequested);
        let ready = self.produce_invoice(company, &order).await;
        advance(
            &mut stage,
            if ready.is_ok() { PlacementStage::InvoiceReady } else { PlacementStage::InvoiceFailed },
        );
        let ready = ready?;

        if let Some(cart_id) = payload.cart_id.as_deref() {
            if let Err(err) = self.cart_repo.clear(company.id, cart_id).await {
                tracing::warn!(order_id = %order.id, error = %err, "Could not remove the draft cart");
            }
        }

        Ok(PlaceOrderResponse {
            order_id: ready.id,
            invoice_url: ready.invoice_pdf.unwrap_or_default(),
            grand_total: ready.grand_total,
        })
    }

    // ---
    // Invoice pipeline and reconciliation
    // ---

    /// Idempotent: an order whose invoice is already READY is returned as is.
    pub async fn regenerate_invoice(&self, company: &Company, order_id: Uuid) -> Result<PlaceOrderResponse, AppError> {
        let order = self
            .order_repo
            .find(company.id, order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".into()))?;

        let order = if order.invoice_status == InvoiceStatus::Ready && order.invoice_pdf.is_some() {
            order
        } else {
            self.produce_invoice(company, &order).await?
        };

        Ok(PlaceOrderResponse {
            order_id: order.id,
            invoice_url: order.invoice_pdf.unwrap_or_default(),
            grand_total: order.grand_total,
        })
    }

    /// Render, upload and mark READY; on failure the order is marked FAILED.
    async fn produce_invoice(&self, company: &Company, order: &Order) -> Result<Order, AppError> {
        match self.try_produce_invoice(company, order).await {
            Ok(url) => self.order_repo.mark_invoice_ready(order.id, &url).await,
            Err(err) => {
                let reason = err.to_string();
                tracing::error!(order_id = %order.id, error = ?err, "Invoice generation failed");
                if let Err(mark_err) = self.order_repo.mark_invoice_failed(order.id, &reason).await {
                    tracing::error!(order_id = %order.id, error = ?mark_err, "Could not record invoice failure");
                }
                Err(AppError::InvoiceFailed { order_id: order.id, reason })
            }
        }
    }

    async fn try_produce_invoice(&self, company: &Company, order: &Order) -> Result<String, AppError> {
        let lines = self.order_repo.priced_lines(order.id).await?;
        let document = invoice_document(company, order, lines);

        let path = render_with_retry(self.renderer.as_ref(), &document, self.invoice_retry_delay).await?;
        let stored = self
            .storage
            .store(&path, &company.name, &document.customer.name)
            .await;
        if let Err(err) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), error = %err, "Temporary invoice not removed");
        }
        stored
    }

    /// One pass over unfinished invoices. Returns how many were completed.
    pub async fn reconcile_invoices(&self, max_attempts: i32) -> Result<usize, AppError> {
        let pending = self
            .order_repo
            .list_unfinished_invoices(max_attempts, STALE_PENDING_SECS, RECONCILE_BATCH)
            .await?;

        let mut completed = 0;
        for order in pending {
            let Some(company) = self.company_repo.find_by_id(order.company_id).await? else {
                continue;
            };
            match self.produce_invoice(&company, &order).await {
                Ok(_) => completed += 1,
                Err(err) => tracing::warn!(order_id = %order.id, error = %err, "Invoice still failing"),
            }
        }
        Ok(completed)
    }

    /// Periodically finishes orders whose invoice failed. A zero interval disables it.
    pub fn spawn_invoice_reconciler(&self, interval: Duration, max_attempts: i32) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            tracing::info!("Invoice reconciler disabled");
            return None;
        }
        let service = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match service.reconcile_invoices(max_attempts).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(completed = n, "Reconciled invoices"),
                    Err(err) => tracing::error!(error = ?err, "Invoice reconciliation pass failed"),
                }
            }
        }))
    }

    // ---
    // Reads
    // ---

    pub async fn get_order(&self, company_id: Uuid, id: Uuid) -> Result<OrderDetail, AppError> {
        let order = self
            .order_repo
            .find(company_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".into()))?;
        let (cart_items, gift_boxes) = self.order_repo.lines(order.id).await?;
        Ok(OrderDetail { order, cart_items, gift_boxes })
    }

    pub async fn list_orders(&self, company_id: Uuid) -> Result<Vec<OrderSummary>, AppError> {
        self.order_repo.list(company_id).await
    }
}

fn ensure_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1.".into()));
    }
    Ok(())
}

fn stock_conflict(kind: &str, current: Option<(String, i32)>, requested: i32) -> AppError {
    match current {
        Some((name, available)) => AppError::InsufficientStock { name, available, requested },
        None => AppError::NotFound(kind.into()),
    }
}

fn advance(stage: &mut PlacementStage, next: PlacementStage) {
    debug_assert!(stage.can_advance_to(next), "illegal placement transition {stage:?} -> {next:?}");
    tracing::debug!(from = ?stage, to = ?next, "Placement stage");
    *stage = next;
}

/// Splits priced lines into the two invoice sections and carries the order's totals.
fn invoice_document(company: &Company, order: &Order, lines: Vec<HistoryLine>) -> InvoiceDocument {
    let (products, gift_boxes): (Vec<_>, Vec<_>) = lines.into_iter().partition(|l| l.kind == "product");
    let to_invoice = |l: HistoryLine| InvoiceLine {
        name: l.name,
        quantity: l.quantity,
        unit_price: l.unit_price,
        line_total: l.line_total,
    };

    InvoiceDocument {
        order_id: order.id,
        created_at: order.created_at,
        company: company.clone(),
        customer: order.customer_info.0.clone(),
        products: products.into_iter().map(to_invoice).collect(),
        gift_boxes: gift_boxes.into_iter().map(to_invoice).collect(),
        discount_pct: order.discount,
        total: order.total,
        discount_amount: order.total * order.discount / Decimal::ONE_HUNDRED,
        gst: order.gst(),
        grand_total: order.grand_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::document_service::tests::sample_company;
    use chrono::Utc;
    use sqlx::types::Json;

    fn order() -> Order {
        Order {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            customer_id: Some(Uuid::new_v4()),
            customer_info: Json(CustomerInfo { name: "Asha".into(), phone: None, address: None }),
            gst_status: false,
            gst_percentage: Decimal::ZERO,
            gst_amount: Decimal::ZERO,
            discount: Decimal::from(10),
            total: Decimal::from(100),
            grand_total: Decimal::from(90),
            invoice_pdf: None,
            invoice_status: InvoiceStatus::Pending,
            invoice_attempts: 0,
            invoice_error: None,
            created_at: Utc::now(),
        }
    }

    fn line(order_id: Uuid, name: &str, kind: &str, quantity: i32, price: i64) -> HistoryLine {
        HistoryLine {
            order_id,
            item_id: Uuid::new_v4(),
            name: name.into(),
            kind: kind.into(),
            quantity,
            unit_price: Decimal::from(price),
            line_total: Decimal::from(price * quantity as i64),
        }
    }

    #[test]
    fn invoice_document_splits_sections_and_derives_discount() {
        let order = order();
        let lines = vec![
            line(order.id, "Sparkler", "product", 2, 50),
            line(order.id, "Family Pack", "giftbox", 1, 450),
            line(order.id, "Flower Pot", "product", 1, 30),
        ];
        let doc = invoice_document(&sample_company(), &order, lines);

        let products: Vec<_> = doc.products.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(products, ["Sparkler", "Flower Pot"]);
        assert_eq!(doc.gift_boxes.len(), 1);
        assert_eq!(doc.discount_amount, Decimal::from(10));
        assert_eq!(doc.customer.name, "Asha");
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(ensure_quantity(0).is_err());
        assert!(ensure_quantity(1).is_ok());
    }

    #[test]
    fn lost_stock_race_reports_insufficient_stock() {
        let err = stock_conflict("Product", Some(("Sparkler".into(), 1)), 2);
        assert!(err.to_string().contains("Insufficient stock"));
    }

    #[test]
    fn stages_advance_through_the_happy_path() {
        let mut stage = PlacementStage::Validated;
        for next in [
            PlacementStage::StockReserved,
            PlacementStage::OrderPersisted,
            PlacementStage::InvoiceRequested,
            PlacementStage::InvoiceReady,
        ] {
            advance(&mut stage, next);
        }
        assert_eq!(stage, PlacementStage::InvoiceReady);
    }
}
