// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

/// Durable invoice state of an order row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Ready,
    Failed,
}

/// In-flight stages of a placement. Only forward moves are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStage {
    Validated,
    StockReserved,
    OrderPersisted,
    InvoiceRequested,
    InvoiceReady,
    InvoiceFailed,
}

impl PlacementStage {
    pub fn can_advance_to(self, next: PlacementStage) -> bool {
        use PlacementStage::*;
        matches!(
            (self, next),
            (Validated, StockReserved)
                | (StockReserved, OrderPersisted)
                | (OrderPersisted, InvoiceRequested)
                | (InvoiceRequested, InvoiceReady)
                | (InvoiceRequested, InvoiceFailed)
                // reconciliation re-enters the invoice phase
                | (InvoiceFailed, InvoiceRequested)
        )
    }
}

// --- Request payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GstInput {
    pub status: bool,
    #[serde(default)]
    pub percentage: Option<Decimal>,
    // Numbers and numeric strings are both accepted.
    #[serde(default)]
    #[schema(value_type = Option<f64>, example = 18.0)]
    pub amount: Option<Value>,
}

/// Normalized GST block stored on an order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Gst {
    pub status: bool,
    pub percentage: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductLineInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GiftBoxLineInput {
    #[serde(alias = "giftboxId")]
    pub gift_box_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderPayload {
    /// Client cart key; the matching draft is removed once the order is finalized.
    #[serde(alias = "id")]
    pub cart_id: Option<String>,

    #[validate(required(message = "customerId is required."))]
    pub customer_id: Option<Uuid>,

    #[validate(
        required(message = "products is required."),
        length(min = 1, message = "At least one product is required.")
    )]
    pub products: Option<Vec<ProductLineInput>>,

    #[serde(default, alias = "giftboxes")]
    pub gift_boxes: Vec<GiftBoxLineInput>,

    #[validate(
        required(message = "discount is required."),
        custom(function = "crate::models::catalog::percentage")
    )]
    #[schema(example = 10.0)]
    pub discount: Option<Decimal>,

    #[validate(required(message = "total is required."))]
    #[schema(example = 100.0)]
    pub total: Option<Decimal>,

    #[validate(required(message = "grandTotal is required."))]
    #[serde(alias = "grandtotal")]
    #[schema(example = 90.0)]
    pub grand_total: Option<Decimal>,

    #[validate(required(message = "gst is required."))]
    pub gst: Option<GstInput>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MonthlyOrdersPayload {
    #[validate(range(min = 1, max = 12, message = "month must be between 1 and 12."))]
    pub month: u32,
    #[validate(range(min = 2000, max = 2100, message = "year is out of range."))]
    pub year: i32,
}

// --- Rows ---

/// Snapshot of the customer block printed on the invoice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub customer_id: Option<Uuid>,
    #[schema(value_type = CustomerInfo)]
    pub customer_info: Json<CustomerInfo>,
    pub gst_status: bool,
    pub gst_percentage: Decimal,
    pub gst_amount: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub grand_total: Decimal,
    pub invoice_pdf: Option<String>,
    pub invoice_status: InvoiceStatus,
    pub invoice_attempts: i32,
    #[serde(skip_serializing)]
    pub invoice_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn gst(&self) -> Gst {
        Gst {
            status: self.gst_status,
            percentage: self.gst_percentage,
            amount: self.gst_amount,
        }
    }
}

/// Values written to the `orders` row at placement time.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub company_id: Uuid,
    pub customer_id: Uuid,
    pub customer_info: CustomerInfo,
    pub gst: Gst,
    pub discount: Decimal,
    pub total: Decimal,
    pub grand_total: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub cart_items: Vec<OrderLine>,
    pub gift_boxes: Vec<OrderLine>,
}

/// Order listing row with the customer's display name.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub total: Decimal,
    pub grand_total: Decimal,
    pub gst_status: bool,
    pub invoice_pdf: Option<String>,
    pub invoice_status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: Uuid,
    pub invoice_url: String,
    pub grand_total: Decimal,
}

/// Legacy dashboard numbers.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub total_customers: i64,
    pub total_products: i64,
    pub total_gift_boxes: i64,
    pub orders_today: i64,
    pub revenue_today: Decimal,
    pub pending_invoices: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_only_moves_forward() {
        use PlacementStage::*;
        assert!(Validated.can_advance_to(StockReserved));
        assert!(InvoiceRequested.can_advance_to(InvoiceFailed));
        assert!(InvoiceFailed.can_advance_to(InvoiceRequested));
        assert!(!StockReserved.can_advance_to(InvoiceReady));
        assert!(!InvoiceReady.can_advance_to(InvoiceRequested));
    }

    #[test]
    fn place_order_payload_accepts_legacy_keys() {
        let payload: PlaceOrderPayload = serde_json::from_value(serde_json::json!({
            "customerId": "0b0d1f43-8a4f-4a62-a0a7-4d4ffb0b2c55",
            "products": [{ "productId": "4f1c1f0e-3c71-4e7c-9a53-63c1f8d9a1aa", "quantity": 2 }],
            "giftboxes": [{ "giftboxId": "8d9a7a1e-6f65-4a0e-b5b4-3f0d8a7d2f11", "quantity": 1 }],
            "discount": 10,
            "total": 100,
            "grandtotal": 90,
            "gst": { "status": false }
        }))
        .unwrap();
        assert_eq!(payload.gift_boxes.len(), 1);
        assert_eq!(payload.grand_total, Some(Decimal::from(90)));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn place_order_payload_requires_products() {
        let payload: PlaceOrderPayload = serde_json::from_value(serde_json::json!({
            "customerId": "0b0d1f43-8a4f-4a62-a0a7-4d4ffb0b2c55",
            "products": [],
            "discount": 0,
            "total": 0,
            "grandTotal": 0,
            "gst": { "status": false }
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("products"));
    }

    #[test]
    fn discount_outside_zero_to_hundred_is_rejected() {
        for discount in [serde_json::json!(-50), serde_json::json!(150), serde_json::json!(1e27)] {
            let payload: PlaceOrderPayload = serde_json::from_value(serde_json::json!({
                "customerId": "0b0d1f43-8a4f-4a62-a0a7-4d4ffb0b2c55",
                "products": [{ "productId": "4f1c1f0e-3c71-4e7c-9a53-63c1f8d9a1aa", "quantity": 2 }],
                "discount": discount,
                "total": 100,
                "grandTotal": 90,
                "gst": { "status": false }
            }))
            .unwrap();
            let errors = payload.validate().unwrap_err();
            assert!(errors.field_errors().contains_key("discount"));
        }
    }

    #[test]
    fn legacy_cart_key_is_accepted() {
        let payload: PlaceOrderPayload = serde_json::from_value(serde_json::json!({
            "id": "tab-1",
            "customerId": "0b0d1f43-8a4f-4a62-a0a7-4d4ffb0b2c55",
            "products": [{ "productId": "4f1c1f0e-3c71-4e7c-9a53-63c1f8d9a1aa", "quantity": 1 }],
            "discount": 0,
            "total": 50,
            "grandTotal": 50,
            "gst": { "status": false }
        }))
        .unwrap();
        assert_eq!(payload.cart_id.as_deref(), Some("tab-1"));
    }
}
