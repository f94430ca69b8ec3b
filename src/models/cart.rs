// src/models/cart.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::order::{GiftBoxLineInput, GstInput, ProductLineInput};

// A staged draft. It is a save-point only: stock is not checked until checkout.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[sqlx(rename = "client_id")]
    pub id: String,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(value_type = Vec<ProductLineInput>)]
    pub products: Json<Vec<ProductLineInput>>,
    #[schema(value_type = Vec<GiftBoxLineInput>)]
    pub gift_boxes: Json<Vec<GiftBoxLineInput>>,
    pub discount: Decimal,
    pub total: Decimal,
    #[schema(value_type = GstInput)]
    pub gst: Json<GstInput>,
    pub grand_total: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCartPayload {
    #[validate(length(min = 1, max = 128, message = "Cart id is required."))]
    pub id: String,
    #[serde(default)]
    pub products: Vec<ProductLineInput>,
    #[serde(default, alias = "giftboxes")]
    pub gift_boxes: Vec<GiftBoxLineInput>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default = "gst_disabled")]
    pub gst: GstInput,
    #[serde(default, alias = "grandtotal")]
    pub grand_total: Decimal,
}

impl SaveCartPayload {
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.gift_boxes.is_empty()
    }
}

fn gst_disabled() -> GstInput {
    GstInput {
        status: false,
        percentage: None,
        amount: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SaveCartOutcome {
    Saved,
    Cleared,
    AlreadyEmpty,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveCartResponse {
    pub outcome: SaveCartOutcome,
    pub message: String,
    pub cart: Option<Cart>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingCartResponse {
    pub pending: bool,
    pub cart: Option<Cart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_without_lines_is_empty() {
        let payload: SaveCartPayload =
            serde_json::from_value(serde_json::json!({ "id": "tab-1" })).unwrap();
        assert!(payload.is_empty());
        assert!(!payload.gst.status);
    }

    #[test]
    fn payload_with_only_gift_boxes_is_not_empty() {
        let payload: SaveCartPayload = serde_json::from_value(serde_json::json!({
            "id": "tab-1",
            "giftboxes": [{ "giftBoxId": "8d9a7a1e-6f65-4a0e-b5b4-3f0d8a7d2f11", "quantity": 2 }]
        }))
        .unwrap();
        assert!(!payload.is_empty());
    }
}
