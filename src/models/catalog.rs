// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- Product ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Sparkler")]
    pub name: String,
    #[schema(example = 50.0)]
    pub price: Decimal,
    #[schema(example = 10)]
    pub stock_available: i32,
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub status: bool,
    #[schema(example = "🎇")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Gift box ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiftBox {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Diwali Family Pack")]
    pub name: String,
    #[schema(example = 10.0)]
    pub discount: Decimal,
    pub total: Decimal,
    // Sale price; not required to equal the sum of its parts.
    pub grand_total: Decimal,
    pub stock_available: i32,
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiftBoxItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiftBoxDetail {
    #[serde(flatten)]
    pub gift_box: GiftBox,
    pub products: Vec<GiftBoxItem>,
}

/// A `{productId, quantity}` pair as sent by clients for gift-box contents.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiftBoxComponent {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1."))]
    pub quantity: i32,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, max = 200, message = "Product name is required."))]
    #[schema(example = "Sparkler")]
    pub name: String,
    #[validate(custom(function = "non_negative"))]
    #[schema(example = 50.0)]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    #[serde(default)]
    pub stock_available: i32,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, max = 200, message = "Product name cannot be empty."))]
    pub name: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    pub stock_available: Option<i32>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGiftBoxPayload {
    #[validate(length(min = 1, max = 200, message = "Gift box name is required."))]
    pub name: String,
    #[validate(length(min = 1, message = "A gift box needs at least one product."), nested)]
    pub products: Vec<GiftBoxComponent>,
    #[serde(default)]
    #[validate(custom(function = "percentage"))]
    pub discount: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(alias = "grandtotal")]
    #[validate(custom(function = "non_negative"))]
    pub grand_total: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    #[serde(default)]
    pub stock_available: i32,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGiftBoxPayload {
    #[validate(length(min = 1, max = 200, message = "Gift box name cannot be empty."))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "A gift box needs at least one product."), nested)]
    pub products: Option<Vec<GiftBoxComponent>>,
    #[validate(custom(function = "percentage"))]
    pub discount: Option<Decimal>,
    pub total: Option<Decimal>,
    #[serde(alias = "grandtotal")]
    #[validate(custom(function = "non_negative"))]
    pub grand_total: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    pub stock_available: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockQuery {
    /// Products with at most this many units are listed. Defaults to 10.
    pub threshold: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CatalogListQuery {
    /// Include soft-deleted rows.
    #[serde(default)]
    pub include_inactive: bool,
}

fn non_negative(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = validator::ValidationError::new("non_negative");
        err.message = Some("Value cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn percentage(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = validator::ValidationError::new("percentage");
        err.message = Some("Discount must be between 0 and 100.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn negative_price_is_rejected() {
        let payload: CreateProductPayload =
            serde_json::from_value(json!({ "name": "Sparkler", "price": -1, "stockAvailable": 3 }))
                .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn gift_box_component_quantity_must_be_positive() {
        let payload: CreateGiftBoxPayload = serde_json::from_value(json!({
            "name": "Family Pack",
            "products": [{ "productId": "4f1c1f0e-3c71-4e7c-9a53-63c1f8d9a1aa", "quantity": 0 }],
            "grandtotal": 450
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn discount_over_a_hundred_percent_is_rejected() {
        let payload: UpdateGiftBoxPayload =
            serde_json::from_value(json!({ "discount": 120 })).unwrap();
        assert!(payload.validate().is_err());
    }
}
