// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Asha")]
    pub name: String,
    #[schema(example = "9999999999")]
    pub phone: Option<String>,
    pub address: Option<String>,
    #[schema(example = "Sivakasi")]
    pub city: Option<String>,
    #[schema(example = "Tamil Nadu")]
    pub state: Option<String>,
    pub status: bool,
    // Ids of the orders placed by this customer, oldest first.
    pub orders: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a past order, priced from the current catalog.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLine {
    pub order_id: Uuid,
    pub item_id: Uuid,
    pub name: String,
    pub kind: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOrder {
    pub order_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub grand_total: Decimal,
    pub invoice_pdf: Option<String>,
    pub lines: Vec<HistoryLine>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerHistory {
    pub customer: Customer,
    pub orders: Vec<HistoryOrder>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, max = 200, message = "Customer name is required."))]
    pub name: String,
    #[validate(length(max = 32, message = "Phone number is too long."))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, max = 200, message = "Customer name cannot be empty."))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "Phone number is too long."))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}
