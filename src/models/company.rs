// src/models/company.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// A tenant. `status = false` blocks every tenant-scoped operation of its sub-admin.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    #[schema(example = "Sivakasi Crackers")]
    pub name: String,
    pub tagline: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub branch: Option<String>,
    #[schema(example = "sivakasi@upi")]
    pub upi_id: Option<String>,
    #[schema(example = "33ABCDE1234F1Z5")]
    pub gst_number: Option<String>,
    pub admin_id: Uuid,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyPayload {
    #[validate(length(min = 1, message = "Company name cannot be empty."))]
    pub name: Option<String>,
    pub tagline: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "The e-mail is invalid."))]
    pub email: Option<String>,
    pub bank_name: Option<String>,
    pub account_holder: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub branch: Option<String>,
    pub upi_id: Option<String>,
    pub gst_number: Option<String>,
}

/// Company row joined with its admin, for the super-admin listing.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    pub id: Uuid,
    pub name: String,
    pub status: bool,
    pub admin_id: Uuid,
    pub admin_name: String,
    pub admin_email: String,
    pub created_at: DateTime<Utc>,
}
