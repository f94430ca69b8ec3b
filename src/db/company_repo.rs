// src/db/company_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::SignupCompanyPayload,
        company::{Company, CompanyOverview, UpdateCompanyPayload},
    },
};

#[derive(Clone)]
pub struct CompanyRepository {
    pool: PgPool,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(company)
    }

    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        admin_id: Uuid,
        input: &SignupCompanyPayload,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (id, name, tagline, address, phone, gst_number, admin_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name.trim())
        .bind(input.tagline.as_deref())
        .bind(input.address.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.gst_number.as_deref())
        .bind(admin_id)
        .fetch_one(executor)
        .await?;
        Ok(company)
    }

    /// Partial update: absent fields keep their stored value.
    pub async fn update_company(
        &self,
        id: Uuid,
        input: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        let company = sqlx::query_as::<_, Company>(
            r#"
            UPDATE companies SET
                name = COALESCE($2, name),
                tagline = COALESCE($3, tagline),
                address = COALESCE($4, address),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                bank_name = COALESCE($7, bank_name),
                account_holder = COALESCE($8, account_holder),
                account_number = COALESCE($9, account_number),
                ifsc_code = COALESCE($10, ifsc_code),
                branch = COALESCE($11, branch),
                upi_id = COALESCE($12, upi_id),
                gst_number = COALESCE($13, gst_number),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.tagline.as_deref())
        .bind(input.address.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.email.as_deref())
        .bind(input.bank_name.as_deref())
        .bind(input.account_holder.as_deref())
        .bind(input.account_number.as_deref())
        .bind(input.ifsc_code.as_deref())
        .bind(input.branch.as_deref())
        .bind(input.upi_id.as_deref())
        .bind(input.gst_number.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn set_status(&self, id: Uuid, status: bool) -> Result<Option<Company>, AppError> {
        let company = sqlx::query_as::<_, Company>(
            "UPDATE companies SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(company)
    }

    pub async fn list_overview(&self) -> Result<Vec<CompanyOverview>, AppError> {
        let rows = sqlx::query_as::<_, CompanyOverview>(
            r#"
            SELECT c.id, c.name, c.status, c.admin_id,
                   u.name AS admin_name, u.email AS admin_email, c.created_at
            FROM companies c
            JOIN users u ON u.id = c.admin_id
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
