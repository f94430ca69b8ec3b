// src/services/company_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CompanyRepository, UserRepository},
    models::{
        auth::User,
        company::{Company, CompanyOverview, UpdateCompanyPayload},
    },
};

// Tenant profile management and the super-admin's user/company administration.
#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    user_repo: UserRepository,
}

impl CompanyService {
    pub fn new(company_repo: CompanyRepository, user_repo: UserRepository) -> Self {
        Self { company_repo, user_repo }
    }

    pub async fn get_company(&self, company_id: Uuid) -> Result<Company, AppError> {
        self.company_repo
            .find_by_id(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company".into()))
    }

    pub async fn update_company(
        &self,
        company_id: Uuid,
        payload: &UpdateCompanyPayload,
    ) -> Result<Company, AppError> {
        let company = self.company_repo.update_company(company_id, payload).await?;
        tracing::info!(%company_id, "Company profile updated");
        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<CompanyOverview>, AppError> {
        self.company_repo.list_overview().await
    }

    pub async fn set_company_status(&self, company_id: Uuid, status: bool) -> Result<Company, AppError> {
        let company = self
            .company_repo
            .set_status(company_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Company".into()))?;
        tracing::info!(%company_id, status, "Company status changed");
        Ok(company)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list_users().await
    }

    pub async fn set_user_status(&self, user_id: Uuid, status: bool) -> Result<User, AppError> {
        let user = self
            .user_repo
            .set_status(user_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Sub-admin".into()))?;
        tracing::info!(%user_id, status, "User status changed");
        Ok(user)
    }
}
