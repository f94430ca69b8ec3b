// src/services/customer_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{
        CreateCustomerPayload, Customer, CustomerHistory, HistoryLine, HistoryOrder, UpdateCustomerPayload,
    },
};

#[derive(Clone)]
pub struct CustomerService {
    customer_repo: CustomerRepository,
}

impl CustomerService {
    pub fn new(customer_repo: CustomerRepository) -> Self {
        Self { customer_repo }
    }

    pub async fn list_customers(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<Customer>, AppError> {
        self.customer_repo.list(company_id, include_inactive).await
    }

    pub async fn get_customer(&self, company_id: Uuid, id: Uuid) -> Result<Customer, AppError> {
        self.customer_repo
            .get(company_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".into()))
    }

    pub async fn create_customer(&self, company_id: Uuid, payload: &CreateCustomerPayload) -> Result<Customer, AppError> {
        let customer = self.customer_repo.create(company_id, payload).await?;
        tracing::info!(%company_id, customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    pub async fn update_customer(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateCustomerPayload,
    ) -> Result<Customer, AppError> {
        self.customer_repo
            .update(company_id, id, payload)
            .await?
            .ok_or_else(|| AppError::NotFound("Customer".into()))
    }

    pub async fn delete_customer(&self, company_id: Uuid, id: Uuid) -> Result<Customer, AppError> {
        if let Some(customer) = self.customer_repo.soft_delete(company_id, id).await? {
            return Ok(customer);
        }
        match self.customer_repo.get(company_id, id).await? {
            Some(_) => Err(AppError::AlreadyInactive("Customer".into())),
            None => Err(AppError::NotFound("Customer".into())),
        }
    }

    /// Past orders, newest first, with lines priced from the current catalog.
    pub async fn history(&self, company_id: Uuid, id: Uuid) -> Result<CustomerHistory, AppError> {
        let customer = self.get_customer(company_id, id).await?;
        let headers = self.customer_repo.order_headers(company_id, id).await?;
        let lines = self.customer_repo.history_lines(company_id, id).await?;

        let orders = headers
            .into_iter()
            .map(|(order_id, created_at, grand_total, invoice_pdf)| HistoryOrder {
                order_id,
                created_at,
                grand_total,
                invoice_pdf,
                lines: lines_of(&lines, order_id),
            })
            .collect();

        Ok(CustomerHistory { customer, orders })
    }
}

fn lines_of(lines: &[HistoryLine], order_id: Uuid) -> Vec<HistoryLine> {
    lines.iter().filter(|l| l.order_id == order_id).cloned().collect()
}
