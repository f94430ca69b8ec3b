// src/services/cart_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CartRepository,
    models::cart::{PendingCartResponse, SaveCartOutcome, SaveCartPayload, SaveCartResponse},
};

// Draft carts are a save-point for the billing screen; stock is only checked at checkout.
#[derive(Clone)]
pub struct CartService {
    cart_repo: CartRepository,
}

impl CartService {
    pub fn new(cart_repo: CartRepository) -> Self {
        Self { cart_repo }
    }

    /// Upserts the draft; an empty payload clears it instead.
    pub async fn save_cart(&self, company_id: Uuid, payload: &SaveCartPayload) -> Result<SaveCartResponse, AppError> {
        if payload.is_empty() {
            let existed = self.cart_repo.clear(company_id, &payload.id).await?;
            let outcome = if existed { SaveCartOutcome::Cleared } else { SaveCartOutcome::AlreadyEmpty };
            return Ok(SaveCartResponse {
                outcome,
                message: outcome_message(outcome).to_string(),
                cart: None,
            });
        }

        let cart = self.cart_repo.upsert(company_id, payload).await?;
        tracing::debug!(%company_id, cart_id = %cart.id, "Cart saved");
        Ok(SaveCartResponse {
            outcome: SaveCartOutcome::Saved,
            message: outcome_message(SaveCartOutcome::Saved).to_string(),
            cart: Some(cart),
        })
    }

    /// Never creates a draft.
    pub async fn get_pending_cart(&self, company_id: Uuid, client_id: &str) -> Result<PendingCartResponse, AppError> {
        let cart = self.cart_repo.find(company_id, client_id).await?;
        Ok(PendingCartResponse { pending: cart.is_some(), cart })
    }
}

fn outcome_message(outcome: SaveCartOutcome) -> &'static str {
    match outcome {
        SaveCartOutcome::Saved => "Cart saved",
        SaveCartOutcome::Cleared => "Cart cleared",
        SaveCartOutcome::AlreadyEmpty => "Cart is already empty",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outcomes_read_as_no_ops() {
        assert_eq!(outcome_message(SaveCartOutcome::AlreadyEmpty), "Cart is already empty");
        assert_ne!(
            outcome_message(SaveCartOutcome::Cleared),
            outcome_message(SaveCartOutcome::Saved)
        );
    }
}
