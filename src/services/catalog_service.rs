// src/services/catalog_service.rs

use std::collections::HashSet;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{GiftBoxRepository, ProductRepository},
    models::catalog::{
        CreateGiftBoxPayload, CreateProductPayload, GiftBox, GiftBoxComponent, GiftBoxDetail, Product,
        UpdateGiftBoxPayload, UpdateProductPayload,
    },
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Clone)]
pub struct CatalogService {
    product_repo: ProductRepository,
    giftbox_repo: GiftBoxRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(product_repo: ProductRepository, giftbox_repo: GiftBoxRepository, pool: PgPool) -> Self {
        Self { product_repo, giftbox_repo, pool }
    }

    // ---
    // Products
    // ---

    pub async fn list_products(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<Product>, AppError> {
        self.product_repo.list(company_id, include_inactive).await
    }

    pub async fn get_product(&self, company_id: Uuid, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find(&self.pool, company_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".into()))
    }

    pub async fn create_product(&self, company_id: Uuid, payload: &CreateProductPayload) -> Result<Product, AppError> {
        let product = self
            .product_repo
            .create(
                company_id,
                payload.name.trim(),
                payload.price,
                payload.stock_available,
                payload.image.as_deref(),
            )
            .await?;
        tracing::info!(%company_id, product_id = %product.id, "Product created");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateProductPayload,
    ) -> Result<Product, AppError> {
        self.product_repo
            .update(
                company_id,
                id,
                payload.name.as_deref().map(str::trim),
                payload.price,
                payload.stock_available,
                payload.image.as_deref(),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Product".into()))
    }

    pub async fn delete_product(&self, company_id: Uuid, id: Uuid) -> Result<Product, AppError> {
        if let Some(product) = self.product_repo.soft_delete(company_id, id).await? {
            tracing::info!(%company_id, product_id = %id, "Product deactivated");
            return Ok(product);
        }
        match self.product_repo.find(&self.pool, company_id, id).await? {
            Some(_) => Err(AppError::AlreadyInactive("Product".into())),
            None => Err(AppError::NotFound("Product".into())),
        }
    }

    pub async fn low_stock(&self, company_id: Uuid, threshold: Option<i32>) -> Result<Vec<Product>, AppError> {
        let threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD).max(0);
        self.product_repo.low_stock(company_id, threshold).await
    }

    // ---
    // Gift boxes
    // ---

    pub async fn list_gift_boxes(&self, company_id: Uuid, include_inactive: bool) -> Result<Vec<GiftBoxDetail>, AppError> {
        let boxes = self.giftbox_repo.list(company_id, include_inactive).await?;
        let mut details = Vec::with_capacity(boxes.len());
        for gift_box in boxes {
            let products = self.giftbox_repo.items(&self.pool, gift_box.id).await?;
            details.push(GiftBoxDetail { gift_box, products });
        }
        Ok(details)
    }

    pub async fn get_gift_box(&self, company_id: Uuid, id: Uuid) -> Result<GiftBoxDetail, AppError> {
        let gift_box = self
            .giftbox_repo
            .find(&self.pool, company_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Gift box".into()))?;
        let products = self.giftbox_repo.items(&self.pool, gift_box.id).await?;
        Ok(GiftBoxDetail { gift_box, products })
    }

    pub async fn create_gift_box(
        &self,
        company_id: Uuid,
        payload: &CreateGiftBoxPayload,
    ) -> Result<GiftBoxDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        self.ensure_products_owned(&mut tx, company_id, &payload.products).await?;

        let gift_box = self
            .giftbox_repo
            .create(
                &mut *tx,
                company_id,
                payload.name.trim(),
                payload.discount,
                payload.total,
                payload.grand_total,
                payload.stock_available,
            )
            .await?;
        self.giftbox_repo.insert_items(&mut *tx, gift_box.id, &payload.products).await?;
        let products = self.giftbox_repo.items(&mut *tx, gift_box.id).await?;
        tx.commit().await?;

        tracing::info!(%company_id, gift_box_id = %gift_box.id, "Gift box created");
        Ok(GiftBoxDetail { gift_box, products })
    }

    pub async fn update_gift_box(
        &self,
        company_id: Uuid,
        id: Uuid,
        payload: &UpdateGiftBoxPayload,
    ) -> Result<GiftBoxDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let gift_box: GiftBox = self
            .giftbox_repo
            .update(
                &mut *tx,
                company_id,
                id,
                payload.name.as_deref().map(str::trim),
                payload.discount,
                payload.total,
                payload.grand_total,
                payload.stock_available,
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Gift box".into()))?;

        if let Some(components) = &payload.products {
            self.ensure_products_owned(&mut tx, company_id, components).await?;
            self.giftbox_repo.clear_items(&mut *tx, id).await?;
            self.giftbox_repo.insert_items(&mut *tx, id, components).await?;
        }
        let products = self.giftbox_repo.items(&mut *tx, id).await?;
        tx.commit().await?;

        Ok(GiftBoxDetail { gift_box, products })
    }

    pub async fn delete_gift_box(&self, company_id: Uuid, id: Uuid) -> Result<GiftBox, AppError> {
        if let Some(gift_box) = self.giftbox_repo.soft_delete(company_id, id).await? {
            tracing::info!(%company_id, gift_box_id = %id, "Gift box deactivated");
            return Ok(gift_box);
        }
        match self.giftbox_repo.find(&self.pool, company_id, id).await? {
            Some(_) => Err(AppError::AlreadyInactive("Gift box".into())),
            None => Err(AppError::NotFound("Gift box".into())),
        }
    }

    /// Every referenced product must be an active product of the same company.
    async fn ensure_products_owned(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        company_id: Uuid,
        components: &[GiftBoxComponent],
    ) -> Result<(), AppError> {
        let ids: Vec<Uuid> = components
            .iter()
            .map(|c| c.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owned = self.giftbox_repo.count_owned_products(&mut **tx, company_id, &ids).await?;
        if owned != ids.len() as i64 {
            return Err(AppError::BadRequest(
                "Gift box references a product that does not exist in this company.".into(),
            ));
        }
        Ok(())
    }
}
