// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AnalyticsRepository, CartRepository, CompanyRepository, CustomerRepository,
        GiftBoxRepository, OrderRepository, ProductRepository, UserRepository,
    },
    services::{
        analytics_service::AnalyticsService,
        auth::AuthService,
        cart_service::CartService,
        catalog_service::CatalogService,
        company_service::CompanyService,
        customer_service::CustomerService,
        document_service::{GenPdfInvoiceRenderer, InvoiceRenderer},
        order_service::OrderService,
        storage_service::{DocumentStorage, LocalDocumentStorage},
    },
};

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub max_db_connections: u32,
    pub token_ttl_hours: i64,
    pub public_base_url: String,
    pub storage_dir: PathBuf,
    pub invoice_tmp_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub invoice_retry_delay: Duration,
    pub invoice_render_timeout: Duration,
    pub reconcile_interval: Duration,
    pub reconcile_max_attempts: i32,
    pub analytics_timezone: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            max_db_connections: env_or("DATABASE_MAX_CONNECTIONS", 5)?,
            token_ttl_hours: env_or("TOKEN_TTL_HOURS", 24)?,
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000".to_string())?,
            storage_dir: env_or("STORAGE_DIR", PathBuf::from("./storage"))?,
            invoice_tmp_dir: env_or("INVOICE_TMP_DIR", env::temp_dir())?,
            fonts_dir: env_or("FONTS_DIR", PathBuf::from("./fonts"))?,
            font_family: env_or("FONT_FAMILY", "Roboto".to_string())?,
            invoice_retry_delay: Duration::from_millis(env_or("INVOICE_RETRY_DELAY_MS", 2000)?),
            invoice_render_timeout: Duration::from_secs(env_or("INVOICE_RENDER_TIMEOUT_SECS", 30)?),
            reconcile_interval: Duration::from_secs(env_or("INVOICE_RECONCILE_INTERVAL_SECS", 300)?),
            reconcile_max_attempts: env_or("INVOICE_RECONCILE_MAX_ATTEMPTS", 5)?,
            analytics_timezone: env_or("ANALYTICS_TIMEZONE", "Asia/Kolkata".to_string())?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub company_service: CompanyService,
    pub catalog_service: CatalogService,
    pub customer_service: CustomerService,
    pub cart_service: CartService,
    pub order_service: OrderService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_db_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Database connection established");

        let renderer: Arc<dyn InvoiceRenderer> = Arc::new(GenPdfInvoiceRenderer::new(
            config.fonts_dir.clone(),
            config.font_family.clone(),
            config.invoice_tmp_dir.clone(),
            config.invoice_render_timeout,
        ));
        let storage: Arc<dyn DocumentStorage> = Arc::new(LocalDocumentStorage::new(
            config.storage_dir.clone(),
            config.public_base_url.clone(),
        ));

        Ok(Self::from_parts(db_pool, config, renderer, storage))
    }

    /// Wires repositories and services around an existing pool.
    pub fn from_parts(
        db_pool: PgPool,
        config: Config,
        renderer: Arc<dyn InvoiceRenderer>,
        storage: Arc<dyn DocumentStorage>,
    ) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let company_repo = CompanyRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let giftbox_repo = GiftBoxRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let cart_repo = CartRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let analytics_repo = AnalyticsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            company_repo.clone(),
            config.jwt_secret.clone(),
            config.token_ttl_hours,
            db_pool.clone(),
        );
        let company_service = CompanyService::new(company_repo.clone(), user_repo);
        let catalog_service =
            CatalogService::new(product_repo.clone(), giftbox_repo.clone(), db_pool.clone());
        let customer_service = CustomerService::new(customer_repo.clone());
        let cart_service = CartService::new(cart_repo.clone());
        let order_service = OrderService::new(
            db_pool.clone(),
            order_repo.clone(),
            product_repo,
            giftbox_repo,
            customer_repo,
            company_repo,
            cart_repo,
            renderer,
            storage,
            config.invoice_retry_delay,
        );
        let analytics_service = AnalyticsService::new(
            analytics_repo,
            order_repo,
            config.analytics_timezone.clone(),
        );

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            company_service,
            catalog_service,
            customer_service,
            cart_service,
            order_service,
            analytics_service,
        }
    }
}
