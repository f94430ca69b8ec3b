// src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

#[cfg(test)]
mod tests;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, tenancy::tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let reconcile_interval = config.reconcile_interval;
    let reconcile_max_attempts = config.reconcile_max_attempts;

    let app_state = AppState::new(config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Database migrations applied");

    app_state
        .order_service
        .spawn_invoice_reconciler(reconcile_interval, reconcile_max_attempts);

    let app = build_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(app_state: AppState) -> Router {
    let storage_dir = app_state.config.storage_dir.clone();

    let auth_routes = Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login));

    // Signed-in routes that do not act on a tenant.
    let account_routes = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users/me", get(handlers::users::get_me))
        .route("/users/{id}/status", put(handlers::users::set_user_status))
        .route("/company/all", get(handlers::company::list_companies))
        .route("/company/{id}/status", put(handlers::company::set_company_status))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let tenant_routes = Router::new()
        .route(
            "/company",
            get(handlers::company::get_company).put(handlers::company::update_company),
        )
        // Product
        .route(
            "/product",
            get(handlers::product::list_products).post(handlers::product::create_product),
        )
        .route("/product/low-stock", get(handlers::product::low_stock))
        .route(
            "/product/{id}",
            get(handlers::product::get_product)
                .put(handlers::product::update_product)
                .delete(handlers::product::delete_product),
        )
        // Gift box
        .route(
            "/giftbox",
            get(handlers::giftbox::list_gift_boxes).post(handlers::giftbox::create_gift_box),
        )
        .route(
            "/giftbox/{id}",
            get(handlers::giftbox::get_gift_box)
                .put(handlers::giftbox::update_gift_box)
                .delete(handlers::giftbox::delete_gift_box),
        )
        // Customer
        .route(
            "/customer",
            get(handlers::customer::list_customers).post(handlers::customer::create_customer),
        )
        .route(
            "/customer/{id}",
            get(handlers::customer::get_customer)
                .put(handlers::customer::update_customer)
                .delete(handlers::customer::delete_customer),
        )
        .route("/customer/{id}/history", get(handlers::customer::customer_history))
        // Cart
        .route("/cart/save", post(handlers::cart::save_cart))
        .route("/cart/pending/{id}", get(handlers::cart::get_pending_cart))
        // Order
        .route("/order/place-order", post(handlers::order::place_order))
        .route("/order/all", get(handlers::order::list_orders))
        .route("/order/stats", get(handlers::order::order_stats))
        .route("/order/monthly-orders", post(handlers::order::monthly_orders))
        .route("/order/{id}", get(handlers::order::get_order))
        .route("/order/{id}/invoice", post(handlers::order::regenerate_invoice))
        // Analytics
        .route("/analytics/advanced", get(handlers::analytics::advanced))
        .route("/analytics/export", get(handlers::analytics::export))
        .route("/analytics/realtime", get(handlers::analytics::realtime))
        // tenant_guard reads the user attached by auth_guard, so auth runs first
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(auth_routes)
        .merge(account_routes)
        .merge(tenant_routes)
        .nest_service("/files", ServeDir::new(storage_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
