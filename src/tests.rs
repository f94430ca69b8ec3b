// src/tests.rs
//
// Router tests run without a database (lazy pool). Workflow tests need a
// Postgres reachable through DATABASE_URL: `cargo test -- --ignored`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    build_router,
    common::error::AppError,
    config::{AppState, Config},
    models::{
        analytics::AnalyticsQuery,
        auth::{AuthResponse, Role, SignupCompanyPayload, SignupPayload},
        cart::{SaveCartOutcome, SaveCartPayload},
        catalog::{CreateGiftBoxPayload, CreateProductPayload, GiftBoxComponent, GiftBoxDetail, Product},
        company::Company,
        customer::{CreateCustomerPayload, Customer},
        order::{InvoiceStatus, PlaceOrderPayload},
    },
    services::{
        document_service::{InvoiceDocument, InvoiceRenderer},
        storage_service::DocumentStorage,
    },
};

// ---
// Fakes
// ---

struct TempFileRenderer;

#[async_trait]
impl InvoiceRenderer for TempFileRenderer {
    async fn render(&self, document: &InvoiceDocument) -> Result<PathBuf, AppError> {
        let path = std::env::temp_dir().join(format!("{}-{}.pdf", document.invoice_number(), Uuid::new_v4()));
        tokio::fs::write(&path, b"%PDF-1.4")
            .await
            .map_err(|e| anyhow::anyhow!("cannot write fake invoice: {e}"))?;
        Ok(path)
    }
}

struct BrokenRenderer;

#[async_trait]
impl InvoiceRenderer for BrokenRenderer {
    async fn render(&self, _document: &InvoiceDocument) -> Result<PathBuf, AppError> {
        Err(anyhow::anyhow!("renderer offline").into())
    }
}

struct UrlOnlyStorage;

#[async_trait]
impl DocumentStorage for UrlOnlyStorage {
    async fn store(&self, _local_path: &Path, company_name: &str, customer_name: &str) -> Result<String, AppError> {
        Ok(format!("http://files.test/invoices/{company_name}/{customer_name}.pdf"))
    }
}

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/unused".into(),
        jwt_secret: "test-secret".into(),
        bind_addr: "127.0.0.1:0".into(),
        max_db_connections: 1,
        token_ttl_hours: 24,
        public_base_url: "http://files.test".into(),
        storage_dir: std::env::temp_dir(),
        invoice_tmp_dir: std::env::temp_dir(),
        fonts_dir: PathBuf::from("./fonts"),
        font_family: "Roboto".into(),
        invoice_retry_delay: Duration::ZERO,
        invoice_render_timeout: Duration::from_secs(5),
        reconcile_interval: Duration::ZERO,
        reconcile_max_attempts: 3,
        analytics_timezone: "Asia/Kolkata".into(),
    }
}

fn state_with(pool: PgPool, renderer: Arc<dyn InvoiceRenderer>) -> AppState {
    AppState::from_parts(pool, test_config(), renderer, Arc::new(UrlOnlyStorage))
}

fn state(pool: PgPool) -> AppState {
    state_with(pool, Arc::new(TempFileRenderer))
}

// ---
// Fixtures
// ---

async fn signup_superadmin(app: &AppState) -> AuthResponse {
    app.auth_service
        .signup(SignupPayload {
            name: "Root".into(),
            email: "root@shop.test".into(),
            password: "secret-password".into(),
            role: Role::Superadmin,
            company: None,
        })
        .await
        .unwrap()
}

async fn signup_shop(app: &AppState, email: &str, company_name: &str) -> (AuthResponse, Company) {
    let auth = app
        .auth_service
        .signup(SignupPayload {
            name: "Shop Admin".into(),
            email: email.into(),
            password: "secret-password".into(),
            role: Role::Subadmin,
            company: Some(SignupCompanyPayload {
                name: company_name.into(),
                tagline: None,
                address: None,
                phone: None,
                gst_number: None,
            }),
        })
        .await
        .unwrap();
    let company = app
        .company_service
        .get_company(auth.user.company_id.unwrap())
        .await
        .unwrap();
    (auth, company)
}

async fn sparkler(app: &AppState, company: &Company) -> Product {
    app.catalog_service
        .create_product(
            company.id,
            &CreateProductPayload {
                name: "Sparkler".into(),
                price: Decimal::from(50),
                stock_available: 10,
                image: Some("🎇".into()),
            },
        )
        .await
        .unwrap()
}

async fn flower_pot(app: &AppState, company: &Company) -> Product {
    app.catalog_service
        .create_product(
            company.id,
            &CreateProductPayload {
                name: "Flower Pot".into(),
                price: Decimal::from(30),
                stock_available: 1,
                image: None,
            },
        )
        .await
        .unwrap()
}

// Five sparklers sold as one box at 450, three boxes in stock.
async fn family_pack(app: &AppState, company: &Company, sparkler: &Product) -> GiftBoxDetail {
    app.catalog_service
        .create_gift_box(
            company.id,
            &CreateGiftBoxPayload {
                name: "Family Pack".into(),
                products: vec![GiftBoxComponent { product_id: sparkler.id, quantity: 5 }],
                discount: Decimal::ZERO,
                total: Decimal::from(250),
                grand_total: Decimal::from(450),
                stock_available: 3,
            },
        )
        .await
        .unwrap()
}

async fn asha(app: &AppState, company: &Company) -> Customer {
    app.customer_service
        .create_customer(
            company.id,
            &CreateCustomerPayload {
                name: "Asha".into(),
                phone: Some("9999999999".into()),
                address: None,
                city: Some("Sivakasi".into()),
                state: Some("Tamil Nadu".into()),
            },
        )
        .await
        .unwrap()
}

fn order_payload(customer: &Customer, product: &Product, quantity: i32, total: i64, grand_total: i64) -> PlaceOrderPayload {
    serde_json::from_value(json!({
        "cartId": "tab-1",
        "customerId": customer.id,
        "products": [{ "productId": product.id, "quantity": quantity }],
        "discount": 10,
        "total": total,
        "grandtotal": grand_total,
        "gst": { "status": false }
    }))
    .unwrap()
}

async fn place(app: &AppState, company: &Company, body: Value) -> Result<crate::models::order::PlaceOrderResponse, AppError> {
    let payload: PlaceOrderPayload = serde_json::from_value(body).unwrap();
    app.order_service.place_order(company, payload).await
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---
// Router
// ---

fn lazy_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    state(pool)
}

#[tokio::test]
async fn health_is_public() {
    let response = build_router(lazy_state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tenant_routes_require_a_bearer_token() {
    let response = build_router(lazy_state())
        .oneshot(Request::builder().uri("/product").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Invalid token");
}

#[tokio::test]
async fn malformed_token_is_rejected_before_any_query() {
    let response = build_router(lazy_state())
        .oneshot(
            Request::builder()
                .uri("/order/all")
                .header("authorization", "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn openapi_document_lists_order_placement() {
    let response = build_router(lazy_state())
        .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/order/place-order"]["post"].is_object());
}

// ---
// Workflows
// ---

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn asha_buys_two_sparklers(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;

    let placed = app
        .order_service
        .place_order(&company, order_payload(&customer, &product, 2, 100, 90))
        .await
        .unwrap();
    assert_eq!(placed.grand_total, Decimal::from(90));
    assert!(!placed.invoice_url.is_empty());

    let product = app.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product.stock_available, 8);
    assert_eq!(product.total_sales, 2);
    assert_eq!(product.total_revenue, Decimal::from(100));

    let customer = app.customer_service.get_customer(company.id, customer.id).await.unwrap();
    assert_eq!(customer.orders, vec![placed.order_id]);

    let order = app.order_service.get_order(company.id, placed.order_id).await.unwrap();
    assert_eq!(order.order.total, Decimal::from(100));
    assert_eq!(order.order.invoice_status, InvoiceStatus::Ready);
    assert_eq!(order.cart_items.len(), 1);
    assert_eq!(order.cart_items[0].quantity, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn overselling_leaves_counters_untouched(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;

    let err = app
        .order_service
        .place_order(&company, order_payload(&customer, &product, 11, 550, 495))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Insufficient stock"));

    let product = app.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product.stock_available, 10);
    assert_eq!(product.total_sales, 0);
    assert_eq!(product.total_revenue, Decimal::ZERO);
    assert!(app.order_service.list_orders(company.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn client_totals_must_match(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;

    let err = app
        .order_service
        .place_order(&company, order_payload(&customer, &product, 2, 100, 80))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TotalsMismatch { field: "grandTotal", .. }));

    for discount in [-50, 150] {
        let err = place(
            &app,
            &company,
            json!({
                "customerId": customer.id,
                "products": [{ "productId": product.id, "quantity": 2 }],
                "discount": discount,
                "total": 100,
                "grandTotal": 150,
                "gst": { "status": false }
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(err, AppError::ValidationError(_)));
    }
    let product = app.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product.stock_available, 10);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn other_companies_ids_are_invisible(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, shop_a) = signup_shop(&app, "shop@a.test", "Shop A").await;
    let (_, shop_b) = signup_shop(&app, "shop@b.test", "Shop B").await;
    let product = sparkler(&app, &shop_a).await;
    let customer = asha(&app, &shop_a).await;

    let err = app.catalog_service.get_product(shop_b.id, product.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = app.customer_service.get_customer(shop_b.id, customer.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Shop B cannot sell Shop A's stock.
    let err = app
        .order_service
        .place_order(&shop_b, order_payload(&customer, &product, 1, 50, 45))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn inactive_company_is_blocked_at_the_gate(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (auth, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    app.company_service.set_company_status(company.id, false).await.unwrap();

    let response = build_router(app.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/product")
                .header("authorization", format!("Bearer {}", auth.token))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "name": "Rocket", "price": 20, "stockAvailable": 5 }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.catalog_service.list_products(company.id, true).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn superadmin_picks_tenant_by_header(pool: PgPool) {
    let app = state(pool);
    let root = signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    sparkler(&app, &company).await;

    let response = build_router(app.clone())
        .oneshot(
            Request::builder()
                .uri("/product")
                .header("authorization", format!("Bearer {}", root.token))
                .header("x-tenant-id", company.id.to_string())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let products = body_json(response).await;
    assert_eq!(products[0]["name"], "Sparkler");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn second_superadmin_is_rejected(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let err = app
        .auth_service
        .signup(SignupPayload {
            name: "Other".into(),
            email: "other@shop.test".into(),
            password: "secret-password".into(),
            role: Role::Superadmin,
            company: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SuperadminAlreadyExists));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn emptying_a_cart_twice_is_a_no_op(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let empty: SaveCartPayload = serde_json::from_value(json!({ "id": "tab-1" })).unwrap();

    for _ in 0..2 {
        let response = app.cart_service.save_cart(company.id, &empty).await.unwrap();
        assert_eq!(response.outcome, SaveCartOutcome::AlreadyEmpty);
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn saved_cart_round_trips_and_is_consumed_by_checkout(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;

    let draft: SaveCartPayload = serde_json::from_value(json!({
        "id": "tab-1",
        "products": [{ "productId": product.id, "quantity": 2 }],
        "discount": 10,
        "total": 100,
        "gst": { "status": false },
        "grandtotal": 90
    }))
    .unwrap();
    let saved = app.cart_service.save_cart(company.id, &draft).await.unwrap();
    assert_eq!(saved.outcome, SaveCartOutcome::Saved);

    let pending = app.cart_service.get_pending_cart(company.id, "tab-1").await.unwrap();
    let cart = pending.cart.unwrap();
    assert!(pending.pending);
    assert_eq!(cart.products.0, draft.products);
    assert_eq!(cart.gst.0, draft.gst);
    assert_eq!(cart.grand_total, Decimal::from(90));

    app.order_service
        .place_order(&company, order_payload(&customer, &product, 2, 100, 90))
        .await
        .unwrap();
    let pending = app.cart_service.get_pending_cart(company.id, "tab-1").await.unwrap();
    assert!(!pending.pending);
    assert!(pending.cart.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn failed_invoice_keeps_the_order_and_can_be_regenerated(pool: PgPool) {
    let broken = state_with(pool.clone(), Arc::new(BrokenRenderer));
    signup_superadmin(&broken).await;
    let (_, company) = signup_shop(&broken, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&broken, &company).await;
    let customer = asha(&broken, &company).await;

    let err = broken
        .order_service
        .place_order(&company, order_payload(&customer, &product, 2, 100, 90))
        .await
        .unwrap_err();
    let AppError::InvoiceFailed { order_id, .. } = err else {
        panic!("expected an invoice failure, got {err:?}");
    };

    let order = broken.order_service.get_order(company.id, order_id).await.unwrap();
    assert_eq!(order.order.invoice_status, InvoiceStatus::Failed);
    assert_eq!(order.order.invoice_attempts, 1);
    let product_after = broken.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product_after.stock_available, 8);

    let healthy = state(pool);
    let regenerated = healthy
        .order_service
        .regenerate_invoice(&company, order_id)
        .await
        .unwrap();
    assert!(regenerated.invoice_url.ends_with("Asha.pdf"));

    // Idempotent once READY.
    let again = healthy.order_service.regenerate_invoice(&company, order_id).await.unwrap();
    assert_eq!(again.invoice_url, regenerated.invoice_url);
    let order = healthy.order_service.get_order(company.id, order_id).await.unwrap();
    assert_eq!(order.order.invoice_status, InvoiceStatus::Ready);
    assert_eq!(order.order.invoice_attempts, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn gift_box_sale_moves_box_counters_at_its_grand_total(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let pack = family_pack(&app, &company, &product).await;
    let customer = asha(&app, &company).await;

    // one sparkler (50) and two packs (2 × 450), 10 % off
    let placed = place(
        &app,
        &company,
        json!({
            "customerId": customer.id,
            "products": [{ "productId": product.id, "quantity": 1 }],
            "giftboxes": [{ "giftboxId": pack.gift_box.id, "quantity": 2 }],
            "discount": 10,
            "total": 950,
            "grandtotal": 855,
            "gst": { "status": false }
        }),
    )
    .await
    .unwrap();
    assert_eq!(placed.grand_total, Decimal::from(855));

    let pack = app.catalog_service.get_gift_box(company.id, pack.gift_box.id).await.unwrap();
    assert_eq!(pack.gift_box.stock_available, 1);
    assert_eq!(pack.gift_box.total_sales, 2);
    assert_eq!(pack.gift_box.total_revenue, Decimal::from(900));

    // Box contents are not drawn from product stock.
    let product = app.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product.stock_available, 9);
    assert_eq!(product.total_revenue, Decimal::from(50));

    let order = app.order_service.get_order(company.id, placed.order_id).await.unwrap();
    assert_eq!(order.gift_boxes.len(), 1);
    assert_eq!(order.gift_boxes[0].item_id, pack.gift_box.id);
    assert_eq!(order.gift_boxes[0].quantity, 2);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn unknown_or_short_gift_boxes_are_rejected(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let pack = family_pack(&app, &company, &product).await;
    let customer = asha(&app, &company).await;

    let err = place(
        &app,
        &company,
        json!({
            "customerId": customer.id,
            "products": [{ "productId": product.id, "quantity": 1 }],
            "giftBoxes": [{ "giftBoxId": Uuid::new_v4(), "quantity": 1 }],
            "discount": 0,
            "total": 500,
            "grandTotal": 500,
            "gst": { "status": false }
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.to_string(), "Gift box not found");

    let err = place(
        &app,
        &company,
        json!({
            "customerId": customer.id,
            "products": [{ "productId": product.id, "quantity": 1 }],
            "giftBoxes": [{ "giftBoxId": pack.gift_box.id, "quantity": 4 }],
            "discount": 0,
            "total": 1850,
            "grandTotal": 1850,
            "gst": { "status": false }
        }),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Insufficient stock for Family Pack"));

    let pack = app.catalog_service.get_gift_box(company.id, pack.gift_box.id).await.unwrap();
    assert_eq!(pack.gift_box.stock_available, 3);
    assert_eq!(pack.gift_box.total_sales, 0);
    let product = app.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product.stock_available, 10);
    assert!(app.order_service.list_orders(company.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn gst_is_added_after_the_discount(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;

    // 100 - 10 % = 90, plus 16.20 GST
    let placed = place(
        &app,
        &company,
        json!({
            "customerId": customer.id,
            "products": [{ "productId": product.id, "quantity": 2 }],
            "discount": 10,
            "total": 100,
            "grandTotal": 106.2,
            "gst": { "status": true, "percentage": 18, "amount": "16.20" }
        }),
    )
    .await
    .unwrap();
    assert_eq!(placed.grand_total, Decimal::new(10620, 2));

    let order = app.order_service.get_order(company.id, placed.order_id).await.unwrap().order;
    assert!(order.gst_status);
    assert_eq!(order.gst_percentage, Decimal::from(18));
    assert_eq!(order.gst_amount, Decimal::new(1620, 2));
    assert_eq!(order.total, Decimal::from(100));
    assert_eq!(order.grand_total, Decimal::new(10620, 2));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn a_short_later_line_undoes_the_earlier_ones(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let pot = flower_pot(&app, &company).await;
    let customer = asha(&app, &company).await;

    let err = place(
        &app,
        &company,
        json!({
            "customerId": customer.id,
            "products": [
                { "productId": product.id, "quantity": 2 },
                { "productId": pot.id, "quantity": 2 }
            ],
            "discount": 0,
            "total": 160,
            "grandTotal": 160,
            "gst": { "status": false }
        }),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Insufficient stock for Flower Pot"));

    // Each line fits on its own, so the shortage only shows inside the
    // transaction after the first line has already been sold.
    let err = place(
        &app,
        &company,
        json!({
            "customerId": customer.id,
            "products": [
                { "productId": product.id, "quantity": 6 },
                { "productId": product.id, "quantity": 6 }
            ],
            "discount": 10,
            "total": 600,
            "grandTotal": 540,
            "gst": { "status": false }
        }),
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Insufficient stock for Sparkler"));

    let product = app.catalog_service.get_product(company.id, product.id).await.unwrap();
    assert_eq!(product.stock_available, 10);
    assert_eq!(product.total_sales, 0);
    assert_eq!(product.total_revenue, Decimal::ZERO);
    let pot = app.catalog_service.get_product(company.id, pot.id).await.unwrap();
    assert_eq!(pot.stock_available, 1);
    assert!(app.order_service.list_orders(company.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn deleting_an_inactive_item_is_a_bad_request(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let pack = family_pack(&app, &company, &product).await;

    let pack = app.catalog_service.delete_gift_box(company.id, pack.gift_box.id).await.unwrap();
    assert!(!pack.status);
    let err = app.catalog_service.delete_gift_box(company.id, pack.id).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Gift box is already inactive");

    let deleted = app.catalog_service.delete_product(company.id, product.id).await.unwrap();
    assert!(!deleted.status);
    let err = app.catalog_service.delete_product(company.id, product.id).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "Product is already inactive");

    let err = app.catalog_service.delete_product(company.id, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn dashboard_reflects_placed_orders(pool: PgPool) {
    let app = state(pool);
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;
    let placed = app
        .order_service
        .place_order(&company, order_payload(&customer, &product, 2, 100, 90))
        .await
        .unwrap();

    let response = app
        .analytics_service
        .advanced(company.id, &AnalyticsQuery::default())
        .await
        .unwrap();
    assert!(!response.fallback);
    let advanced = response.advanced.unwrap();
    assert_eq!(advanced.summary.orders, 1);
    assert_eq!(advanced.summary.revenue, Decimal::from(90));
    assert_eq!(advanced.summary.customers, 1);
    assert_eq!(advanced.top_products[0].name, "Sparkler");
    assert_eq!(advanced.top_products[0].quantity, 2);
    assert_eq!(advanced.top_customers[0].id, customer.id);
    assert!(advanced.gst.iter().any(|bucket| !bucket.gst_status && bucket.orders == 1));

    let rows = app
        .analytics_service
        .export(company.id, &AnalyticsQuery::default())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].order_id, placed.order_id);
    assert_eq!(rows[0].grand_total, Decimal::from(90));

    let realtime = app.analytics_service.realtime(company.id).await.unwrap();
    assert_eq!(realtime.orders_today, 1);
    assert_eq!(realtime.revenue_today, Decimal::from(90));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn failing_dashboard_queries_fall_back_to_order_stats(pool: PgPool) {
    let app = state(pool.clone());
    signup_superadmin(&app).await;
    let (_, company) = signup_shop(&app, "shop@a.test", "Sivakasi Crackers").await;
    let product = sparkler(&app, &company).await;
    let customer = asha(&app, &company).await;
    app.order_service
        .place_order(&company, order_payload(&customer, &product, 2, 100, 90))
        .await
        .unwrap();

    // Gift-box leaderboards read this table; the order counters do not.
    sqlx::query("ALTER TABLE order_gift_boxes RENAME TO order_gift_boxes_archived")
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .analytics_service
        .advanced(company.id, &AnalyticsQuery::default())
        .await
        .unwrap();
    assert!(response.fallback);
    assert!(response.advanced.is_none());
    let legacy = response.legacy.unwrap();
    assert_eq!(legacy.total_orders, 1);
    assert_eq!(legacy.total_revenue, Decimal::from(90));
}
