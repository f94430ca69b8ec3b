// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::signup,
        handlers::auth::login,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::set_user_status,
        handlers::users::get_me,

        // --- Company ---
        handlers::company::get_company,
        handlers::company::update_company,
        handlers::company::list_companies,
        handlers::company::set_company_status,

        // --- Product ---
        handlers::product::list_products,
        handlers::product::low_stock,
        handlers::product::get_product,
        handlers::product::create_product,
        handlers::product::update_product,
        handlers::product::delete_product,

        // --- Gift box ---
        handlers::giftbox::list_gift_boxes,
        handlers::giftbox::get_gift_box,
        handlers::giftbox::create_gift_box,
        handlers::giftbox::update_gift_box,
        handlers::giftbox::delete_gift_box,

        // --- Customer ---
        handlers::customer::list_customers,
        handlers::customer::get_customer,
        handlers::customer::customer_history,
        handlers::customer::create_customer,
        handlers::customer::update_customer,
        handlers::customer::delete_customer,

        // --- Cart ---
        handlers::cart::save_cart,
        handlers::cart::get_pending_cart,

        // --- Order ---
        handlers::order::place_order,
        handlers::order::regenerate_invoice,
        handlers::order::list_orders,
        handlers::order::get_order,
        handlers::order::order_stats,
        handlers::order::monthly_orders,

        // --- Analytics ---
        handlers::analytics::advanced,
        handlers::analytics::export,
        handlers::analytics::realtime,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::SignupPayload,
            models::auth::SignupCompanyPayload,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::UpdateStatusPayload,

            // --- Company ---
            models::company::Company,
            models::company::CompanyOverview,
            models::company::UpdateCompanyPayload,

            // --- Catalog ---
            models::catalog::Product,
            models::catalog::GiftBox,
            models::catalog::GiftBoxItem,
            models::catalog::GiftBoxDetail,
            models::catalog::GiftBoxComponent,
            models::catalog::CreateProductPayload,
            models::catalog::UpdateProductPayload,
            models::catalog::CreateGiftBoxPayload,
            models::catalog::UpdateGiftBoxPayload,

            // --- Customer ---
            models::customer::Customer,
            models::customer::CustomerHistory,
            models::customer::HistoryOrder,
            models::customer::HistoryLine,
            models::customer::CreateCustomerPayload,
            models::customer::UpdateCustomerPayload,

            // --- Cart ---
            models::cart::Cart,
            models::cart::SaveCartPayload,
            models::cart::SaveCartOutcome,
            models::cart::SaveCartResponse,
            models::cart::PendingCartResponse,

            // --- Order ---
            models::order::InvoiceStatus,
            models::order::GstInput,
            models::order::Gst,
            models::order::ProductLineInput,
            models::order::GiftBoxLineInput,
            models::order::PlaceOrderPayload,
            models::order::PlaceOrderResponse,
            models::order::MonthlyOrdersPayload,
            models::order::CustomerInfo,
            models::order::Order,
            models::order::OrderLine,
            models::order::OrderDetail,
            models::order::OrderSummary,
            models::order::OrderStats,

            // --- Analytics ---
            models::analytics::Granularity,
            models::analytics::DateWindow,
            models::analytics::AdvancedAnalytics,
            models::analytics::AnalyticsResponse,
            models::analytics::ExportRow,
            models::analytics::RealtimeSnapshot,
        )
    ),
    tags(
        (name = "Auth", description = "Sign-up and login"),
        (name = "Users", description = "Sub-admin accounts"),
        (name = "Company", description = "Company profile and tenant activation"),
        (name = "Product", description = "Product catalog and stock"),
        (name = "Gift box", description = "Curated gift boxes"),
        (name = "Customer", description = "Customer registry and order history"),
        (name = "Cart", description = "Checkout drafts"),
        (name = "Order", description = "Order placement and invoices"),
        (name = "Analytics", description = "Sales dashboards")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
