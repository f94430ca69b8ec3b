pub mod analytics_service;
pub mod auth;
pub mod cart_service;
pub mod catalog_service;
pub mod company_service;
pub mod customer_service;
pub mod document_service;
pub mod order_service;
pub mod pricing;
pub mod storage_service;
