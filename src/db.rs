pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod giftbox_repo;
pub use giftbox_repo::GiftBoxRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod cart_repo;
pub use cart_repo::CartRepository;
pub mod order_repo;
pub mod analytics_repo;

pub use order_repo::OrderRepository;

pub use analytics_repo::AnalyticsRepository;
