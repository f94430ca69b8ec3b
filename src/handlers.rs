pub mod analytics;
pub mod auth;
pub mod cart;
pub mod company;
pub mod customer;
pub mod giftbox;
pub mod order;
pub mod product;
pub mod users;
