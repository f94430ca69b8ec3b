pub mod analytics;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod company;
pub mod customer;
pub mod order;
