pub mod auth;
pub mod catalog;
pub mod pool_sales;
pub mod sales;
