pub mod auth;
pub mod brands;
pub mod installers;
pub mod owners;
pub mod pool_sales;
pub mod pools;
pub mod products;
pub mod sales;
pub mod sellers;
