pub mod auth;
pub use auth::AuthService;
pub mod sale_service;
pub use sale_service::SaleService;
pub mod pool_sale_service;
pub use pool_sale_service::PoolSaleService;
