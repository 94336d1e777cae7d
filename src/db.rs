pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod sale_repo;
pub use sale_repo::SaleRepository;
pub mod pool_sale_repo;
pub use pool_sale_repo::PoolSaleRepository;
