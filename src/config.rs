// src/config.rs

use std::{env, str::FromStr, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    db::{CatalogRepository, PoolSaleRepository, SaleRepository, UserRepository},
    services::{AuthService, PoolSaleService, SaleService},
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub auth_service: AuthService,
    pub sale_service: SaleService,
    pub pool_sale_service: PoolSaleService,
    pub user_repo: UserRepository,
    pub catalog_repo: CatalogRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://aquastore.db".to_string());
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET deve ser definido");

        let options = SqliteConnectOptions::from_str(&database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let db_pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(options)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let sale_repo = SaleRepository::new(db_pool.clone());
        let pool_sale_repo = PoolSaleRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret);
        let sale_service = SaleService::new(db_pool.clone(), sale_repo, catalog_repo.clone());
        let pool_sale_service = PoolSaleService::new(pool_sale_repo);

        Ok(Self {
            db_pool,
            auth_service,
            sale_service,
            pool_sale_service,
            user_repo,
            catalog_repo,
        })
    }

    /// Estado montado sobre uma pool de teste, sem tocar no ambiente.
    #[cfg(test)]
    pub(crate) fn with_pool(db_pool: SqlitePool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let sale_repo = SaleRepository::new(db_pool.clone());
        let pool_sale_repo = PoolSaleRepository::new(db_pool.clone());

        Self {
            auth_service: AuthService::new(user_repo.clone(), "segredo_de_teste".to_string()),
            sale_service: SaleService::new(db_pool.clone(), sale_repo, catalog_repo.clone()),
            pool_sale_service: PoolSaleService::new(pool_sale_repo),
            db_pool,
            user_repo,
            catalog_repo,
        }
    }
}
