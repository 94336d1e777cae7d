// src/db/catalog_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::{error::AppError, time},
    models::catalog::{
        Brand, BrandInput, Installer, InstallerInput, Pool, PoolInput, Product, ProductInput,
    },
};

// CRUD do catálogo por proprietário: produtos, piscinas, marcas (duas
// listas) e instaladores. Toda leitura E toda escrita filtram por owner_id.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ---
    // Produtos
    // ---

    pub async fn list_products(&self, owner_id: i64) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn create_product(
        &self,
        owner_id: i64,
        input: &ProductInput,
    ) -> Result<i64, AppError> {
        let now = time::now_iso();
        let result = sqlx::query(
            r#"
            INSERT INTO products
                (name, brand, weight, cost_price, sale_price, stock, low_stock_alert,
                 created_at, updated_at, owner_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.brand)
        .bind(&input.weight)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .bind(input.stock)
        .bind(input.low_stock_alert)
        .bind(&now)
        .bind(&now)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_product(
        &self,
        id: i64,
        owner_id: i64,
        input: &ProductInput,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?, brand = ?, weight = ?, cost_price = ?, sale_price = ?,
                stock = ?, low_stock_alert = ?, updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.brand)
        .bind(&input.weight)
        .bind(input.cost_price)
        .bind(input.sale_price)
        .bind(input.stock)
        .bind(input.low_stock_alert)
        .bind(time::now_iso())
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Produto não encontrado".to_string()));
        }
        Ok(())
    }

    pub async fn delete_product(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Produto não encontrado".to_string()));
        }
        Ok(())
    }

    /// Busca um produto dentro do escopo (usada pela venda para tirar o
    /// retrato de custo do item).
    pub async fn find_product<'e, E>(
        &self,
        executor: E,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(executor)
                .await?;
        Ok(product)
    }

    /// Baixa de estoque atômica e com piso: só decrementa se houver saldo.
    /// Zero linhas afetadas significa saldo insuficiente (o chamador decide
    /// entre NotFound e InsufficientStock).
    pub async fn decrement_stock_checked<'e, E>(
        &self,
        executor: E,
        product_id: i64,
        owner_id: i64,
        qty: i64,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE products SET stock = stock - ? WHERE id = ? AND owner_id = ? AND stock >= ?",
        )
        .bind(qty)
        .bind(product_id)
        .bind(owner_id)
        .bind(qty)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Devolução de estoque no cancelamento (reversão exata da baixa).
    pub async fn increment_stock<'e, E>(
        &self,
        executor: E,
        product_id: i64,
        owner_id: i64,
        qty: i64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE products SET stock = stock + ? WHERE id = ? AND owner_id = ?")
            .bind(qty)
            .bind(product_id)
            .bind(owner_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    // ---
    // Piscinas
    // ---

    pub async fn list_pools(&self, owner_id: i64) -> Result<Vec<Pool>, AppError> {
        let pools =
            sqlx::query_as::<_, Pool>("SELECT * FROM pools WHERE owner_id = ? ORDER BY id DESC")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(pools)
    }

    pub async fn create_pool(&self, owner_id: i64, input: &PoolInput) -> Result<i64, AppError> {
        let now = time::now_iso();
        let result = sqlx::query(
            r#"
            INSERT INTO pools (
                model, brand, length, width, depth,
                cost_price, cost_white, cost_with_tile, cost_white_with_tile,
                sale_price, sale_white, sale_with_tile, sale_white_with_tile,
                created_at, updated_at, owner_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.model)
        .bind(&input.brand)
        .bind(input.length)
        .bind(input.width)
        .bind(input.depth)
        .bind(input.cost_price)
        .bind(input.cost_white)
        .bind(input.cost_with_tile)
        .bind(input.cost_white_with_tile)
        .bind(input.sale_price)
        .bind(input.sale_white)
        .bind(input.sale_with_tile)
        .bind(input.sale_white_with_tile)
        .bind(&now)
        .bind(&now)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_pool(
        &self,
        id: i64,
        owner_id: i64,
        input: &PoolInput,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE pools SET
                model = ?, brand = ?, length = ?, width = ?, depth = ?,
                cost_price = ?, cost_white = ?, cost_with_tile = ?, cost_white_with_tile = ?,
                sale_price = ?, sale_white = ?, sale_with_tile = ?, sale_white_with_tile = ?,
                updated_at = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&input.model)
        .bind(&input.brand)
        .bind(input.length)
        .bind(input.width)
        .bind(input.depth)
        .bind(input.cost_price)
        .bind(input.cost_white)
        .bind(input.cost_with_tile)
        .bind(input.cost_white_with_tile)
        .bind(input.sale_price)
        .bind(input.sale_white)
        .bind(input.sale_with_tile)
        .bind(input.sale_white_with_tile)
        .bind(time::now_iso())
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Piscina não encontrada".to_string()));
        }
        Ok(())
    }

    pub async fn delete_pool(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM pools WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Piscina não encontrada".to_string()));
        }
        Ok(())
    }

    // ---
    // Marcas (produtos e piscinas compartilham o formato; tabelas distintas)
    // ---

    async fn list_brand_table(
        &self,
        table: &'static str,
        owner_id: i64,
    ) -> Result<Vec<Brand>, AppError> {
        let brands = sqlx::query_as::<_, Brand>(&format!(
            "SELECT * FROM {table} WHERE owner_id = ? ORDER BY name ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(brands)
    }

    async fn create_brand_table(
        &self,
        table: &'static str,
        owner_id: i64,
        input: &BrandInput,
    ) -> Result<i64, AppError> {
        let result = sqlx::query(&format!(
            "INSERT INTO {table} (name, supplier, owner_id) VALUES (?, ?, ?)"
        ))
        .bind(&input.name)
        .bind(&input.supplier)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn update_brand_table(
        &self,
        table: &'static str,
        id: i64,
        owner_id: i64,
        input: &BrandInput,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&format!(
            "UPDATE {table} SET name = ?, supplier = ? WHERE id = ? AND owner_id = ?"
        ))
        .bind(&input.name)
        .bind(&input.supplier)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Marca não encontrada".to_string()));
        }
        Ok(())
    }

    async fn delete_brand_table(
        &self,
        table: &'static str,
        id: i64,
        owner_id: i64,
    ) -> Result<(), AppError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ? AND owner_id = ?"))
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Marca não encontrada".to_string()));
        }
        Ok(())
    }

    pub async fn list_brands(&self, owner_id: i64) -> Result<Vec<Brand>, AppError> {
        self.list_brand_table("brands", owner_id).await
    }

    pub async fn create_brand(&self, owner_id: i64, input: &BrandInput) -> Result<i64, AppError> {
        self.create_brand_table("brands", owner_id, input).await
    }

    pub async fn update_brand(
        &self,
        id: i64,
        owner_id: i64,
        input: &BrandInput,
    ) -> Result<(), AppError> {
        self.update_brand_table("brands", id, owner_id, input).await
    }

    pub async fn delete_brand(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        self.delete_brand_table("brands", id, owner_id).await
    }

    pub async fn list_pool_brands(&self, owner_id: i64) -> Result<Vec<Brand>, AppError> {
        self.list_brand_table("pool_brands", owner_id).await
    }

    pub async fn create_pool_brand(
        &self,
        owner_id: i64,
        input: &BrandInput,
    ) -> Result<i64, AppError> {
        self.create_brand_table("pool_brands", owner_id, input).await
    }

    pub async fn update_pool_brand(
        &self,
        id: i64,
        owner_id: i64,
        input: &BrandInput,
    ) -> Result<(), AppError> {
        self.update_brand_table("pool_brands", id, owner_id, input)
            .await
    }

    pub async fn delete_pool_brand(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        self.delete_brand_table("pool_brands", id, owner_id).await
    }

    // ---
    // Instaladores
    // ---

    pub async fn list_installers(&self, owner_id: i64) -> Result<Vec<Installer>, AppError> {
        let installers = sqlx::query_as::<_, Installer>(
            "SELECT * FROM installers WHERE owner_id = ? ORDER BY name ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(installers)
    }

    pub async fn create_installer(
        &self,
        owner_id: i64,
        input: &InstallerInput,
    ) -> Result<i64, AppError> {
        let result =
            sqlx::query("INSERT INTO installers (name, contact, owner_id) VALUES (?, ?, ?)")
                .bind(&input.name)
                .bind(&input.contact)
                .bind(owner_id)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn update_installer(
        &self,
        id: i64,
        owner_id: i64,
        input: &InstallerInput,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE installers SET name = ?, contact = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(&input.name)
        .bind(&input.contact)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Instalador não encontrado.".to_string()));
        }
        Ok(())
    }

    pub async fn delete_installer(&self, id: i64, owner_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM installers WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Instalador não encontrado.".to_string()));
        }
        Ok(())
    }
}
