// src/db/sale_repo.rs

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::{
    common::error::AppError,
    models::sales::{REVENUE_PAYMENT_METHODS, Sale, SaleItemDetail, SaleStatus, SalesStats},
};

// Linhas de venda e itens. As escritas transacionais recebem o executor da
// transação aberta pelo SaleService; as leituras usam a pool.
#[derive(Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

/// Item cru usado na reversão de estoque do cancelamento.
#[derive(Debug, sqlx::FromRow)]
pub struct SaleItemRow {
    pub product_id: i64,
    pub qty: i64,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn exists<'e, E>(&self, executor: E, id: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM sales WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.is_some())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_sale<'e, E>(
        &self,
        executor: E,
        id: &str,
        owner_id: i64,
        seller_id: i64,
        seller_name: &str,
        total: f64,
        discount: f64,
        payment_method: &str,
        status: SaleStatus,
        internal_use: bool,
        created_at: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sales
                (id, owner_id, seller_id, seller_name, total, discount,
                 payment_method, status, internal_use, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(seller_id)
        .bind(seller_name)
        .bind(total)
        .bind(discount)
        .bind(payment_method)
        .bind(status)
        .bind(internal_use as i64)
        .bind(created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn insert_item<'e, E>(
        &self,
        executor: E,
        id: &str,
        sale_id: &str,
        product_id: i64,
        qty: i64,
        unit_price: f64,
        cost_at_sale: f64,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO sale_items (id, sale_id, product_id, qty, unit_price, cost_at_sale)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(sale_id)
        .bind(product_id)
        .bind(qty)
        .bind(unit_price)
        .bind(cost_at_sale)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Busca SEM filtro de escopo: o cancelamento precisa distinguir
    /// "não existe" (404) de "não é sua" (403).
    pub async fn find_sale<'e, E>(&self, executor: E, id: &str) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn find_sale_scoped(
        &self,
        id: &str,
        owner_id: i64,
    ) -> Result<Option<Sale>, AppError> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    pub async fn list_sales(&self, owner_id: i64) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Itens de uma venda com o nome do produto, já restritos ao escopo do
    /// dono (o JOIN com sales garante o filtro).
    pub async fn items_for_display(
        &self,
        sale_id: &str,
        owner_id: i64,
    ) -> Result<Vec<SaleItemDetail>, AppError> {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.id, si.sale_id, si.product_id, si.qty, si.unit_price, si.cost_at_sale,
                   p.name AS product_name
              FROM sale_items si
              JOIN sales s ON s.id = si.sale_id
              LEFT JOIN products p ON p.id = si.product_id
             WHERE si.sale_id = ? AND s.owner_id = ?
            "#,
        )
        .bind(sale_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn items_raw<'e, E>(
        &self,
        executor: E,
        sale_id: &str,
    ) -> Result<Vec<SaleItemRow>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let items = sqlx::query_as::<_, SaleItemRow>(
            "SELECT product_id, qty FROM sale_items WHERE sale_id = ?",
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn mark_cancelled<'e, E>(&self, executor: E, id: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE sales SET status = 'cancelado' WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn update_payment(
        &self,
        id: &str,
        owner_id: i64,
        payment_method: &str,
        status: SaleStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE sales SET payment_method = ?, status = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(payment_method)
        .bind(status)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Venda não encontrada".to_string()));
        }
        Ok(())
    }

    pub async fn update_delivered_products(
        &self,
        id: &str,
        owner_id: i64,
        delivered_products: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE sales SET delivered_products = ? WHERE id = ? AND owner_id = ?",
        )
        .bind(delivered_products)
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Venda não encontrada".to_string()));
        }
        Ok(())
    }

    /// Resumo de receita: hoje e últimos 7 dias. Só vendas pagas, de uso
    /// externo e com método de pagamento que representa dinheiro em caixa.
    pub async fn stats_summary(
        &self,
        owner_id: i64,
        today_start: &str,
        week_start: &str,
    ) -> Result<SalesStats, AppError> {
        // O fallback do COALESCE precisa ser 0.0: com 0 o SQLite devolve um
        // INTEGER na janela vazia e a decodificação para f64 falha.
        let methods = REVENUE_PAYMENT_METHODS
            .map(|m| format!("'{m}'"))
            .join(", ");
        let query = format!(
            r#"
            SELECT COUNT(*) AS qtd, COALESCE(SUM(total), 0.0) AS valor
              FROM sales
             WHERE owner_id = ?
               AND created_at >= ?
               AND status = 'pago'
               AND internal_use = 0
               AND payment_method IN ({methods})
            "#
        );

        let (hoje_qtd, hoje_valor): (i64, f64) = sqlx::query_as(&query)
            .bind(owner_id)
            .bind(today_start)
            .fetch_one(&self.pool)
            .await?;

        let (semana_qtd, semana_valor): (i64, f64) = sqlx::query_as(&query)
            .bind(owner_id)
            .bind(week_start)
            .fetch_one(&self.pool)
            .await?;

        Ok(SalesStats {
            hoje_qtd,
            hoje_valor,
            semana_qtd,
            semana_valor,
        })
    }
}
