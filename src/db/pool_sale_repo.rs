// src/db/pool_sale_repo.rs

use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    models::{
        pool_sales::{PoolSale, PoolSaleData, PoolSaleStatus},
        sales::SalesStats,
    },
};

// Vendas de piscina: retrato desnormalizado, sem movimentação de estoque.
// O escopo é opcional nas leituras porque o host enxerga todas as lojas.
#[derive(Clone)]
pub struct PoolSaleRepository {
    pool: SqlitePool,
}

impl PoolSaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        id: &str,
        owner_id: i64,
        seller_id: i64,
        data: &PoolSaleData,
        created_at: &str,
    ) -> Result<(), AppError> {
        let status = data.status.unwrap_or_default();
        sqlx::query(
            r#"
            INSERT INTO pool_sales (
                id, owner_id, seller_id,
                cliente, cpf, rg, telefone, endereco, numero_casa, referencia, cep, bairro, cidade,
                produto, marca, garantia_fabrica, garantia_3_meses, garantia_12_meses,
                produtos_inclusos, obs_incluso, observacoes_pagamento,
                cor, pastilha, tipo_pastilha,
                valor_total, entrada, vendedor, instalador, pagamento, observacoes,
                prazo_entrega, data_venda, status, created_at
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(seller_id)
        .bind(&data.cliente)
        .bind(&data.cpf)
        .bind(&data.rg)
        .bind(&data.telefone)
        .bind(&data.endereco)
        .bind(&data.numero_casa)
        .bind(&data.referencia)
        .bind(&data.cep)
        .bind(&data.bairro)
        .bind(&data.cidade)
        .bind(&data.produto)
        .bind(&data.marca)
        .bind(&data.garantia_fabrica)
        .bind(&data.garantia_3_meses)
        .bind(&data.garantia_12_meses)
        .bind(&data.produtos_inclusos)
        .bind(&data.obs_incluso)
        .bind(&data.observacoes_pagamento)
        .bind(&data.cor)
        .bind(&data.pastilha)
        .bind(&data.tipo_pastilha)
        .bind(data.valor_total)
        .bind(data.entrada)
        .bind(&data.vendedor)
        .bind(&data.instalador)
        .bind(&data.pagamento)
        .bind(&data.observacoes)
        .bind(&data.prazo_entrega)
        .bind(&data.data_venda)
        .bind(status)
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// `scope = None` significa visão de host (todas as lojas).
    pub async fn list(&self, scope: Option<i64>) -> Result<Vec<PoolSale>, AppError> {
        let sales = match scope {
            Some(owner_id) => {
                sqlx::query_as::<_, PoolSale>(
                    "SELECT * FROM pool_sales WHERE owner_id = ? ORDER BY created_at DESC",
                )
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PoolSale>("SELECT * FROM pool_sales ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(sales)
    }

    pub async fn find(&self, id: &str, scope: Option<i64>) -> Result<Option<PoolSale>, AppError> {
        let sale = match scope {
            Some(owner_id) => {
                sqlx::query_as::<_, PoolSale>(
                    "SELECT * FROM pool_sales WHERE id = ? AND owner_id = ?",
                )
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => sqlx::query_as::<_, PoolSale>("SELECT * FROM pool_sales WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        };
        Ok(sale)
    }

    pub async fn update(
        &self,
        id: &str,
        owner_id: i64,
        data: &PoolSaleData,
        status: PoolSaleStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE pool_sales SET
                cliente = ?, cpf = ?, rg = ?, telefone = ?, endereco = ?, numero_casa = ?,
                referencia = ?, cep = ?, bairro = ?, cidade = ?,
                produto = ?, marca = ?, garantia_fabrica = ?, garantia_3_meses = ?, garantia_12_meses = ?,
                produtos_inclusos = ?, obs_incluso = ?, observacoes_pagamento = ?,
                cor = ?, pastilha = ?, tipo_pastilha = ?,
                valor_total = ?, entrada = ?, vendedor = ?, instalador = ?, pagamento = ?,
                observacoes = ?, prazo_entrega = ?, data_venda = ?, status = ?
            WHERE id = ? AND owner_id = ?
            "#,
        )
        .bind(&data.cliente)
        .bind(&data.cpf)
        .bind(&data.rg)
        .bind(&data.telefone)
        .bind(&data.endereco)
        .bind(&data.numero_casa)
        .bind(&data.referencia)
        .bind(&data.cep)
        .bind(&data.bairro)
        .bind(&data.cidade)
        .bind(&data.produto)
        .bind(&data.marca)
        .bind(&data.garantia_fabrica)
        .bind(&data.garantia_3_meses)
        .bind(&data.garantia_12_meses)
        .bind(&data.produtos_inclusos)
        .bind(&data.obs_incluso)
        .bind(&data.observacoes_pagamento)
        .bind(&data.cor)
        .bind(&data.pastilha)
        .bind(&data.tipo_pastilha)
        .bind(data.valor_total)
        .bind(data.entrada)
        .bind(&data.vendedor)
        .bind(&data.instalador)
        .bind(&data.pagamento)
        .bind(&data.observacoes)
        .bind(&data.prazo_entrega)
        .bind(&data.data_venda)
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

    pub async fn set_status(
        &self,
        id: &str,
        owner_id: i64,
        status: PoolSaleStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE pool_sales SET status = ? WHERE id = ? AND owner_id = ?")
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
            "UPDATE pool_sales SET delivered_products = ? WHERE id = ? AND owner_id = ?",
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

    /// Resumo de piscinas: soma a ENTRADA (valor efetivamente recebido na
    /// venda), janelas sobre data_venda, excluindo apenas canceladas.
    pub async fn stats_summary(
        &self,
        owner_id: i64,
        today: &str,
        week_ago: &str,
    ) -> Result<SalesStats, AppError> {
        // COALESCE com 0.0: na janela vazia, 0 viria como INTEGER e a
        // decodificação para f64 falharia.
        let (hoje_qtd, hoje_valor): (i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(entrada), 0.0)
              FROM pool_sales
             WHERE owner_id = ? AND DATE(data_venda) = ? AND status != 'cancelado'
            "#,
        )
        .bind(owner_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let (semana_qtd, semana_valor): (i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(entrada), 0.0)
              FROM pool_sales
             WHERE owner_id = ? AND DATE(data_venda) >= ? AND status != 'cancelado'
            "#,
        )
        .bind(owner_id)
        .bind(week_ago)
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
