// src/services/sale_service.rs

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, time},
    db::{CatalogRepository, SaleRepository},
    models::{
        auth::{CurrentUser, Role},
        sales::{CreateSalePayload, SaleItemDetail, SaleStatus, SaleWithItems, SalesStats},
    },
};

/// Resultado do cancelamento, para o handler montar a resposta.
pub struct CancelOutcome {
    pub already_cancelled: bool,
    pub restored_items: usize,
}

// Gerenciador transacional de vendas: cabeçalho + itens + efeito no estoque
// entram (e saem, no cancelamento) como uma unidade atômica. Uma venda
// parcial nunca é observável.
#[derive(Clone)]
pub struct SaleService {
    pool: SqlitePool,
    sale_repo: SaleRepository,
    catalog_repo: CatalogRepository,
}

impl SaleService {
    pub fn new(pool: SqlitePool, sale_repo: SaleRepository, catalog_repo: CatalogRepository) -> Self {
        Self {
            pool,
            sale_repo,
            catalog_repo,
        }
    }

    pub async fn create_sale(
        &self,
        user: &CurrentUser,
        payload: &CreateSalePayload,
    ) -> Result<String, AppError> {
        if payload.items.is_empty() {
            return Err(AppError::InvalidInput(
                "Nenhum item recebido na venda.".to_string(),
            ));
        }

        let payment_method = payload
            .payment_method
            .clone()
            .unwrap_or_else(|| "pendente".to_string());
        let status = SaleStatus::from_payment_method(&payment_method);
        let seller_name = payload
            .seller_name
            .clone()
            .unwrap_or_else(|| user.username.clone());

        // Reenvio da fila offline: o client_id vira o id da venda. Se o id
        // já está persistido, o primeiro envio chegou; responde sucesso sem
        // duplicar.
        let sale_id = match payload.client_id {
            Some(client_id) => {
                let id = client_id.to_string();
                if self.sale_repo.exists(&self.pool, &id).await? {
                    return Ok(id);
                }
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        let scope = user.scope();
        let created_at = time::now_business_timestamp();

        let mut tx = self.pool.begin().await?;

        self.sale_repo
            .insert_sale(
                &mut *tx,
                &sale_id,
                scope,
                user.id,
                &seller_name,
                payload.total,
                payload.discount,
                &payment_method,
                status,
                payload.internal_use,
                &created_at,
            )
            .await?;

        for item in &payload.items {
            let product = self
                .catalog_repo
                .find_product(&mut *tx, item.product_id, scope)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Produto {} não encontrado", item.product_id))
                })?;

            let cost_at_sale = item.cost_at_sale.unwrap_or(product.cost_price);

            // Baixa atômica com piso em zero; se não houver saldo, a
            // transação inteira volta atrás.
            let decremented = self
                .catalog_repo
                .decrement_stock_checked(&mut *tx, item.product_id, scope, item.qty)
                .await?;
            if !decremented {
                return Err(AppError::InsufficientStock(item.product_id));
            }

            self.sale_repo
                .insert_item(
                    &mut *tx,
                    &Uuid::new_v4().to_string(),
                    &sale_id,
                    item.product_id,
                    item.qty,
                    item.unit_price,
                    cost_at_sale,
                )
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Venda {} registrada ({} itens, vendedor {})",
            sale_id,
            payload.items.len(),
            seller_name
        );
        Ok(sale_id)
    }

    pub async fn cancel_sale(
        &self,
        user: &CurrentUser,
        sale_id: &str,
    ) -> Result<CancelOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let sale = self
            .sale_repo
            .find_sale(&mut *tx, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada".to_string()))?;

        // Regras de permissão: proprietário cancela vendas da própria loja;
        // vendedor cancela apenas as próprias vendas; host não cancela.
        match user.role {
            Role::Host => {
                return Err(AppError::Forbidden(
                    "Host não cancela vendas de loja.".to_string(),
                ));
            }
            Role::Proprietario => {
                if sale.owner_id != user.id {
                    return Err(AppError::Forbidden(
                        "Esta venda não pertence a você.".to_string(),
                    ));
                }
            }
            Role::Vendedor => {
                if sale.owner_id != user.owner_id {
                    return Err(AppError::Forbidden(
                        "Acesso negado (owner diferente).".to_string(),
                    ));
                }
                if sale.seller_id != Some(user.id) {
                    return Err(AppError::Forbidden(
                        "Você não pode cancelar venda de outro vendedor.".to_string(),
                    ));
                }
            }
        }

        // Cancelamento é idempotente: repetir não devolve estoque de novo.
        if sale.status == SaleStatus::Cancelado {
            return Ok(CancelOutcome {
                already_cancelled: true,
                restored_items: 0,
            });
        }

        let items = self.sale_repo.items_raw(&mut *tx, sale_id).await?;
        for item in &items {
            self.catalog_repo
                .increment_stock(&mut *tx, item.product_id, sale.owner_id, item.qty)
                .await?;
        }

        self.sale_repo.mark_cancelled(&mut *tx, sale_id).await?;
        tx.commit().await?;

        tracing::info!(
            "Venda {} cancelada, {} itens devolvidos ao estoque",
            sale_id,
            items.len()
        );
        Ok(CancelOutcome {
            already_cancelled: false,
            restored_items: items.len(),
        })
    }

    /// Registra o pagamento de uma venda pendente. `cancelado` é terminal.
    pub async fn register_payment(
        &self,
        scope: i64,
        sale_id: &str,
        payment_method: &str,
        explicit_status: Option<SaleStatus>,
    ) -> Result<(), AppError> {
        let sale = self
            .sale_repo
            .find_sale_scoped(sale_id, scope)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada".to_string()))?;

        if sale.status == SaleStatus::Cancelado {
            return Err(AppError::SaleAlreadyCancelled);
        }
        if explicit_status == Some(SaleStatus::Cancelado) {
            return Err(AppError::InvalidInput(
                "Use o endpoint de cancelamento.".to_string(),
            ));
        }

        let status = explicit_status.unwrap_or_else(|| SaleStatus::from_payment_method(payment_method));
        self.sale_repo
            .update_payment(sale_id, scope, payment_method, status)
            .await
    }

    /// Host não enxerga vendas; proprietário e vendedores veem todas as
    /// vendas do mesmo escopo, com os itens anexados.
    pub async fn list_sales(&self, user: &CurrentUser) -> Result<Vec<SaleWithItems>, AppError> {
        if user.role == Role::Host {
            return Ok(Vec::new());
        }

        let sales = self.sale_repo.list_sales(user.scope()).await?;
        let mut result = Vec::with_capacity(sales.len());
        for sale in sales {
            let items = self
                .sale_repo
                .items_for_display(&sale.id, user.scope())
                .await?;
            result.push(SaleWithItems { sale, items });
        }
        Ok(result)
    }

    pub async fn sale_items(
        &self,
        scope: i64,
        sale_id: &str,
    ) -> Result<Vec<SaleItemDetail>, AppError> {
        self.sale_repo.items_for_display(sale_id, scope).await
    }

    pub async fn update_delivered_products(
        &self,
        scope: i64,
        sale_id: &str,
        delivered_products: &serde_json::Value,
    ) -> Result<(), AppError> {
        self.sale_repo
            .update_delivered_products(sale_id, scope, &delivered_products.to_string())
            .await
    }

    pub async fn stats_summary(&self, scope: i64) -> Result<SalesStats, AppError> {
        self.sale_repo
            .stats_summary(scope, &time::today_start(), &time::week_ago())
            .await
    }

    #[cfg(test)]
    pub(crate) async fn find_sale_for_test(
        &self,
        id: &str,
    ) -> Result<Option<crate::models::sales::Sale>, AppError> {
        self.sale_repo.find_sale(&self.pool, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepository;
    use crate::models::catalog::ProductInput;
    use crate::models::sales::SaleItemInput;
    use sqlx::sqlite::SqlitePoolOptions;

    struct Fixture {
        service: SaleService,
        catalog: CatalogRepository,
        pool: SqlitePool,
        owner: CurrentUser,
        seller_a: CurrentUser,
        seller_b: CurrentUser,
        product_id: i64,
    }

    async fn fixture() -> Fixture {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();

        let users = UserRepository::new(pool.clone());
        let owner_id = users.create_owner("loja", "hash").await.unwrap();
        let a_id = users.create_seller("vend_a", "hash", owner_id).await.unwrap();
        let b_id = users.create_seller("vend_b", "hash", owner_id).await.unwrap();

        let catalog = CatalogRepository::new(pool.clone());
        let product_id = catalog
            .create_product(
                owner_id,
                &ProductInput {
                    name: "Algicida 1L".to_string(),
                    brand: "HidroAzul".to_string(),
                    weight: "1L".to_string(),
                    cost_price: 15.0,
                    sale_price: 29.9,
                    stock: 10,
                    low_stock_alert: 2,
                },
            )
            .await
            .unwrap();

        let service = SaleService::new(
            pool.clone(),
            SaleRepository::new(pool.clone()),
            catalog.clone(),
        );

        let user = |id: i64, username: &str, role: Role| CurrentUser {
            id,
            username: username.to_string(),
            role,
            owner_id,
        };

        Fixture {
            service,
            catalog,
            pool,
            owner: user(owner_id, "loja", Role::Proprietario),
            seller_a: user(a_id, "vend_a", Role::Vendedor),
            seller_b: user(b_id, "vend_b", Role::Vendedor),
            product_id,
        }
    }

    fn payload(product_id: i64, qty: i64, payment_method: &str) -> CreateSalePayload {
        CreateSalePayload {
            items: vec![SaleItemInput {
                product_id,
                qty,
                unit_price: 10.0,
                cost_at_sale: None,
            }],
            total: 10.0 * qty as f64,
            discount: 0.0,
            payment_method: Some(payment_method.to_string()),
            seller_name: None,
            internal_use: false,
            client_id: None,
        }
    }

    async fn stock_of(f: &Fixture) -> i64 {
        f.catalog
            .find_product(&f.pool, f.product_id, f.owner.id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn venda_em_dinheiro_sai_paga_e_baixa_estoque() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.seller_a, &payload(f.product_id, 2, "dinheiro"))
            .await
            .unwrap();

        let sale = f.service.find_sale_for_test(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Pago);
        assert_eq!(sale.seller_id, Some(f.seller_a.id));
        assert_eq!(sale.owner_id, f.owner.id);
        assert_eq!(stock_of(&f).await, 8);
    }

    #[tokio::test]
    async fn resumo_de_loja_sem_vendas_retorna_zeros() {
        let f = fixture().await;
        let stats = f.service.stats_summary(f.owner.id).await.unwrap();
        assert_eq!(stats, SalesStats::default());
    }

    #[tokio::test]
    async fn venda_pendente_so_conta_depois_do_pagamento() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.owner, &payload(f.product_id, 1, "pendente"))
            .await
            .unwrap();

        let sale = f.service.find_sale_for_test(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::NaoPago);

        let stats = f.service.stats_summary(f.owner.id).await.unwrap();
        assert_eq!(stats.hoje_qtd, 0);

        f.service
            .register_payment(f.owner.id, &sale_id, "pix", None)
            .await
            .unwrap();

        let sale = f.service.find_sale_for_test(&sale_id).await.unwrap().unwrap();
        assert_eq!(sale.status, SaleStatus::Pago);

        let stats = f.service.stats_summary(f.owner.id).await.unwrap();
        assert_eq!(stats.hoje_qtd, 1);
        assert_eq!(stats.hoje_valor, 10.0);
    }

    #[tokio::test]
    async fn cancelamento_devolve_estoque_e_e_idempotente() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.seller_a, &payload(f.product_id, 3, "dinheiro"))
            .await
            .unwrap();
        assert_eq!(stock_of(&f).await, 7);

        let outcome = f.service.cancel_sale(&f.seller_a, &sale_id).await.unwrap();
        assert!(!outcome.already_cancelled);
        assert_eq!(outcome.restored_items, 1);
        assert_eq!(stock_of(&f).await, 10);

        // segundo cancelamento: sucesso, sem nova devolução
        let outcome = f.service.cancel_sale(&f.seller_a, &sale_id).await.unwrap();
        assert!(outcome.already_cancelled);
        assert_eq!(stock_of(&f).await, 10);
    }

    #[tokio::test]
    async fn vendedor_nao_cancela_venda_de_colega() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.seller_a, &payload(f.product_id, 1, "pix"))
            .await
            .unwrap();

        let err = f.service.cancel_sale(&f.seller_b, &sale_id).await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));
        assert_eq!(stock_of(&f).await, 9);
    }

    #[tokio::test]
    async fn proprietario_nao_cancela_venda_de_outra_loja() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.owner, &payload(f.product_id, 1, "pix"))
            .await
            .unwrap();

        let outro = CurrentUser {
            id: f.owner.id + 100,
            username: "outra_loja".to_string(),
            role: Role::Proprietario,
            owner_id: f.owner.id + 100,
        };
        let err = f.service.cancel_sale(&outro, &sale_id).await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn host_nao_cancela_vendas() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.owner, &payload(f.product_id, 1, "pix"))
            .await
            .unwrap();

        let host = CurrentUser {
            id: 999,
            username: "host".to_string(),
            role: Role::Host,
            owner_id: 999,
        };
        let err = f.service.cancel_sale(&host, &sale_id).await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn carrinho_vazio_e_rejeitado() {
        let f = fixture().await;
        let mut p = payload(f.product_id, 1, "dinheiro");
        p.items.clear();
        let err = f.service.create_sale(&f.owner, &p).await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn estoque_insuficiente_desfaz_a_venda_inteira() {
        let f = fixture().await;
        let err = f
            .service
            .create_sale(&f.owner, &payload(f.product_id, 11, "dinheiro"))
            .await;
        assert!(matches!(err, Err(AppError::InsufficientStock(_))));

        // nada ficou para trás: nem cabeçalho, nem baixa de estoque
        assert_eq!(stock_of(&f).await, 10);
        assert!(f.service.list_sales(&f.owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reenvio_offline_com_client_id_nao_duplica() {
        let f = fixture().await;
        let mut p = payload(f.product_id, 2, "dinheiro");
        p.client_id = Some(uuid::Uuid::new_v4());

        let primeiro = f.service.create_sale(&f.owner, &p).await.unwrap();
        let segundo = f.service.create_sale(&f.owner, &p).await.unwrap();

        assert_eq!(primeiro, segundo);
        assert_eq!(stock_of(&f).await, 8);
        assert_eq!(f.service.list_sales(&f.owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn vendas_sao_visiveis_entre_vendedores_da_mesma_loja() {
        let f = fixture().await;
        f.service
            .create_sale(&f.seller_a, &payload(f.product_id, 1, "pix"))
            .await
            .unwrap();

        let vistas_por_b = f.service.list_sales(&f.seller_b).await.unwrap();
        assert_eq!(vistas_por_b.len(), 1);
        assert_eq!(vistas_por_b[0].items.len(), 1);
        assert_eq!(
            vistas_por_b[0].items[0].product_name.as_deref(),
            Some("Algicida 1L")
        );

        // host não vê vendas de loja nenhuma
        let host = CurrentUser {
            id: 999,
            username: "host".to_string(),
            role: Role::Host,
            owner_id: 999,
        };
        assert!(f.service.list_sales(&host).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn estatisticas_excluem_canceladas_pendentes_e_uso_interno() {
        let f = fixture().await;

        // paga e depois cancelada: fora
        let cancelada = f
            .service
            .create_sale(&f.owner, &payload(f.product_id, 1, "dinheiro"))
            .await
            .unwrap();
        f.service.cancel_sale(&f.owner, &cancelada).await.unwrap();

        // pendente: fora
        f.service
            .create_sale(&f.owner, &payload(f.product_id, 1, "pendente"))
            .await
            .unwrap();

        // uso interno: fora
        let mut interna = payload(f.product_id, 1, "dinheiro");
        interna.internal_use = true;
        f.service.create_sale(&f.owner, &interna).await.unwrap();

        // paga normal: dentro
        f.service
            .create_sale(&f.owner, &payload(f.product_id, 2, "cartao_credito"))
            .await
            .unwrap();

        let stats = f.service.stats_summary(f.owner.id).await.unwrap();
        assert_eq!(stats.hoje_qtd, 1);
        assert_eq!(stats.hoje_valor, 20.0);
    }

    #[tokio::test]
    async fn pagamento_de_venda_cancelada_e_rejeitado() {
        let f = fixture().await;
        let sale_id = f
            .service
            .create_sale(&f.owner, &payload(f.product_id, 1, "pendente"))
            .await
            .unwrap();
        f.service.cancel_sale(&f.owner, &sale_id).await.unwrap();

        let err = f
            .service
            .register_payment(f.owner.id, &sale_id, "pix", None)
            .await;
        assert!(matches!(err, Err(AppError::SaleAlreadyCancelled)));
    }
}
