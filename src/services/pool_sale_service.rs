// src/services/pool_sale_service.rs

use uuid::Uuid;

use crate::{
    common::{error::AppError, time},
    db::PoolSaleRepository,
    models::{
        auth::{CurrentUser, Role},
        pool_sales::{PoolSale, PoolSaleData, PoolSaleStatus},
        sales::SalesStats,
    },
};

// Vendas de piscina: ciclo de vida dirigido pelo operador
// (aguardando -> instalando -> entregue), sem efeito no estoque.
#[derive(Clone)]
pub struct PoolSaleService {
    repo: PoolSaleRepository,
}

impl PoolSaleService {
    pub fn new(repo: PoolSaleRepository) -> Self {
        Self { repo }
    }

    /// Visão de leitura: host enxerga todas as lojas, os demais só a sua.
    fn read_scope(user: &CurrentUser) -> Option<i64> {
        match user.role {
            Role::Host => None,
            _ => Some(user.scope()),
        }
    }

    pub async fn create(
        &self,
        user: &CurrentUser,
        data: &PoolSaleData,
    ) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        self.repo
            .insert(
                &id,
                user.scope(),
                user.id,
                data,
                &time::now_business_timestamp(),
            )
            .await?;
        tracing::info!("Venda de piscina {} registrada para {}", id, data.cliente);
        Ok(id)
    }

    pub async fn list(&self, user: &CurrentUser) -> Result<Vec<PoolSale>, AppError> {
        self.repo.list(Self::read_scope(user)).await
    }

    pub async fn get(&self, user: &CurrentUser, id: &str) -> Result<PoolSale, AppError> {
        self.repo
            .find(id, Self::read_scope(user))
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada".to_string()))
    }

    /// Reescreve o retrato da venda. Se o payload trouxer status, a troca
    /// passa pela mesma validação de transição do endpoint dedicado.
    pub async fn update(
        &self,
        user: &CurrentUser,
        id: &str,
        data: &PoolSaleData,
    ) -> Result<(), AppError> {
        let scope = user.scope();
        let current = self
            .repo
            .find(id, Some(scope))
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada".to_string()))?;

        let status = match data.status {
            Some(next) => {
                if !current.status.can_transition_to(next) {
                    return Err(AppError::InvalidInput(format!(
                        "Transição de status inválida: {:?} -> {:?}",
                        current.status, next
                    )));
                }
                next
            }
            None => current.status,
        };

        self.repo.update(id, scope, data, status).await
    }

    pub async fn set_status(
        &self,
        user: &CurrentUser,
        id: &str,
        next: PoolSaleStatus,
    ) -> Result<(), AppError> {
        let scope = user.scope();
        let current = self
            .repo
            .find(id, Some(scope))
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada".to_string()))?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::InvalidInput(format!(
                "Transição de status inválida: {:?} -> {:?}",
                current.status, next
            )));
        }

        self.repo.set_status(id, scope, next).await
    }

    /// Cancelamento com as mesmas regras de permissão das vendas de
    /// produto: proprietário cancela na própria loja, vendedor só as
    /// próprias vendas, host nenhuma. Idempotente.
    pub async fn cancel(&self, user: &CurrentUser, id: &str) -> Result<bool, AppError> {
        let sale = self
            .repo
            .find(id, None)
            .await?
            .ok_or_else(|| AppError::NotFound("Venda não encontrada".to_string()))?;

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

        if sale.status == PoolSaleStatus::Cancelado {
            return Ok(true);
        }
        if !sale.status.can_transition_to(PoolSaleStatus::Cancelado) {
            return Err(AppError::InvalidInput(
                "Venda entregue não pode ser cancelada.".to_string(),
            ));
        }

        self.repo
            .set_status(id, sale.owner_id, PoolSaleStatus::Cancelado)
            .await?;
        Ok(false)
    }

    pub async fn delivered_products(
        &self,
        user: &CurrentUser,
        id: &str,
    ) -> Result<serde_json::Value, AppError> {
        let sale = self.get(user, id).await?;
        let parsed = match sale.delivered_products {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("Checklist de entrega corrompido: {}", e))?,
            None => serde_json::Value::Null,
        };
        Ok(parsed)
    }

    pub async fn update_delivered_products(
        &self,
        user: &CurrentUser,
        id: &str,
        payload: &serde_json::Value,
    ) -> Result<(), AppError> {
        self.repo
            .update_delivered_products(id, user.scope(), &payload.to_string())
            .await
    }

    pub async fn stats_summary(&self, scope: i64) -> Result<SalesStats, AppError> {
        self.repo
            .stats_summary(scope, &time::today_date(), &time::week_ago_date())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::UserRepository;
    use sqlx::SqlitePool;
    use sqlx::sqlite::SqlitePoolOptions;

    struct Fixture {
        service: PoolSaleService,
        owner: CurrentUser,
        seller_a: CurrentUser,
        seller_b: CurrentUser,
        host: CurrentUser,
    }

    async fn fixture() -> Fixture {
        let pool: SqlitePool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();

        let users = UserRepository::new(pool.clone());
        let owner_id = users.create_owner("loja", "hash").await.unwrap();
        let a_id = users.create_seller("vend_a", "hash", owner_id).await.unwrap();
        let b_id = users.create_seller("vend_b", "hash", owner_id).await.unwrap();

        let user = |id: i64, username: &str, role: Role, owner_id: i64| CurrentUser {
            id,
            username: username.to_string(),
            role,
            owner_id,
        };

        Fixture {
            service: PoolSaleService::new(PoolSaleRepository::new(pool)),
            owner: user(owner_id, "loja", Role::Proprietario, owner_id),
            seller_a: user(a_id, "vend_a", Role::Vendedor, owner_id),
            seller_b: user(b_id, "vend_b", Role::Vendedor, owner_id),
            host: user(999, "host", Role::Host, 999),
        }
    }

    fn data(cliente: &str) -> PoolSaleData {
        let mut d: PoolSaleData = serde_json::from_value(serde_json::json!({
            "cliente": cliente,
            "produto": "Piscina 6x3",
        }))
        .unwrap();
        d.valor_total = 25000.0;
        d.entrada = 5000.0;
        d.data_venda = time::today_date();
        d
    }

    #[tokio::test]
    async fn fluxo_completo_ate_a_entrega() {
        let f = fixture().await;
        let id = f.service.create(&f.seller_a, &data("Maria")).await.unwrap();

        let sale = f.service.get(&f.owner, &id).await.unwrap();
        assert_eq!(sale.status, PoolSaleStatus::Aguardando);
        assert_eq!(sale.seller_id, Some(f.seller_a.id));

        f.service
            .set_status(&f.owner, &id, PoolSaleStatus::Instalando)
            .await
            .unwrap();
        f.service
            .set_status(&f.owner, &id, PoolSaleStatus::Entregue)
            .await
            .unwrap();

        // entregue é terminal
        let err = f
            .service
            .set_status(&f.owner, &id, PoolSaleStatus::Instalando)
            .await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn regressao_de_status_e_rejeitada() {
        let f = fixture().await;
        let id = f.service.create(&f.owner, &data("José")).await.unwrap();
        f.service
            .set_status(&f.owner, &id, PoolSaleStatus::Instalando)
            .await
            .unwrap();

        let err = f
            .service
            .set_status(&f.owner, &id, PoolSaleStatus::Aguardando)
            .await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn cancelamento_e_idempotente_e_respeita_permissoes() {
        let f = fixture().await;
        let id = f.service.create(&f.seller_a, &data("Ana")).await.unwrap();

        // colega não cancela
        let err = f.service.cancel(&f.seller_b, &id).await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));

        // host não cancela
        let err = f.service.cancel(&f.host, &id).await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));

        assert!(!f.service.cancel(&f.seller_a, &id).await.unwrap());
        // repetir é aceito e sinaliza que já estava cancelada
        assert!(f.service.cancel(&f.seller_a, &id).await.unwrap());
    }

    #[tokio::test]
    async fn venda_entregue_nao_cancela() {
        let f = fixture().await;
        let id = f.service.create(&f.owner, &data("Paulo")).await.unwrap();
        f.service
            .set_status(&f.owner, &id, PoolSaleStatus::Entregue)
            .await
            .unwrap();

        let err = f.service.cancel(&f.owner, &id).await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn host_ve_todas_as_lojas() {
        let f = fixture().await;
        f.service.create(&f.owner, &data("Clara")).await.unwrap();

        assert_eq!(f.service.list(&f.host).await.unwrap().len(), 1);
        assert_eq!(f.service.list(&f.owner).await.unwrap().len(), 1);

        // outra loja não enxerga
        let outra = CurrentUser {
            id: 777,
            username: "outra".to_string(),
            role: Role::Proprietario,
            owner_id: 777,
        };
        assert!(f.service.list(&outra).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn resumo_de_loja_sem_vendas_retorna_zeros() {
        let f = fixture().await;
        let stats = f.service.stats_summary(f.owner.id).await.unwrap();
        assert_eq!(stats, SalesStats::default());
    }

    #[tokio::test]
    async fn estatisticas_somam_a_entrada_e_ignoram_canceladas() {
        let f = fixture().await;
        f.service.create(&f.owner, &data("Rita")).await.unwrap();
        let cancelada = f.service.create(&f.owner, &data("Caio")).await.unwrap();
        f.service.cancel(&f.owner, &cancelada).await.unwrap();

        let stats = f.service.stats_summary(f.owner.id).await.unwrap();
        assert_eq!(stats.hoje_qtd, 1);
        assert_eq!(stats.hoje_valor, 5000.0);
        assert_eq!(stats.semana_qtd, 1);
    }

    #[tokio::test]
    async fn checklist_de_entrega_vai_e_volta() {
        let f = fixture().await;
        let id = f.service.create(&f.owner, &data("Léo")).await.unwrap();

        assert_eq!(
            f.service.delivered_products(&f.owner, &id).await.unwrap(),
            serde_json::Value::Null
        );

        let checklist = serde_json::json!({
            "products": [{"nome": "Casa de máquinas", "entregue": true}],
            "observacaoGeral": "Entrega parcial"
        });
        f.service
            .update_delivered_products(&f.owner, &id, &checklist)
            .await
            .unwrap();

        assert_eq!(
            f.service.delivered_products(&f.owner, &id).await.unwrap(),
            checklist
        );
    }
}
