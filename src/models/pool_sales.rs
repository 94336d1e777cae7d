// src/models/pool_sales.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

// Estado da venda de piscina, dirigido pelo operador:
// aguardando -> instalando -> entregue; cancelado a partir de qualquer
// estado não terminal. entregue e cancelado são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PoolSaleStatus {
    Aguardando,
    Instalando,
    Entregue,
    Cancelado,
}

impl PoolSaleStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PoolSaleStatus::Entregue | PoolSaleStatus::Cancelado)
    }

    /// Transições permitidas. Repetir o estado atual é um no-op aceito;
    /// pular "instalando" é permitido (entrega sem acompanhamento).
    pub fn can_transition_to(self, next: PoolSaleStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match self {
            // aguardando aceita qualquer próximo estado; instalando não volta
            PoolSaleStatus::Aguardando => true,
            _ => matches!(next, PoolSaleStatus::Entregue | PoolSaleStatus::Cancelado),
        }
    }
}

impl Default for PoolSaleStatus {
    fn default() -> Self {
        PoolSaleStatus::Aguardando
    }
}

// Venda de piscina persistida. Os dados de cliente/produto/pagamento são um
// retrato desnormalizado tirado no momento da venda, de propósito: o
// catálogo pode mudar depois sem reescrever o histórico.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PoolSale {
    pub id: String,
    pub owner_id: i64,
    pub seller_id: Option<i64>,
    pub cliente: String,
    pub cpf: String,
    pub rg: String,
    pub telefone: String,
    pub endereco: String,
    pub numero_casa: String,
    pub referencia: String,
    pub cep: String,
    pub bairro: String,
    pub cidade: String,
    pub produto: String,
    pub marca: String,
    pub garantia_fabrica: String,
    pub garantia_3_meses: String,
    pub garantia_12_meses: String,
    pub produtos_inclusos: String,
    pub obs_incluso: String,
    pub observacoes_pagamento: String,
    pub cor: String,
    pub pastilha: String,
    pub tipo_pastilha: String,
    pub valor_total: f64,
    pub entrada: f64,
    pub vendedor: String,
    pub instalador: String,
    pub pagamento: String,
    pub observacoes: String,
    pub prazo_entrega: String,
    pub data_venda: String,
    pub status: PoolSaleStatus,
    pub delivered_products: Option<String>,
    pub created_at: String,
}

// Payload de criação/atualização (mesmo formato nos dois casos).
#[derive(Debug, Deserialize, Validate)]
pub struct PoolSaleData {
    #[validate(length(min = 1, message = "O nome do cliente é obrigatório."))]
    pub cliente: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub rg: String,
    #[serde(default)]
    pub telefone: String,
    #[serde(default)]
    pub endereco: String,
    #[serde(default)]
    pub numero_casa: String,
    #[serde(default)]
    pub referencia: String,
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub bairro: String,
    #[serde(default)]
    pub cidade: String,
    #[validate(length(min = 1, message = "O produto é obrigatório."))]
    pub produto: String,
    #[serde(default)]
    pub marca: String,
    #[serde(default)]
    pub garantia_fabrica: String,
    #[serde(default)]
    pub garantia_3_meses: String,
    #[serde(default)]
    pub garantia_12_meses: String,
    #[serde(default)]
    pub produtos_inclusos: String,
    #[serde(default)]
    pub obs_incluso: String,
    #[serde(default)]
    pub observacoes_pagamento: String,
    #[serde(default)]
    pub cor: String,
    #[serde(default)]
    pub pastilha: String,
    #[serde(default)]
    pub tipo_pastilha: String,
    #[serde(default)]
    pub valor_total: f64,
    #[serde(default)]
    pub entrada: f64,
    #[serde(default)]
    pub vendedor: String,
    #[serde(default)]
    pub instalador: String,
    #[serde(default)]
    pub pagamento: String,
    #[serde(default)]
    pub observacoes: String,
    #[serde(default)]
    pub prazo_entrega: String,
    #[serde(default)]
    pub data_venda: String,
    #[serde(default)]
    pub status: Option<PoolSaleStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: PoolSaleStatus,
}

#[cfg(test)]
mod tests {
    use super::PoolSaleStatus::*;

    #[test]
    fn fluxo_normal_de_entrega() {
        assert!(Aguardando.can_transition_to(Instalando));
        assert!(Instalando.can_transition_to(Entregue));
        assert!(Aguardando.can_transition_to(Entregue));
    }

    #[test]
    fn cancelamento_apenas_de_estados_nao_terminais() {
        assert!(Aguardando.can_transition_to(Cancelado));
        assert!(Instalando.can_transition_to(Cancelado));
        assert!(!Entregue.can_transition_to(Cancelado));
    }

    #[test]
    fn estados_terminais_nao_saem() {
        assert!(!Cancelado.can_transition_to(Aguardando));
        assert!(!Cancelado.can_transition_to(Instalando));
        assert!(!Entregue.can_transition_to(Instalando));
    }

    #[test]
    fn repetir_o_estado_atual_e_no_op() {
        assert!(Instalando.can_transition_to(Instalando));
    }
}
