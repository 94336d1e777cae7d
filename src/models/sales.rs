// src/models/sales.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Estado de uma venda de produto.
// Máquina de estados: nao_pago|pago -> cancelado (terminal);
// nao_pago -> pago via registro de pagamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SaleStatus {
    Pago,
    NaoPago,
    Cancelado,
}

impl SaleStatus {
    /// Deriva o status inicial a partir do método de pagamento:
    /// "pendente" e uso interno entram como não pago; o resto como pago.
    pub fn from_payment_method(method: &str) -> Self {
        match method.trim().to_lowercase().as_str() {
            "pendente" | "interno" | "uso interno" => SaleStatus::NaoPago,
            _ => SaleStatus::Pago,
        }
    }
}

/// Métodos que contam como receita no resumo estatístico.
pub const REVENUE_PAYMENT_METHODS: [&str; 4] =
    ["dinheiro", "pix", "cartao_credito", "cartao_debito"];

// Cabeçalho da venda como persistido.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Sale {
    pub id: String,
    pub owner_id: i64,
    pub seller_id: Option<i64>,
    pub seller_name: String,
    pub total: f64,
    pub discount: f64,
    pub payment_method: String,
    pub status: SaleStatus,
    pub internal_use: i64,
    pub delivered_products: Option<String>,
    pub created_at: String,
}

// Venda enriquecida com seus itens, como devolvida pela listagem.
#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
}

// Item de venda com o nome do produto (LEFT JOIN para exibição; o produto
// pode ter sido excluído depois da venda).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SaleItemDetail {
    pub id: String,
    pub sale_id: String,
    pub product_id: i64,
    pub qty: i64,
    pub unit_price: f64,
    pub cost_at_sale: f64,
    pub product_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaleItemInput {
    pub product_id: i64,
    #[validate(range(min = 1, message = "Quantidade inválida."))]
    pub qty: i64,
    #[validate(range(min = 0.0, message = "Preço unitário inválido."))]
    pub unit_price: f64,
    #[serde(default)]
    pub cost_at_sale: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSalePayload {
    #[validate(nested)]
    pub items: Vec<SaleItemInput>,
    #[validate(range(min = 0.0, message = "Valor total inválido."))]
    pub total: f64,
    #[serde(default)]
    pub discount: f64,
    pub payment_method: Option<String>,
    pub seller_name: Option<String>,
    #[serde(default)]
    pub internal_use: bool,
    // Chave de deduplicação para reenvio da fila offline do cliente:
    // o mesmo client_id nunca gera duas vendas.
    #[serde(default)]
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentPayload {
    pub payment_method: String,
    #[serde(default)]
    pub status: Option<SaleStatus>,
}

#[derive(Debug, Serialize)]
pub struct CreateSaleResponse {
    pub success: bool,
    pub sale_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelSaleResponse {
    pub success: bool,
    pub message: String,
    pub restored_items: usize,
}

// Resumo de hoje / últimos 7 dias. Os nomes de campo são contrato com o
// frontend ("hojeQtd" etc.), por isso o rename.
#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub hoje_qtd: i64,
    pub hoje_valor: f64,
    pub semana_qtd: i64,
    pub semana_valor: f64,
}
