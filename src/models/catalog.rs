// src/models/catalog.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

// Produto de prateleira (químicos, acessórios...). Único item de catálogo
// cujo estoque é movimentado pelas vendas.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub brand: String,
    pub weight: String,
    pub cost_price: f64,
    pub sale_price: f64,
    pub stock: i64,
    pub low_stock_alert: i64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub owner_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, message = "A marca é obrigatória."))]
    pub brand: String,
    #[serde(default)]
    pub weight: String,
    #[validate(range(min = 0.0, message = "O preço de custo não pode ser negativo."))]
    pub cost_price: f64,
    #[validate(range(min = 0.0, message = "O preço de venda não pode ser negativo."))]
    pub sale_price: f64,
    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    pub stock: i64,
    #[serde(default)]
    pub low_stock_alert: i64,
}

// Piscina do catálogo: entidade estática, nunca movimentada por vendas.
// Quatro variantes de custo e de preço (base / branca / pastilha / ambas).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Pool {
    pub id: i64,
    pub model: String,
    pub brand: String,
    pub length: f64,
    pub width: f64,
    pub depth: f64,
    pub cost_price: f64,
    pub cost_white: f64,
    pub cost_with_tile: f64,
    pub cost_white_with_tile: f64,
    pub sale_price: f64,
    pub sale_white: f64,
    pub sale_with_tile: f64,
    pub sale_white_with_tile: f64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub owner_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PoolInput {
    #[validate(length(min = 1, message = "Modelo e marca são obrigatórios."))]
    pub model: String,
    #[validate(length(min = 1, message = "Modelo e marca são obrigatórios."))]
    pub brand: String,
    #[serde(default)]
    pub length: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub depth: f64,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub cost_white: f64,
    #[serde(default)]
    pub cost_with_tile: f64,
    #[serde(default)]
    pub cost_white_with_tile: f64,
    #[serde(default)]
    pub sale_price: f64,
    #[serde(default)]
    pub sale_white: f64,
    #[serde(default)]
    pub sale_with_tile: f64,
    #[serde(default)]
    pub sale_white_with_tile: f64,
}

// Listas de referência por proprietário: marcas de produto, marcas de
// piscina e instaladores. Mesmo formato de linha para as duas marcas.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub supplier: String,
    pub owner_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BrandInput {
    #[validate(length(min = 1, message = "Nome inválido"))]
    pub name: String,
    #[serde(default)]
    pub supplier: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Installer {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub owner_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InstallerInput {
    #[validate(length(min = 1, message = "Nome inválido"))]
    pub name: String,
    #[serde(default)]
    pub contact: String,
}
