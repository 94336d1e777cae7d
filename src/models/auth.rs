// src/models/auth.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

// Papéis do sistema. host administra proprietários; proprietário administra
// a própria loja; vendedor opera o caixa da loja do seu proprietário.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Host,
    Proprietario,
    Vendedor,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password: String,

    pub role: Role,
    pub owner_id: Option<i64>,
}

// Projeção pública de um usuário (sem o hash de senha), usada nas listagens
// de proprietários e vendedores.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub owner_id: Option<i64>,
}

// Usuário autenticado da requisição corrente, já com owner_id normalizado
// pelo resolver de identidade. É a ÚNICA fonte do escopo de tenant.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub owner_id: i64,
}

impl CurrentUser {
    /// Regra de escopo centralizada: host e proprietário são donos de si
    /// mesmos; vendedor herda o escopo do seu proprietário. Nenhum handler
    /// recalcula isso por conta própria.
    pub fn scope(&self) -> i64 {
        match self.role {
            Role::Host | Role::Proprietario => self.id,
            Role::Vendedor => self.owner_id,
        }
    }
}

// Entrada da lista de exibição de vendedores do caixa (proprietário +
// vendedores, visão derivada da tabela users).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SellerDisplay {
    pub id: i64,
    pub nome: String,
    pub role: Role,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub owner_id: Option<i64>,
    pub exp: usize,
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(length(min = 1, message = "Usuário e senha são obrigatórios."))]
    pub username: String,
    #[validate(length(min = 1, message = "Usuário e senha são obrigatórios."))]
    pub password: String,
}

// Resposta de autenticação com o token e os dados que o frontend precisa
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub owner_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, id: i64, owner_id: i64) -> CurrentUser {
        CurrentUser {
            id,
            username: "teste".into(),
            role,
            owner_id,
        }
    }

    #[test]
    fn host_e_proprietario_sao_donos_de_si() {
        assert_eq!(user(Role::Host, 1, 99).scope(), 1);
        assert_eq!(user(Role::Proprietario, 7, 99).scope(), 7);
    }

    #[test]
    fn vendedor_herda_escopo_do_proprietario() {
        assert_eq!(user(Role::Vendedor, 12, 5).scope(), 5);
    }
}
