// src/db/user_repo.rs

use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    models::auth::{Role, SellerDisplay, User, UserSummary},
};

// O repositório de usuários, responsável por todas as interações com a
// tabela 'users' (contas host, proprietários e vendedores).
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// owner_id persistido de um usuário; usado pelo resolver de identidade
    /// para corrigir tokens de vendedor emitidos sem o vínculo.
    pub async fn owner_id_of(&self, id: i64) -> Result<Option<i64>, AppError> {
        let row: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT owner_id FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(owner_id,)| owner_id))
    }

    /// Normaliza o vínculo de dono após o login: host e proprietário são
    /// donos de si mesmos, e a correção é persistida.
    pub async fn persist_self_ownership(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET owner_id = ? WHERE id = ?")
            .bind(id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn host_exists(&self) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE role = 'host'")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create_host(&self, username: &str, password_hash: &str) -> Result<i64, AppError> {
        let result = sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, 'host')")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    // ---
    // Proprietários
    // ---

    pub async fn list_owners(&self) -> Result<Vec<UserSummary>, AppError> {
        let owners = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, role, owner_id FROM users WHERE role = 'proprietario' ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(owners)
    }

    pub async fn find_owner(&self, id: i64) -> Result<Option<UserSummary>, AppError> {
        let owner = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, role, owner_id FROM users WHERE id = ? AND role = 'proprietario'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(owner)
    }

    /// Cria um proprietário já dono de si mesmo (owner_id = id), numa única
    /// transação.
    pub async fn create_owner(&self, username: &str, password_hash: &str) -> Result<i64, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO users (username, password, role) VALUES (?, ?, 'proprietario')",
        )
        .bind(username)
        .bind(password_hash)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::UsernameAlreadyExists(username.to_string());
                }
            }
            e.into()
        })?;

        let new_id = result.last_insert_rowid();
        sqlx::query("UPDATE users SET owner_id = ? WHERE id = ?")
            .bind(new_id)
            .bind(new_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(new_id)
    }

    /// Atualiza username e/ou senha. A checagem de papel fica na cláusula
    /// WHERE: isolamento também na camada de escrita.
    pub async fn update_credentials(
        &self,
        id: i64,
        role: Role,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<(), AppError> {
        let result = match (username, password_hash) {
            (Some(u), Some(p)) => {
                sqlx::query("UPDATE users SET username = ?, password = ? WHERE id = ? AND role = ?")
                    .bind(u)
                    .bind(p)
                    .bind(id)
                    .bind(role)
                    .execute(&self.pool)
                    .await?
            }
            (Some(u), None) => {
                sqlx::query("UPDATE users SET username = ? WHERE id = ? AND role = ?")
                    .bind(u)
                    .bind(id)
                    .bind(role)
                    .execute(&self.pool)
                    .await?
            }
            (None, Some(p)) => {
                sqlx::query("UPDATE users SET password = ? WHERE id = ? AND role = ?")
                    .bind(p)
                    .bind(id)
                    .bind(role)
                    .execute(&self.pool)
                    .await?
            }
            (None, None) => {
                return Err(AppError::InvalidInput("Nada para atualizar".to_string()));
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }
        Ok(())
    }

    /// Exclui um proprietário e, em cascata, todos os seus vendedores.
    /// Tudo na mesma transação: ou some a loja inteira, ou nada.
    pub async fn delete_owner(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM users WHERE owner_id = ? AND role = 'vendedor'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'proprietario'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Proprietário não encontrado".to_string(),
            ));
        }

        tx.commit().await?;
        Ok(())
    }

    // ---
    // Vendedores
    // ---

    pub async fn list_all_sellers(&self) -> Result<Vec<UserSummary>, AppError> {
        let sellers = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, role, owner_id FROM users WHERE role = 'vendedor' ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sellers)
    }

    pub async fn list_sellers_by_owner(&self, owner_id: i64) -> Result<Vec<UserSummary>, AppError> {
        let sellers = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, role, owner_id FROM users WHERE role = 'vendedor' AND owner_id = ? ORDER BY username ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sellers)
    }

    pub async fn find_seller(&self, id: i64) -> Result<Option<User>, AppError> {
        let seller = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ? AND role = 'vendedor'",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(seller)
    }

    /// Cria um vendedor vinculado a um proprietário. A unicidade de username
    /// vale para o namespace inteiro de vendedores (simplificação herdada e
    /// mantida de propósito).
    pub async fn create_seller(
        &self,
        username: &str,
        password_hash: &str,
        owner_id: i64,
    ) -> Result<i64, AppError> {
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = ? AND role = 'vendedor'")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_some() {
            return Err(AppError::UsernameAlreadyExists(username.to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO users (username, password, role, owner_id) VALUES (?, ?, 'vendedor', ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(owner_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::UsernameAlreadyExists(username.to_string());
                }
            }
            e.into()
        })?;

        Ok(result.last_insert_rowid())
    }

    pub async fn delete_seller(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ? AND role = 'vendedor'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vendedor não encontrado".to_string()));
        }
        Ok(())
    }

    /// Visão derivada para o dropdown do caixa: o proprietário seguido dos
    /// vendedores da loja. Substitui a antiga tabela paralela de exibição.
    pub async fn seller_display_list(&self, owner_id: i64) -> Result<Vec<SellerDisplay>, AppError> {
        let mut result = Vec::new();

        let owner = sqlx::query_as::<_, SellerDisplay>(
            "SELECT id, username AS nome, role FROM users WHERE id = ? AND role = 'proprietario'",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        if let Some(owner) = owner {
            result.push(owner);
        }

        let sellers = sqlx::query_as::<_, SellerDisplay>(
            "SELECT id, username AS nome, role FROM users WHERE owner_id = ? AND role = 'vendedor' ORDER BY username ASC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        result.extend(sellers);

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn proprietario_criado_e_dono_de_si_mesmo() {
        let repo = UserRepository::new(test_pool().await);
        let id = repo.create_owner("loja_a", "hash").await.unwrap();
        let owner = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(owner.owner_id, Some(id));
        assert_eq!(owner.role, Role::Proprietario);
    }

    #[tokio::test]
    async fn excluir_proprietario_remove_vendedores_em_cascata() {
        let repo = UserRepository::new(test_pool().await);
        let owner_id = repo.create_owner("loja_b", "hash").await.unwrap();
        let seller_id = repo.create_seller("vend_b", "hash", owner_id).await.unwrap();

        repo.delete_owner(owner_id).await.unwrap();

        assert!(repo.find_by_id(owner_id).await.unwrap().is_none());
        assert!(repo.find_by_id(seller_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn username_de_vendedor_e_unico_no_namespace_inteiro() {
        let repo = UserRepository::new(test_pool().await);
        let owner_a = repo.create_owner("loja_c", "hash").await.unwrap();
        let owner_b = repo.create_owner("loja_d", "hash").await.unwrap();

        repo.create_seller("carlos", "hash", owner_a).await.unwrap();
        let err = repo.create_seller("carlos", "hash", owner_b).await;
        assert!(matches!(err, Err(AppError::UsernameAlreadyExists(_))));
    }

    #[tokio::test]
    async fn lista_de_exibicao_inclui_proprietario_e_vendedores() {
        let repo = UserRepository::new(test_pool().await);
        let owner_id = repo.create_owner("loja_e", "hash").await.unwrap();
        repo.create_seller("ana", "hash", owner_id).await.unwrap();
        repo.create_seller("bia", "hash", owner_id).await.unwrap();

        let display = repo.seller_display_list(owner_id).await.unwrap();
        assert_eq!(display.len(), 3);
        assert_eq!(display[0].nome, "loja_e");
        assert_eq!(display[0].role, Role::Proprietario);
    }
}
