// src/services/auth.rs

use bcrypt::verify;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{Claims, CurrentUser, LoginResponse, Role, User},
};

// Resolver de identidade e escopo: emite e valida o token e garante que
// todo usuário autenticado chega aos handlers com owner_id normalizado.
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
}

/// Hash de bcrypt fora do executor async (a operação é cara de propósito).
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hash de senha: {}", e))?
        .map_err(AppError::from)
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String) -> Self {
        Self {
            user_repo,
            jwt_secret,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash = user.password.clone();

        // Verificação de bcrypt é pesada; vai para uma thread de bloqueio.
        let is_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }

        // Corrige o owner_id conforme o papel e persiste a correção:
        // host e proprietário são donos de si mesmos.
        let owner_id = match user.role {
            Role::Host | Role::Proprietario => {
                self.user_repo.persist_self_ownership(user.id).await?;
                user.id
            }
            Role::Vendedor => user.owner_id.unwrap_or(0),
        };

        let token = self.create_token(&user, owner_id)?;

        Ok(LoginResponse {
            token,
            id: user.id,
            username: user.username,
            role: user.role,
            owner_id,
        })
    }

    /// Valida o token e re-deriva o owner_id defensivamente: o token pode
    /// ter sido emitido antes de uma correção de vínculo no banco.
    pub async fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let claims = token_data.claims;

        let owner_id = match claims.role {
            Role::Host => claims.id,
            Role::Proprietario => claims.owner_id.unwrap_or(claims.id),
            Role::Vendedor => match claims.owner_id {
                Some(owner_id) => owner_id,
                None => self
                    .user_repo
                    .owner_id_of(claims.id)
                    .await?
                    .unwrap_or(0),
            },
        };

        Ok(CurrentUser {
            id: claims.id,
            username: claims.username,
            role: claims.role,
            owner_id,
        })
    }

    fn create_token(&self, user: &User, owner_id: i64) -> Result<String, AppError> {
        let expires_at = Utc::now() + chrono::Duration::hours(8);

        let claims = Claims {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            owner_id: Some(owner_id),
            exp: expires_at.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bcrypt::hash;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn service_with_users() -> AuthService {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();

        let repo = UserRepository::new(pool);
        let hash = hash("senha123", 4).unwrap();
        let owner_id = repo.create_owner("dona_loja", &hash).await.unwrap();
        repo.create_seller("caixa1", &hash, owner_id).await.unwrap();

        AuthService::new(repo, "segredo_de_teste".to_string())
    }

    #[tokio::test]
    async fn login_devolve_token_e_escopo_do_proprietario() {
        let service = service_with_users().await;
        let resp = service.login("dona_loja", "senha123").await.unwrap();

        assert_eq!(resp.role, Role::Proprietario);
        assert_eq!(resp.owner_id, resp.id);

        let user = service.validate_token(&resp.token).await.unwrap();
        assert_eq!(user.id, resp.id);
        assert_eq!(user.scope(), resp.id);
    }

    #[tokio::test]
    async fn login_de_vendedor_herda_escopo() {
        let service = service_with_users().await;
        let dono = service.login("dona_loja", "senha123").await.unwrap();
        let resp = service.login("caixa1", "senha123").await.unwrap();

        assert_eq!(resp.role, Role::Vendedor);
        assert_eq!(resp.owner_id, dono.id);

        let user = service.validate_token(&resp.token).await.unwrap();
        assert_eq!(user.scope(), dono.id);
    }

    #[tokio::test]
    async fn senha_errada_e_unauthorized() {
        let service = service_with_users().await;
        let err = service.login("dona_loja", "errada").await;
        assert!(matches!(err, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn token_invalido_e_forbidden() {
        let service = service_with_users().await;
        let err = service.validate_token("lixo.token.invalido").await;
        assert!(matches!(err, Err(AppError::InvalidToken)));
    }
}
