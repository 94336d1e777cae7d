use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{CurrentUser, Role, SellerDisplay, UserSummary},
    services::auth::hash_password,
};

// Administração de vendedores. O proprietário gerencia os da própria loja;
// o host gerencia os de qualquer loja (informando owner_id na criação).

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSellerPayload {
    #[validate(length(min = 3, message = "O usuário precisa de ao menos 3 caracteres."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha precisa de ao menos 6 caracteres."))]
    pub password: String,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSellerPayload {
    #[validate(length(min = 3, message = "O usuário precisa de ao menos 3 caracteres."))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "A senha precisa de ao menos 6 caracteres."))]
    pub password: Option<String>,
}

/// Loja-alvo de uma operação de gestão de vendedores. Vendedor não
/// gerencia vendedores.
fn management_scope(user: &CurrentUser, requested: Option<i64>) -> Result<i64, AppError> {
    match user.role {
        Role::Host => requested.ok_or_else(|| {
            AppError::InvalidInput("Informe o owner_id do proprietário.".to_string())
        }),
        Role::Proprietario => Ok(user.id),
        Role::Vendedor => Err(AppError::Forbidden(
            "Vendedor não gerencia vendedores.".to_string(),
        )),
    }
}

pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let sellers = match user.role {
        Role::Host => app_state.user_repo.list_all_sellers().await?,
        _ => {
            app_state
                .user_repo
                .list_sellers_by_owner(user.scope())
                .await?
        }
    };
    Ok(Json(sellers))
}

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateSellerPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    let owner_id = management_scope(&user, payload.owner_id)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let hash = hash_password(payload.password).await?;
    let id = app_state
        .user_repo
        .create_seller(&payload.username, &hash, owner_id)
        .await?;

    tracing::info!(
        "Vendedor {} criado (id {}, loja {})",
        payload.username,
        id,
        owner_id
    );
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSellerPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    if user.role == Role::Vendedor {
        return Err(AppError::Forbidden(
            "Vendedor não gerencia vendedores.".to_string(),
        ));
    }
    payload.validate().map_err(AppError::ValidationError)?;

    let seller = app_state
        .user_repo
        .find_seller(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendedor não encontrado".to_string()))?;
    if user.role == Role::Proprietario && seller.owner_id != Some(user.id) {
        return Err(AppError::Forbidden(
            "Este vendedor não pertence à sua loja.".to_string(),
        ));
    }

    let hash = match payload.password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    app_state
        .user_repo
        .update_credentials(id, Role::Vendedor, payload.username.as_deref(), hash.as_deref())
        .await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    if user.role == Role::Vendedor {
        return Err(AppError::Forbidden(
            "Vendedor não gerencia vendedores.".to_string(),
        ));
    }

    let seller = app_state
        .user_repo
        .find_seller(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendedor não encontrado".to_string()))?;
    if user.role == Role::Proprietario && seller.owner_id != Some(user.id) {
        return Err(AppError::Forbidden(
            "Este vendedor não pertence à sua loja.".to_string(),
        ));
    }

    app_state.user_repo.delete_seller(id).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn by_owner(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(owner_id): Path<i64>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    if user.role != Role::Host && user.scope() != owner_id {
        return Err(AppError::Forbidden(
            "Você não pode consultar os vendedores desta loja.".to_string(),
        ));
    }
    let sellers = app_state.user_repo.list_sellers_by_owner(owner_id).await?;
    Ok(Json(sellers))
}

/// Dropdown do caixa: proprietário + vendedores da loja, derivado da
/// tabela de usuários.
pub async fn display_list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<SellerDisplay>>, AppError> {
    let list = app_state.user_repo.seller_display_list(user.scope()).await?;
    Ok(Json(list))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        AppState::with_pool(pool)
    }

    fn user(role: Role, id: i64, owner_id: i64) -> CurrentUser {
        CurrentUser {
            id,
            username: "teste".to_string(),
            role,
            owner_id,
        }
    }

    #[tokio::test]
    async fn vendedor_nao_gerencia_vendedores() {
        let state = test_state().await;
        let owner_id = state.user_repo.create_owner("loja", "hash").await.unwrap();
        let seller_id = state
            .user_repo
            .create_seller("caixa1", "hash", owner_id)
            .await
            .unwrap();
        let vendedor = user(Role::Vendedor, seller_id, owner_id);

        let err = create(
            State(state.clone()),
            AuthenticatedUser(vendedor.clone()),
            Json(CreateSellerPayload {
                username: "intruso".to_string(),
                password: "senha123".to_string(),
                owner_id: None,
            }),
        )
        .await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));

        let err = update(
            State(state.clone()),
            AuthenticatedUser(vendedor.clone()),
            Path(seller_id),
            Json(UpdateSellerPayload {
                username: Some("novo_nome".to_string()),
                password: None,
            }),
        )
        .await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));

        let err = delete(
            State(state.clone()),
            AuthenticatedUser(vendedor),
            Path(seller_id),
        )
        .await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));
        assert!(state.user_repo.find_seller(seller_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn proprietario_nao_mexe_em_vendedor_de_outra_loja() {
        let state = test_state().await;
        let loja_a = state.user_repo.create_owner("loja_a", "hash").await.unwrap();
        let loja_b = state.user_repo.create_owner("loja_b", "hash").await.unwrap();
        let seller_a = state
            .user_repo
            .create_seller("caixa_a", "hash", loja_a)
            .await
            .unwrap();
        let dona_b = user(Role::Proprietario, loja_b, loja_b);

        let err = update(
            State(state.clone()),
            AuthenticatedUser(dona_b.clone()),
            Path(seller_a),
            Json(UpdateSellerPayload {
                username: Some("sequestrado".to_string()),
                password: None,
            }),
        )
        .await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));

        let err = delete(State(state.clone()), AuthenticatedUser(dona_b), Path(seller_a)).await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));
        assert!(state.user_repo.find_seller(seller_a).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn host_cria_vendedor_informando_a_loja() {
        let state = test_state().await;
        let owner_id = state.user_repo.create_owner("loja", "hash").await.unwrap();
        let host = user(Role::Host, 1, 1);

        // sem owner_id não dá para saber a loja de destino
        let err = create(
            State(state.clone()),
            AuthenticatedUser(host.clone()),
            Json(CreateSellerPayload {
                username: "caixa_novo".to_string(),
                password: "senha123".to_string(),
                owner_id: None,
            }),
        )
        .await;
        assert!(matches!(err, Err(AppError::InvalidInput(_))));

        create(
            State(state.clone()),
            AuthenticatedUser(host),
            Json(CreateSellerPayload {
                username: "caixa_novo".to_string(),
                password: "senha123".to_string(),
                owner_id: Some(owner_id),
            }),
        )
        .await
        .unwrap();

        let sellers = state.user_repo.list_sellers_by_owner(owner_id).await.unwrap();
        assert_eq!(sellers.len(), 1);
        assert_eq!(sellers[0].username, "caixa_novo");
    }
}
