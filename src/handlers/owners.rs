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
    models::auth::{Role, UserSummary},
    services::auth::hash_password,
};

// Administração de contas de proprietário. Criação e exclusão são
// exclusivas do host; o próprio proprietário pode trocar as credenciais.

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOwnerPayload {
    #[validate(length(min = 3, message = "O usuário precisa de ao menos 3 caracteres."))]
    pub username: String,
    #[validate(length(min = 6, message = "A senha precisa de ao menos 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCredentialsPayload {
    #[validate(length(min = 3, message = "O usuário precisa de ao menos 3 caracteres."))]
    pub username: Option<String>,
    #[validate(length(min = 6, message = "A senha precisa de ao menos 6 caracteres."))]
    pub password: Option<String>,
}

fn require_host(role: Role) -> Result<(), AppError> {
    if role != Role::Host {
        return Err(AppError::Forbidden(
            "Apenas o host administra proprietários.".to_string(),
        ));
    }
    Ok(())
}

pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    require_host(user.role)?;
    let owners = app_state.user_repo.list_owners().await?;
    Ok(Json(owners))
}

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateOwnerPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_host(user.role)?;
    payload.validate().map_err(AppError::ValidationError)?;

    let hash = hash_password(payload.password).await?;
    let id = app_state
        .user_repo
        .create_owner(&payload.username, &hash)
        .await?;

    tracing::info!("Proprietário {} criado (id {})", payload.username, id);
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn get(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<UserSummary>, AppError> {
    if user.role != Role::Host && user.id != id {
        return Err(AppError::Forbidden(
            "Você não pode consultar esta conta.".to_string(),
        ));
    }
    let owner = app_state
        .user_repo
        .find_owner(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proprietário não encontrado".to_string()))?;
    Ok(Json(owner))
}

pub async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCredentialsPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    // host edita qualquer proprietário; proprietário só a si mesmo
    if user.role != Role::Host && !(user.role == Role::Proprietario && user.id == id) {
        return Err(AppError::Forbidden(
            "Você não pode alterar esta conta.".to_string(),
        ));
    }
    payload.validate().map_err(AppError::ValidationError)?;

    let hash = match payload.password {
        Some(password) => Some(hash_password(password).await?),
        None => None,
    };

    app_state
        .user_repo
        .update_credentials(id, Role::Proprietario, payload.username.as_deref(), hash.as_deref())
        .await?;

    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_host(user.role)?;
    app_state.user_repo.delete_owner(id).await?;

    tracing::info!("Proprietário {} excluído (com seus vendedores)", id);
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::CurrentUser;
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

    fn user(role: Role, id: i64) -> CurrentUser {
        CurrentUser {
            id,
            username: "teste".to_string(),
            role,
            owner_id: id,
        }
    }

    fn payload(username: &str) -> CreateOwnerPayload {
        CreateOwnerPayload {
            username: username.to_string(),
            password: "senha123".to_string(),
        }
    }

    #[tokio::test]
    async fn apenas_o_host_cria_e_exclui_proprietarios() {
        let state = test_state().await;
        let target = state.user_repo.create_owner("loja_alvo", "hash").await.unwrap();

        for role in [Role::Proprietario, Role::Vendedor] {
            let err = create(
                State(state.clone()),
                AuthenticatedUser(user(role, 50)),
                Json(payload("loja_nova")),
            )
            .await;
            assert!(matches!(err, Err(AppError::Forbidden(_))));

            let err = delete(
                State(state.clone()),
                AuthenticatedUser(user(role, 50)),
                Path(target),
            )
            .await;
            assert!(matches!(err, Err(AppError::Forbidden(_))));
        }

        // o alvo sobreviveu às tentativas e o host consegue excluí-lo
        assert!(state.user_repo.find_owner(target).await.unwrap().is_some());
        delete(
            State(state.clone()),
            AuthenticatedUser(user(Role::Host, 1)),
            Path(target),
        )
        .await
        .unwrap();
        assert!(state.user_repo.find_owner(target).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn proprietario_so_altera_a_propria_conta() {
        let state = test_state().await;
        let a = state.user_repo.create_owner("loja_a", "hash").await.unwrap();
        let b = state.user_repo.create_owner("loja_b", "hash").await.unwrap();

        let err = update(
            State(state.clone()),
            AuthenticatedUser(user(Role::Proprietario, a)),
            Path(b),
            Json(UpdateCredentialsPayload {
                username: Some("loja_roubada".to_string()),
                password: None,
            }),
        )
        .await;
        assert!(matches!(err, Err(AppError::Forbidden(_))));

        update(
            State(state.clone()),
            AuthenticatedUser(user(Role::Proprietario, a)),
            Path(a),
            Json(UpdateCredentialsPayload {
                username: Some("loja_renomeada".to_string()),
                password: None,
            }),
        )
        .await
        .unwrap();

        let renamed = state.user_repo.find_owner(a).await.unwrap().unwrap();
        assert_eq!(renamed.username, "loja_renomeada");
    }
}
