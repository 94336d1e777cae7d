use axum::{Json, extract::State};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{LoginPayload, LoginResponse},
};

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(response))
}

// Handler da rota protegida /me: devolve o usuário do token, já com o
// owner_id normalizado.
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": user.id,
        "username": user.username,
        "role": user.role,
        "owner_id": user.scope(),
    }))
}

// Usada pelo frontend para validar o token guardado antes de restaurar a
// sessão.
pub async fn validate(AuthenticatedUser(_user): AuthenticatedUser) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "valid": true }))
}
