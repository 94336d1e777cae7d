use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::catalog::{Pool, PoolInput},
};

// Catálogo de piscinas (entidade estática, sem estoque).

pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Pool>>, AppError> {
    let pools = app_state.catalog_repo.list_pools(user.scope()).await?;
    Ok(Json(pools))
}

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PoolInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let id = app_state
        .catalog_repo
        .create_pool(user.scope(), &payload)
        .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<PoolInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .catalog_repo
        .update_pool(id, user.scope(), &payload)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.catalog_repo.delete_pool(id, user.scope()).await?;
    Ok(Json(json!({ "success": true })))
}
