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
    models::catalog::{Brand, BrandInput},
};

// Marcas de produto e marcas de piscina: mesmo formato, listas separadas.

pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Brand>>, AppError> {
    let brands = app_state.catalog_repo.list_brands(user.scope()).await?;
    Ok(Json(brands))
}

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<BrandInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let id = app_state
        .catalog_repo
        .create_brand(user.scope(), &payload)
        .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<BrandInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .catalog_repo
        .update_brand(id, user.scope(), &payload)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .catalog_repo
        .delete_brand(id, user.scope())
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn list_pool_brands(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<Brand>>, AppError> {
    let brands = app_state
        .catalog_repo
        .list_pool_brands(user.scope())
        .await?;
    Ok(Json(brands))
}

pub async fn create_pool_brand(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<BrandInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let id = app_state
        .catalog_repo
        .create_pool_brand(user.scope(), &payload)
        .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn update_pool_brand(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<BrandInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .catalog_repo
        .update_pool_brand(id, user.scope(), &payload)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn delete_pool_brand(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .catalog_repo
        .delete_pool_brand(id, user.scope())
        .await?;
    Ok(Json(json!({ "success": true })))
}
