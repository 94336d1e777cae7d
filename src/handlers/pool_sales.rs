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
    models::{
        pool_sales::{PoolSale, PoolSaleData, UpdateStatusPayload},
        sales::SalesStats,
    },
};

// Vendas de piscina: criação, retrato completo, ciclo de status e
// checklist de entrega.

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<PoolSaleData>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let id = app_state.pool_sale_service.create(&user, &payload).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<PoolSale>>, AppError> {
    let sales = app_state.pool_sale_service.list(&user).await?;
    Ok(Json(sales))
}

pub async fn get(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<PoolSale>, AppError> {
    let sale = app_state.pool_sale_service.get(&user, &id).await?;
    Ok(Json(sale))
}

pub async fn update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<PoolSaleData>,
) -> Result<Json<serde_json::Value>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    app_state
        .pool_sale_service
        .update(&user, &id, &payload)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn set_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .pool_sale_service
        .set_status(&user, &id, payload.status)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn cancel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let already_cancelled = app_state.pool_sale_service.cancel(&user, &id).await?;

    let message = if already_cancelled {
        "Venda já estava cancelada."
    } else {
        "Venda cancelada."
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

pub async fn delivered_products(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let checklist = app_state
        .pool_sale_service
        .delivered_products(&user, &id)
        .await?;
    Ok(Json(checklist))
}

pub async fn update_delivered_products(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .pool_sale_service
        .update_delivered_products(&user, &id, &payload)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn stats(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<SalesStats>, AppError> {
    let stats = app_state
        .pool_sale_service
        .stats_summary(user.scope())
        .await?;
    Ok(Json(stats))
}
