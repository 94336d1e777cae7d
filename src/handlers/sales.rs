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
    models::sales::{
        CancelSaleResponse, CreateSalePayload, CreateSaleResponse, SaleItemDetail, SaleWithItems,
        SalesStats, UpdatePaymentPayload,
    },
};

// Vendas de produto. Toda a lógica transacional mora no SaleService; aqui
// só entra validação de payload e formato de resposta.

pub async fn create(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateSalePayload>,
) -> Result<Json<CreateSaleResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let sale_id = app_state.sale_service.create_sale(&user, &payload).await?;
    Ok(Json(CreateSaleResponse {
        success: true,
        sale_id,
    }))
}

pub async fn list(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<SaleWithItems>>, AppError> {
    let sales = app_state.sale_service.list_sales(&user).await?;
    Ok(Json(sales))
}

pub async fn items(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<SaleItemDetail>>, AppError> {
    let items = app_state.sale_service.sale_items(user.scope(), &id).await?;
    Ok(Json(items))
}

pub async fn cancel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<CancelSaleResponse>, AppError> {
    let outcome = app_state.sale_service.cancel_sale(&user, &id).await?;

    let message = if outcome.already_cancelled {
        "Venda já estava cancelada.".to_string()
    } else {
        "Venda cancelada e estoque devolvido.".to_string()
    };
    Ok(Json(CancelSaleResponse {
        success: true,
        message,
        restored_items: outcome.restored_items,
    }))
}

pub async fn register_payment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePaymentPayload>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .sale_service
        .register_payment(user.scope(), &id, &payload.payment_method, payload.status)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn update_delivered_products(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .sale_service
        .update_delivered_products(user.scope(), &id, &payload)
        .await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn stats(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<SalesStats>, AppError> {
    let stats = app_state.sale_service.stats_summary(user.scope()).await?;
    Ok(Json(stats))
}
