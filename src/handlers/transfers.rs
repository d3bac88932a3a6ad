// src/handlers/transfers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::filters::TransferFilter,
    models::transfer::{
        ConfirmDeliveryRequest, CreateTransferRequest, RemoveStockRequest, Transfer,
        TransferDetail, TransferStatus,
    },
};

// POST /api/transfers
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "Transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transferência criada", body = Transfer),
        (status = 400, description = "Payload inválido ou validação de disponibilidade reprovada"),
        (status = 409, description = "Corrida perdida: ativo ou saldo não está mais na origem")
    )
)]
pub async fn create_transfer(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateTransferRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.validate_consistency().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("request", e);
        AppError::PayloadValidation(errors)
    })?;

    let transfer = app_state
        .transfer_service
        .create_transfer(&app_state.db_pool, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransfersParams {
    pub status: Option<TransferStatus>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
}

// GET /api/transfers
#[utoipa::path(
    get,
    path = "/api/transfers",
    tag = "Transfers",
    params(
        ("status" = Option<String>, Query, description = "IN_TRANSIT | COMPLETED | CANCELLED"),
        ("fromLocationId" = Option<Uuid>, Query, description = "Filtra pelo local de origem"),
        ("toLocationId" = Option<Uuid>, Query, description = "Filtra pelo local de destino")
    ),
    responses(
        (status = 200, description = "Lista de transferências", body = [Transfer])
    )
)]
pub async fn list_transfers(
    State(app_state): State<AppState>,
    Query(params): Query<ListTransfersParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = TransferFilter {
        status: params.status,
        from_location_id: params.from_location_id,
        to_location_id: params.to_location_id,
    };
    let transfers = app_state.transfer_repo.list(&filter).await?;
    Ok(Json(transfers))
}

// GET /api/transfers/{id}
#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    tag = "Transfers",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Cabeçalho + movimentações", body = TransferDetail),
        (status = 404, description = "Transferência não encontrada")
    )
)]
pub async fn get_transfer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state
        .transfer_service
        .get_transfer(&app_state.db_pool, id)
        .await?;
    Ok(Json(detail))
}

// POST /api/transfers/{id}/confirm
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/confirm",
    tag = "Transfers",
    request_body = ConfirmDeliveryRequest,
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Transferência concluída", body = Transfer),
        (status = 404, description = "Transferência não encontrada"),
        (status = 409, description = "Transferência já encerrada")
    )
)]
pub async fn confirm_transfer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmDeliveryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let transfer = app_state
        .transfer_service
        .confirm_transfer(&app_state.db_pool, id, &payload)
        .await?;

    Ok(Json(transfer))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAssetParams {
    // Para onde o ativo volta (em geral, o local de origem da transferência).
    pub target_location_id: Uuid,
}

// DELETE /api/transfers/{id}/assets/{asset_id}
#[utoipa::path(
    delete,
    path = "/api/transfers/{id}/assets/{asset_id}",
    tag = "Transfers",
    params(
        ("id" = Uuid, Path, description = "ID da transferência"),
        ("asset_id" = Uuid, Path, description = "ID do ativo"),
        ("targetLocationId" = Uuid, Query, description = "Local para onde o ativo volta")
    ),
    responses(
        (status = 204, description = "Ativo desvinculado e devolvido"),
        (status = 404, description = "Transferência ou ativo não encontrado"),
        (status = 409, description = "Transferência já encerrada")
    )
)]
pub async fn remove_asset_from_transfer(
    State(app_state): State<AppState>,
    Path((id, asset_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<RemoveAssetParams>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .transfer_service
        .remove_asset(&app_state.db_pool, id, asset_id, params.target_location_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// POST /api/transfers/{id}/stock/remove
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/stock/remove",
    tag = "Transfers",
    request_body = RemoveStockRequest,
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 204, description = "Quantidade devolvida à origem"),
        (status = 404, description = "Transferência ou movimentação não encontrada"),
        (status = 409, description = "Quantidade pedida maior que a reserva restante")
    )
)]
pub async fn remove_stock_from_transfer(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemoveStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    app_state
        .transfer_service
        .remove_stock(&app_state.db_pool, id, &payload)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
