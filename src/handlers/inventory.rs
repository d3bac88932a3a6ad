// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    db::filters::{AssetFilter, StockFilter},
    models::{
        asset::{Asset, AssetStatus},
        audit::AuditEntry,
        category::{Category, CategoryKind},
        location::Location,
        stock::StockRecord,
    },
};

// =============================================================================
//  ATIVOS SERIALIZADOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetPayload {
    pub serial: Option<String>,

    #[validate(length(min = 1, message = "O pyrCode é obrigatório."))]
    #[schema(example = "PYR-00042")]
    pub pyr_code: String,

    pub category_id: Uuid,

    // Sem local informado, o ativo nasce no almoxarifado principal.
    pub location_id: Option<Uuid>,
}

// POST /api/inventory/assets
#[utoipa::path(
    post,
    path = "/api/inventory/assets",
    tag = "Inventory",
    request_body = CreateAssetPayload,
    responses(
        (status = 201, description = "Ativo criado", body = Asset),
        (status = 404, description = "Categoria ou local não encontrado")
    )
)]
pub async fn create_asset(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateAssetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut conn = app_state.db_pool.acquire().await.map_err(AppError::from)?;

    app_state
        .category_repo
        .find_by_id(&mut *conn, payload.category_id)
        .await?
        .ok_or(AppError::CategoryNotFound)?;

    let location_id = match payload.location_id {
        Some(id) => {
            app_state
                .location_repo
                .find_by_id(&mut *conn, id)
                .await?
                .ok_or(AppError::LocationNotFound)?;
            id
        }
        None => app_state
            .location_repo
            .find_default(&mut *conn)
            .await?
            .ok_or(AppError::LocationNotFound)?
            .id,
    };

    let asset = app_state
        .asset_repo
        .create(
            &mut *conn,
            payload.serial.as_deref(),
            &payload.pyr_code,
            payload.category_id,
            location_id,
        )
        .await?;

    app_state.audit.log(AuditEntry::new(
        "asset_created",
        "asset",
        asset.id,
        json!({ "pyrCode": asset.pyr_code, "locationId": location_id }),
    ));

    Ok((StatusCode::CREATED, Json(asset)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAssetsParams {
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<AssetStatus>,
    pub search: Option<String>,
}

// GET /api/inventory/assets
#[utoipa::path(
    get,
    path = "/api/inventory/assets",
    tag = "Inventory",
    params(
        ("locationId" = Option<Uuid>, Query, description = "Filtra por local"),
        ("categoryId" = Option<Uuid>, Query, description = "Filtra por categoria"),
        ("status" = Option<String>, Query, description = "IN_STOCK | IN_TRANSIT | DELIVERED | DISALLOWED"),
        ("search" = Option<String>, Query, description = "Busca por pyrCode ou serial")
    ),
    responses(
        (status = 200, description = "Lista de ativos", body = [Asset])
    )
)]
pub async fn list_assets(
    State(app_state): State<AppState>,
    Query(params): Query<ListAssetsParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = AssetFilter {
        location_id: params.location_id,
        category_id: params.category_id,
        status: params.status,
        search: params.search,
    };
    let assets = app_state.asset_repo.list(&filter).await?;
    Ok(Json(assets))
}

// DELETE /api/inventory/assets/{id}
#[utoipa::path(
    delete,
    path = "/api/inventory/assets/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do ativo")),
    responses(
        (status = 204, description = "Ativo removido"),
        (status = 404, description = "Ativo não encontrado"),
        (status = 409, description = "Ativo fora do local padrão, fora de IN_STOCK ou em transferência aberta")
    )
)]
pub async fn delete_asset(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = app_state.db_pool.begin().await.map_err(AppError::from)?;

    app_state
        .asset_repo
        .find_by_id(&mut *tx, id)
        .await?
        .ok_or(AppError::AssetNotFound)?;

    // Mesma checagem por existência usada na validação de transferências.
    if !app_state.asset_repo.can_remove(&mut *tx, id).await? {
        return Err(AppError::AssetNotRemovable);
    }

    app_state.asset_repo.delete(&mut *tx, id).await?;
    tx.commit().await.map_err(AppError::from)?;

    app_state.audit.log(AuditEntry::new(
        "asset_deleted",
        "asset",
        id,
        json!({}),
    ));

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ESTOQUE NÃO-SERIALIZADO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryPayload {
    pub category_id: Uuid,
    pub location_id: Uuid,

    #[serde(default)]
    #[schema(example = "NF-2024-0113")]
    pub origin: String,

    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,
}

// POST /api/inventory/stock-entry
#[utoipa::path(
    post,
    path = "/api/inventory/stock-entry",
    tag = "Inventory",
    request_body = StockEntryPayload,
    responses(
        (status = 200, description = "Entrada registrada no balde"),
        (status = 404, description = "Categoria ou local não encontrado")
    )
)]
pub async fn stock_entry(
    State(app_state): State<AppState>,
    Json(payload): Json<StockEntryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut conn = app_state.db_pool.acquire().await.map_err(AppError::from)?;

    app_state
        .category_repo
        .find_by_id(&mut *conn, payload.category_id)
        .await?
        .ok_or(AppError::CategoryNotFound)?;
    app_state
        .location_repo
        .find_by_id(&mut *conn, payload.location_id)
        .await?
        .ok_or(AppError::LocationNotFound)?;

    app_state
        .stock_service
        .add_quantity(
            &mut conn,
            payload.category_id,
            &payload.origin,
            payload.quantity,
            payload.location_id,
        )
        .await?;

    app_state.audit.log(AuditEntry::new(
        "stock_entry",
        "category",
        payload.category_id,
        json!({
            "locationId": payload.location_id,
            "origin": payload.origin,
            "quantity": payload.quantity,
        }),
    ));

    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStockParams {
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub origin: Option<String>,
}

// GET /api/inventory/stock
#[utoipa::path(
    get,
    path = "/api/inventory/stock",
    tag = "Inventory",
    params(
        ("locationId" = Option<Uuid>, Query, description = "Filtra por local"),
        ("categoryId" = Option<Uuid>, Query, description = "Filtra por categoria"),
        ("origin" = Option<String>, Query, description = "Filtra por origem")
    ),
    responses(
        (status = 200, description = "Saldos de estoque", body = [StockRecord])
    )
)]
pub async fn list_stock(
    State(app_state): State<AppState>,
    Query(params): Query<ListStockParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = StockFilter {
        location_id: params.location_id,
        category_id: params.category_id,
        origin: params.origin,
    };
    let records = app_state.stock_repo.list(&filter).await?;
    Ok(Json(records))
}

// =============================================================================
//  LOCAIS E CATEGORIAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLocationPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub address: Option<String>,

    #[serde(default)]
    pub is_default: bool,
}

// POST /api/inventory/locations
#[utoipa::path(
    post,
    path = "/api/inventory/locations",
    tag = "Inventory",
    request_body = CreateLocationPayload,
    responses(
        (status = 201, description = "Local criado", body = Location)
    )
)]
pub async fn create_location(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateLocationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let location = app_state
        .location_repo
        .create(
            &app_state.db_pool,
            &payload.name,
            payload.address.as_deref(),
            payload.is_default,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(location)))
}

// GET /api/inventory/locations
#[utoipa::path(
    get,
    path = "/api/inventory/locations",
    tag = "Inventory",
    responses(
        (status = 200, description = "Lista de locais", body = [Location])
    )
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let locations = app_state.location_repo.list().await?;
    Ok(Json(locations))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    pub kind: CategoryKind,
}

// POST /api/inventory/categories
#[utoipa::path(
    post,
    path = "/api/inventory/categories",
    tag = "Inventory",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category)
    )
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state
        .category_repo
        .create(&app_state.db_pool, &payload.name, payload.kind)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/inventory/categories
#[utoipa::path(
    get,
    path = "/api/inventory/categories",
    tag = "Inventory",
    responses(
        (status = 200, description = "Lista de categorias", body = [Category])
    )
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.category_repo.list().await?;
    Ok(Json(categories))
}
