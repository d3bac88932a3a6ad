// src/docs.rs

use utoipa::OpenApi;

use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Transfers ---
        handlers::transfers::create_transfer,
        handlers::transfers::list_transfers,
        handlers::transfers::get_transfer,
        handlers::transfers::confirm_transfer,
        handlers::transfers::remove_asset_from_transfer,
        handlers::transfers::remove_stock_from_transfer,

        // --- Inventory ---
        handlers::inventory::create_asset,
        handlers::inventory::list_assets,
        handlers::inventory::delete_asset,
        handlers::inventory::stock_entry,
        handlers::inventory::list_stock,
        handlers::inventory::create_location,
        handlers::inventory::list_locations,
        handlers::inventory::create_category,
        handlers::inventory::list_categories,
    ),
    components(
        schemas(
            // --- Transfers ---
            models::transfer::TransferStatus,
            models::transfer::Transfer,
            models::transfer::TransferDetail,
            models::transfer::AssetMovement,
            models::transfer::StockMovement,
            models::transfer::StockLine,
            models::transfer::CreateTransferRequest,
            models::transfer::ConfirmDeliveryRequest,
            models::transfer::RemoveStockRequest,

            // --- Inventory ---
            models::asset::AssetStatus,
            models::asset::Asset,
            models::stock::StockRecord,
            models::location::Location,
            models::category::CategoryKind,
            models::category::Category,

            // --- Payloads ---
            handlers::inventory::CreateAssetPayload,
            handlers::inventory::StockEntryPayload,
            handlers::inventory::CreateLocationPayload,
            handlers::inventory::CreateCategoryPayload,

            // --- Erros ---
            common::error::ValidationIssue,
        )
    ),
    tags(
        (name = "Transfers", description = "Ciclo de vida das transferências entre locais"),
        (name = "Inventory", description = "Ativos serializados, saldos de estoque, locais e categorias")
    )
)]
pub struct ApiDoc;
