// src/models/asset.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Status do Ativo ---
// IN_TRANSIT é transitório: só existe enquanto o ativo pertence a uma
// transferência aberta. DISALLOWED tira o ativo de circulação sem apagá-lo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "asset_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum AssetStatus {
    InStock,
    InTransit,
    Delivered,
    Disallowed,
}

// --- Ativo Serializado ---
// Item físico individual, identificado pelo pyr_code (único) e opcionalmente
// pelo número de série do fabricante.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Uuid,
    #[schema(example = "SN-4F7A21")]
    pub serial: Option<String>,
    #[schema(example = "PYR-00042")]
    pub pyr_code: String,
    pub category_id: Uuid,
    pub location_id: Uuid,
    pub status: AssetStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
