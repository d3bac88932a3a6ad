// src/models/location.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Locais de Armazenamento ---
// Cada ativo e cada saldo de estoque pertence a exatamente um local.
// Exatamente um local é o almoxarifado principal (is_default = true):
// saldos zerados nele nunca são removidos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    #[schema(example = "Almoxarifado Central")]
    pub name: String,
    pub address: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
