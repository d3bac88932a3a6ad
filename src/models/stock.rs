// src/models/stock.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Saldo de Estoque (não-serializado) ---
// Balde de quantidade por (categoria, local, origem). Criado implicitamente
// na primeira chegada; removido ao zerar, exceto no local padrão.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: Uuid,
    pub category_id: Uuid,
    pub location_id: Uuid,
    #[schema(example = "NF-2024-0113")]
    pub origin: String,
    #[schema(example = 10)]
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
