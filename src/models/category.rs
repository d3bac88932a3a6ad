// src/models/category.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// O tipo da categoria decide qual ramo da transferência se aplica:
// SERIALIZED -> ativos individuais, STOCK -> baldes de quantidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "category_kind", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum CategoryKind {
    Serialized,
    Stock,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Notebook Dell")]
    pub name: String,
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
