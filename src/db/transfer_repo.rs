// src/db/transfer_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::filters::{ConditionBuilder, TransferFilter},
    models::transfer::{AssetMovement, StockMovement, Transfer, TransferStatus},
};

// Transferências e suas linhas (movimentações de ativos e de estoque).
// Transferências nunca são apagadas; o status só anda para frente via
// update condicional sobre 'IN_TRANSIT'.
#[derive(Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Cabeçalho
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        from_location_id: Uuid,
        to_location_id: Uuid,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, Transfer>(
            r#"
            INSERT INTO transfers (from_location_id, to_location_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(from_location_id)
        .bind(to_location_id)
        .fetch_one(executor)
        .await?;
        Ok(transfer)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Transfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, Transfer>("SELECT * FROM transfers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(transfer)
    }

    pub async fn list(&self, filter: &TransferFilter) -> Result<Vec<Transfer>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM transfers WHERE TRUE");
        filter.build_conditions(&mut qb);
        qb.push(" ORDER BY transfer_date DESC");

        let transfers = qb.build_query_as::<Transfer>().fetch_all(&self.pool).await?;
        Ok(transfers)
    }

    /// Transição condicional IN_TRANSIT -> COMPLETED, gravando os metadados
    /// de entrega. Zero linhas afetadas = a transferência já estava fechada.
    pub async fn complete<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        delivery_lat: Option<f64>,
        delivery_lng: Option<f64>,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = $2, delivery_lat = $3, delivery_lng = $4, delivered_at = now()
            WHERE id = $1 AND status = 'IN_TRANSIT'
            "#,
        )
        .bind(id)
        .bind(TransferStatus::Completed)
        .bind(delivery_lat)
        .bind(delivery_lng)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Movimentações de ativos
    // ---

    pub async fn insert_asset_movement<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        asset_id: Uuid,
    ) -> Result<AssetMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, AssetMovement>(
            r#"
            INSERT INTO asset_movements (transfer_id, asset_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(transfer_id)
        .bind(asset_id)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn delete_asset_movement<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        asset_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM asset_movements WHERE transfer_id = $1 AND asset_id = $2",
        )
        .bind(transfer_id)
        .bind(asset_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list_asset_movements<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
    ) -> Result<Vec<AssetMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, AssetMovement>(
            "SELECT * FROM asset_movements WHERE transfer_id = $1 ORDER BY created_at",
        )
        .bind(transfer_id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    // ---
    // Movimentações de estoque
    // ---

    pub async fn insert_stock_movement<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        category_id: Uuid,
        origin: &str,
        quantity: i32,
        from_location_id: Uuid,
    ) -> Result<StockMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (transfer_id, category_id, origin, quantity, from_location_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(transfer_id)
        .bind(category_id)
        .bind(origin)
        .bind(quantity)
        .bind(from_location_id)
        .fetch_one(executor)
        .await?;
        Ok(movement)
    }

    pub async fn find_stock_movement<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        category_id: Uuid,
        origin: &str,
    ) -> Result<Option<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT * FROM stock_movements
            WHERE transfer_id = $1 AND category_id = $2 AND origin = $3
            "#,
        )
        .bind(transfer_id)
        .bind(category_id)
        .bind(origin)
        .fetch_optional(executor)
        .await?;
        Ok(movement)
    }

    pub async fn list_stock_movements<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
    ) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE transfer_id = $1 ORDER BY created_at",
        )
        .bind(transfer_id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    /// Reduz a reserva da movimentação, falhando se ficaria negativa.
    /// Zero linhas afetadas = pedido maior do que a reserva restante.
    pub async fn try_decrement_stock_movement<'e, E>(
        &self,
        executor: E,
        movement_id: Uuid,
        quantity: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE stock_movements SET quantity = quantity - $2
            WHERE id = $1 AND quantity >= $2
            "#,
        )
        .bind(movement_id)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Apaga a movimentação que zerou (reserva totalmente devolvida).
    pub async fn delete_stock_movement_if_empty<'e, E>(
        &self,
        executor: E,
        movement_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM stock_movements WHERE id = $1 AND quantity = 0")
            .bind(movement_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
