// src/db/stock_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::filters::{ConditionBuilder, StockFilter},
    models::stock::StockRecord,
};

// Saldos de estoque não-serializado. As três primitivas de escrita
// (upsert-incremento, decremento condicional e coleta do balde zerado) são
// statements atômicos pensados para rodar dentro da transação de quem chama.
#[derive(Clone)]
pub struct StockRepository {
    pool: PgPool,
}

impl StockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn list(&self, filter: &StockFilter) -> Result<Vec<StockRecord>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM stock_records WHERE TRUE");
        filter.build_conditions(&mut qb);
        qb.push(" ORDER BY location_id, origin");

        let records = qb.build_query_as::<StockRecord>().fetch_all(&self.pool).await?;
        Ok(records)
    }

    /// Quantidade disponível no balde (0 se o registro não existe).
    pub async fn available_quantity<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
        location_id: Uuid,
        origin: &str,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quantity = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT SUM(quantity)::int FROM stock_records
            WHERE category_id = $1 AND location_id = $2 AND origin = $3
            "#,
        )
        .bind(category_id)
        .bind(location_id)
        .bind(origin)
        .fetch_one(executor)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    // ---
    // Escritas (transacionais)
    // ---

    /// Soma `quantity` ao balde de destino, criando-o na primeira chegada.
    /// O UPSERT é atômico e previne corridas entre transferências simultâneas
    /// para o mesmo destino.
    pub async fn upsert_increment<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
        location_id: Uuid,
        origin: &str,
        quantity: i32,
    ) -> Result<StockRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, StockRecord>(
            r#"
            INSERT INTO stock_records (category_id, location_id, origin, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (category_id, location_id, origin)
            DO UPDATE SET
                quantity = stock_records.quantity + $4,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(category_id)
        .bind(location_id)
        .bind(origin)
        .bind(quantity)
        .fetch_one(executor)
        .await?;
        Ok(record)
    }

    /// Compare-and-decrement: só subtrai se o saldo atual comporta o pedido.
    /// Zero linhas afetadas significa saldo insuficiente (ou balde
    /// inexistente) e NUNCA pode ser tratado como no-op silencioso.
    pub async fn try_decrement<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
        location_id: Uuid,
        origin: &str,
        quantity: i32,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE stock_records
            SET quantity = quantity - $4, updated_at = now()
            WHERE category_id = $1 AND location_id = $2 AND origin = $3
              AND quantity >= $4
            "#,
        )
        .bind(category_id)
        .bind(location_id)
        .bind(origin)
        .bind(quantity)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Coleta o balde que zerou, exceto no local padrão (o almoxarifado
    /// principal mantém o registro mesmo com quantidade zero).
    pub async fn delete_if_empty<'e, E>(
        &self,
        executor: E,
        category_id: Uuid,
        location_id: Uuid,
        origin: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM stock_records sr
            USING locations l
            WHERE l.id = sr.location_id AND NOT l.is_default
              AND sr.category_id = $1 AND sr.location_id = $2 AND sr.origin = $3
              AND sr.quantity = 0
            "#,
        )
        .bind(category_id)
        .bind(location_id)
        .bind(origin)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
