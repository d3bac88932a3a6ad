// src/db/location_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::location::Location};

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(location)
    }

    /// O almoxarifado principal (is_default = true). O esquema garante no
    /// máximo um.
    pub async fn find_default<'e, E>(&self, executor: E) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE is_default")
            .fetch_optional(executor)
            .await?;
        Ok(location)
    }

    pub async fn list(&self) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(locations)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        name: &str,
        address: Option<&str>,
        is_default: bool,
    ) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (name, address, is_default)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(address)
        .bind(is_default)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
    }
}
