// src/db/asset_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::filters::{AssetFilter, ConditionBuilder},
    models::asset::{Asset, AssetStatus},
};

// O registro de ativos serializados. Toda mutação de localização/status é um
// único UPDATE em lote condicionado por lista de ids; quem chama compara o
// rows_affected com o tamanho da lista.
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Asset>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let asset = sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(asset)
    }

    pub async fn list(&self, filter: &AssetFilter) -> Result<Vec<Asset>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM assets WHERE TRUE");
        filter.build_conditions(&mut qb);
        qb.push(" ORDER BY pyr_code ASC");

        let assets = qb.build_query_as::<Asset>().fetch_all(&self.pool).await?;
        Ok(assets)
    }

    /// Checagem em lote da validação: quantos dos ids pedidos estão de fato
    /// disponíveis (IN_STOCK) no local de origem declarado.
    pub async fn count_available_at<'e, E>(
        &self,
        executor: E,
        asset_ids: &[Uuid],
        location_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM assets
            WHERE id = ANY($1) AND location_id = $2 AND status = 'IN_STOCK'
            "#,
        )
        .bind(asset_ids)
        .bind(location_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Elegibilidade para remoção: no local padrão, IN_STOCK e fora de
    /// qualquer transferência aberta. Mesmo padrão de checagem por
    /// existência usado na validação de transferências.
    pub async fn can_remove<'e, E>(&self, executor: E, asset_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let removable = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM assets a
                JOIN locations l ON l.id = a.location_id
                WHERE a.id = $1
                  AND a.status = 'IN_STOCK'
                  AND l.is_default
                  AND NOT EXISTS (
                      SELECT 1 FROM asset_movements am
                      JOIN transfers t ON t.id = am.transfer_id
                      WHERE am.asset_id = a.id AND t.status = 'IN_TRANSIT'
                  )
            )
            "#,
        )
        .bind(asset_id)
        .fetch_one(executor)
        .await?;
        Ok(removable)
    }

    // ---
    // Escritas (transacionais)
    // ---

    pub async fn create<'e, E>(
        &self,
        executor: E,
        serial: Option<&str>,
        pyr_code: &str,
        category_id: Uuid,
        location_id: Uuid,
    ) -> Result<Asset, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let asset = sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (serial, pyr_code, category_id, location_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(serial)
        .bind(pyr_code)
        .bind(category_id)
        .bind(location_id)
        .fetch_one(executor)
        .await?;
        Ok(asset)
    }

    /// Reivindicação do initiate: IN_STOCK -> IN_TRANSIT, condicionada
    /// também ao local de origem declarado. Um ativo que trocou de local
    /// entre a leitura da validação e este update não casa com o predicado
    /// e não é reivindicado; quem chama compara o retorno com `ids.len()`.
    pub async fn claim_at<'e, E>(
        &self,
        executor: E,
        asset_ids: &[Uuid],
        from_location_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE assets SET status = $2, updated_at = now()
            WHERE id = ANY($1) AND status = $3 AND location_id = $4
            "#,
        )
        .bind(asset_ids)
        .bind(AssetStatus::InTransit)
        .bind(AssetStatus::InStock)
        .bind(from_location_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Transição de status em lote, condicionada ao status atual.
    /// Retorna quantas linhas mudaram; menos do que `ids.len()` significa
    /// que algum ativo já saiu do estado esperado (corrida perdida).
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        asset_ids: &[Uuid],
        from: AssetStatus,
        to: AssetStatus,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE assets SET status = $3, updated_at = now()
            WHERE id = ANY($1) AND status = $2
            "#,
        )
        .bind(asset_ids)
        .bind(from)
        .bind(to)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Realocação em lote. Sem condição de status: o gate de corrida é o
    /// `set_status` que roda antes na mesma transação.
    pub async fn set_location<'e, E>(
        &self,
        executor: E,
        asset_ids: &[Uuid],
        location_id: Uuid,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE assets SET location_id = $2, updated_at = now()
            WHERE id = ANY($1)
            "#,
        )
        .bind(asset_ids)
        .bind(location_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::{CategoryRepository, LocationRepository},
        models::category::CategoryKind,
    };

    // IN_STOCK não basta: a reivindicação também exige o local declarado.
    // Um ativo que mudou de local entre a validação e o update não pode ser
    // levado por uma transferência que declarou a origem antiga.
    #[sqlx::test]
    async fn reivindicacao_exige_ativo_no_local_declarado(pool: PgPool) {
        let locations = LocationRepository::new(pool.clone());
        let origem_declarada = locations
            .create(&pool, "Almoxarifado", None, true)
            .await
            .unwrap();
        let local_real = locations.create(&pool, "Escola C", None, false).await.unwrap();
        let categoria = CategoryRepository::new(pool.clone())
            .create(&pool, "Notebook", CategoryKind::Serialized)
            .await
            .unwrap();

        let repo = AssetRepository::new(pool.clone());
        let ativo = repo
            .create(&pool, None, "PYR-00001", categoria.id, local_real.id)
            .await
            .unwrap();

        // IN_STOCK, mas em outro local: zero linhas, status intacto.
        let reivindicados = repo
            .claim_at(&pool, &[ativo.id], origem_declarada.id)
            .await
            .unwrap();
        assert_eq!(reivindicados, 0);
        let intacto = repo.find_by_id(&pool, ativo.id).await.unwrap().unwrap();
        assert_eq!(intacto.status, AssetStatus::InStock);

        // No local certo a reivindicação passa e o status transiciona.
        let reivindicados = repo.claim_at(&pool, &[ativo.id], local_real.id).await.unwrap();
        assert_eq!(reivindicados, 1);
        let em_transito = repo.find_by_id(&pool, ativo.id).await.unwrap().unwrap();
        assert_eq!(em_transito.status, AssetStatus::InTransit);
    }
}
