// src/db/filters.rs

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{asset::AssetStatus, transfer::TransferStatus};

// ---
// Filtros de listagem
// ---
// Cada variante de consulta é um struct explícito que sabe montar as suas
// próprias condições sobre um `QueryBuilder`. A query base termina em
// `WHERE TRUE`, então cada condição começa com ` AND `.
pub trait ConditionBuilder {
    fn build_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>);
}

#[derive(Debug, Default)]
pub struct AssetFilter {
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: Option<AssetStatus>,
    // Busca textual por pyr_code ou número de série.
    pub search: Option<String>,
}

impl ConditionBuilder for AssetFilter {
    fn build_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some(location_id) = self.location_id {
            qb.push(" AND location_id = ").push_bind(location_id);
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(search) = &self.search {
            qb.push(" AND (pyr_code ILIKE ")
                .push_bind(format!("%{search}%"))
                .push(" OR serial ILIKE ")
                .push_bind(format!("%{search}%"))
                .push(")");
        }
    }
}

#[derive(Debug, Default)]
pub struct StockFilter {
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub origin: Option<String>,
}

impl ConditionBuilder for StockFilter {
    fn build_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some(location_id) = self.location_id {
            qb.push(" AND location_id = ").push_bind(location_id);
        }
        if let Some(category_id) = self.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(origin) = &self.origin {
            qb.push(" AND origin = ").push_bind(origin.as_str());
        }
    }
}

#[derive(Debug, Default)]
pub struct TransferFilter {
    pub status: Option<TransferStatus>,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
}

impl ConditionBuilder for TransferFilter {
    fn build_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Postgres>) {
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = self.from_location_id {
            qb.push(" AND from_location_id = ").push_bind(from);
        }
        if let Some(to) = self.to_location_id {
            qb.push(" AND to_location_id = ").push_bind(to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(filter: &impl ConditionBuilder) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM t WHERE TRUE");
        filter.build_conditions(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn filtro_vazio_nao_adiciona_condicoes() {
        assert_eq!(sql_for(&AssetFilter::default()), "SELECT * FROM t WHERE TRUE");
        assert_eq!(sql_for(&StockFilter::default()), "SELECT * FROM t WHERE TRUE");
    }

    #[test]
    fn filtro_de_ativos_monta_condicoes_na_ordem() {
        let filter = AssetFilter {
            location_id: Some(Uuid::new_v4()),
            status: Some(AssetStatus::InStock),
            search: Some("PYR".into()),
            ..Default::default()
        };
        let sql = sql_for(&filter);
        assert!(sql.contains(" AND location_id = $1"));
        assert!(sql.contains(" AND status = $2"));
        assert!(sql.contains(" AND (pyr_code ILIKE $3 OR serial ILIKE $4)"));
    }

    #[test]
    fn filtro_de_estoque_usa_origem() {
        let filter = StockFilter {
            origin: Some("NF-1".into()),
            ..Default::default()
        };
        assert!(sql_for(&filter).contains(" AND origin = $1"));
    }

    #[test]
    fn filtro_de_transferencias_por_status() {
        let filter = TransferFilter {
            status: Some(TransferStatus::InTransit),
            ..Default::default()
        };
        assert!(sql_for(&filter).contains(" AND status = $1"));
    }
}
