// src/services/validation_service.rs

use sqlx::PgConnection;

use crate::{
    common::error::{AppError, ValidationIssue},
    db::{AssetRepository, StockRepository},
    models::transfer::{CreateTransferRequest, StockLine},
};

// Pré-validação de disponibilidade da transferência. É consultiva: aprovação
// aqui não é um lock. O gate definitivo contra corridas são os updates
// condicionais dentro da transação.
#[derive(Clone)]
pub struct ValidationService {
    asset_repo: AssetRepository,
    stock_repo: StockRepository,
}

impl ValidationService {
    pub fn new(asset_repo: AssetRepository, stock_repo: StockRepository) -> Self {
        Self { asset_repo, stock_repo }
    }

    /// Confere que os ativos e as quantidades pedidas existem de fato no
    /// local de origem declarado. Retorna a lista (possivelmente vazia) de
    /// problemas agregados — um por grupo, não um por ativo.
    pub async fn validate(
        &self,
        conn: &mut PgConnection,
        request: &CreateTransferRequest,
    ) -> Result<Vec<ValidationIssue>, AppError> {
        let mut issues = Vec::new();

        if !request.asset_ids.is_empty() {
            // Uma única checagem em lote para todos os ativos pedidos.
            let found = self
                .asset_repo
                .count_available_at(&mut *conn, &request.asset_ids, request.from_location_id)
                .await?;
            if let Some(issue) = asset_issue(request.asset_ids.len(), found) {
                issues.push(issue);
            }
        }

        // Linhas duplicadas do payload já chegam somadas: duas linhas de 3
        // contra um balde de 4 reprovam como uma linha de 6.
        let stock_lines = request.merged_stock_lines();
        if !stock_lines.is_empty() {
            let mut satisfiable = 0usize;
            for line in &stock_lines {
                let available = self
                    .stock_repo
                    .available_quantity(
                        &mut *conn,
                        line.category_id,
                        request.from_location_id,
                        &line.origin,
                    )
                    .await?;
                if line_is_satisfiable(line, available) {
                    satisfiable += 1;
                }
            }
            if let Some(issue) = stock_issue(stock_lines.len(), satisfiable) {
                issues.push(issue);
            }
        }

        Ok(issues)
    }
}

// ---
// Agregação (pura, testável sem banco)
// ---

fn asset_issue(requested: usize, found: i64) -> Option<ValidationIssue> {
    if found < requested as i64 {
        Some(ValidationIssue::new(
            format!(
                "{} de {} ativos não estão disponíveis no local de origem.",
                requested as i64 - found,
                requested
            ),
            "assetIds",
        ))
    } else {
        None
    }
}

fn line_is_satisfiable(line: &StockLine, available: i32) -> bool {
    available >= line.quantity
}

fn stock_issue(requested: usize, satisfiable: usize) -> Option<ValidationIssue> {
    if satisfiable < requested {
        Some(ValidationIssue::new(
            format!(
                "{} de {} linhas de estoque não têm saldo suficiente na origem.",
                requested - satisfiable,
                requested
            ),
            "stockLines",
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn line(quantity: i32) -> StockLine {
        StockLine {
            category_id: Uuid::new_v4(),
            origin: String::new(),
            quantity,
        }
    }

    #[test]
    fn ativos_todos_presentes_nao_gera_problema() {
        assert!(asset_issue(3, 3).is_none());
    }

    #[test]
    fn ativo_faltando_gera_um_unico_problema_agregado() {
        let issue = asset_issue(5, 3).expect("deveria reprovar");
        assert_eq!(issue.property, "assetIds");
        assert!(issue.message.contains("2 de 5"));
    }

    #[test]
    fn linha_satisfazivel_compara_saldo_com_pedido() {
        assert!(line_is_satisfiable(&line(4), 4));
        assert!(line_is_satisfiable(&line(4), 10));
        assert!(!line_is_satisfiable(&line(4), 3));
    }

    #[test]
    fn linhas_insuficientes_geram_um_unico_problema_agregado() {
        let issue = stock_issue(2, 1).expect("deveria reprovar");
        assert_eq!(issue.property, "stockLines");
        assert!(issue.message.contains("1 de 2"));
    }

    #[test]
    fn todas_as_linhas_satisfeitas_passa() {
        assert!(stock_issue(2, 2).is_none());
    }
}
