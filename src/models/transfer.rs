// src/models/transfer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// --- Status da Transferência ---
// Máquina de estados de mão única: IN_TRANSIT -> COMPLETED ou CANCELLED.
// Nenhum estado terminal volta a abrir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transfer_status", rename_all = "SCREAMING_SNAKE_CASE")] // Banco
#[serde(rename_all = "SCREAMING_SNAKE_CASE")] // JSON
pub enum TransferStatus {
    InTransit,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, TransferStatus::InTransit)
    }

    /// Só uma transferência aberta pode mudar de estado.
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        self.is_open() && next != TransferStatus::InTransit
    }
}

// --- Cabeçalho da Transferência ---
// Criada no initiate; o status só muda no confirm. Nunca é apagada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    pub status: TransferStatus,
    pub transfer_date: DateTime<Utc>,
    // Metadados de entrega, preenchidos apenas no confirm.
    pub delivery_lat: Option<f64>,
    pub delivery_lng: Option<f64>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// --- Movimentações (linhas da transferência) ---

// A existência desta linha marca o ativo como "dentro" da transferência;
// apagá-la devolve o ativo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetMovement {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub asset_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// Reserva de quantidade retirada da origem. Parcialmente redutível:
// removeStock decrementa até zerar, quando a linha é apagada.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: Uuid,
    pub transfer_id: Uuid,
    pub category_id: Uuid,
    pub origin: String,
    #[schema(example = 4)]
    pub quantity: i32,
    /// Local de origem pré-transferência; é para cá que removeStock devolve.
    pub from_location_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// Visão completa para o GET: cabeçalho + linhas.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    #[serde(flatten)]
    pub header: Transfer,
    pub asset_movements: Vec<AssetMovement>,
    pub stock_movements: Vec<StockMovement>,
}

// ---
// Requests do ciclo de vida
// ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub category_id: Uuid,

    // Origem do balde (nota fiscal, doação...). Vazio = origem indistinta.
    #[serde(default)]
    pub origin: String,

    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    #[schema(example = 4)]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,

    #[serde(default)]
    pub asset_ids: Vec<Uuid>,

    #[serde(default)]
    #[validate(nested)]
    pub stock_lines: Vec<StockLine>,
}

impl CreateTransferRequest {
    // Regras de consistência que o derive não cobre.
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.from_location_id == self.to_location_id {
            return Err(ValidationError::new("SameSourceAndDestination"));
        }
        if self.asset_ids.is_empty() && self.stock_lines.is_empty() {
            return Err(ValidationError::new("EmptyTransfer"));
        }
        Ok(())
    }

    /// Linhas com a mesma (categoria, origem) somadas em uma só. A validação
    /// e o initiate operam sobre esta lista: cada transferência carrega no
    /// máximo uma movimentação por balde, e o removeStock nunca encontra
    /// linha ambígua.
    pub fn merged_stock_lines(&self) -> Vec<StockLine> {
        let mut merged: Vec<StockLine> = Vec::with_capacity(self.stock_lines.len());
        for line in &self.stock_lines {
            match merged
                .iter_mut()
                .find(|m| m.category_id == line.category_id && m.origin == line.origin)
            {
                Some(existing) => existing.quantity += line.quantity,
                None => merged.push(line.clone()),
            }
        }
        merged
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmDeliveryRequest {
    #[schema(example = -23.5505)]
    pub delivery_lat: Option<f64>,
    #[schema(example = -46.6333)]
    pub delivery_lng: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveStockRequest {
    pub category_id: Uuid,

    #[serde(default)]
    pub origin: String,

    #[validate(range(min = 1, message = "A quantidade deve ser positiva."))]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(from: Uuid, to: Uuid) -> CreateTransferRequest {
        CreateTransferRequest {
            from_location_id: from,
            to_location_id: to,
            asset_ids: vec![Uuid::new_v4()],
            stock_lines: vec![],
        }
    }

    #[test]
    fn aberta_pode_completar_ou_cancelar() {
        assert!(TransferStatus::InTransit.can_transition_to(TransferStatus::Completed));
        assert!(TransferStatus::InTransit.can_transition_to(TransferStatus::Cancelled));
    }

    #[test]
    fn estados_terminais_nao_reabrem() {
        for terminal in [TransferStatus::Completed, TransferStatus::Cancelled] {
            assert!(!terminal.is_open());
            assert!(!terminal.can_transition_to(TransferStatus::InTransit));
            assert!(!terminal.can_transition_to(TransferStatus::Completed));
            assert!(!terminal.can_transition_to(TransferStatus::Cancelled));
        }
    }

    #[test]
    fn nao_ha_transicao_para_o_proprio_in_transit() {
        assert!(!TransferStatus::InTransit.can_transition_to(TransferStatus::InTransit));
    }

    #[test]
    fn origem_igual_ao_destino_e_rejeitada() {
        let loc = Uuid::new_v4();
        assert!(request(loc, loc).validate_consistency().is_err());
    }

    #[test]
    fn transferencia_sem_linhas_e_rejeitada() {
        let mut req = request(Uuid::new_v4(), Uuid::new_v4());
        req.asset_ids.clear();
        assert!(req.validate_consistency().is_err());
    }

    #[test]
    fn quantidade_zero_reprova_no_validator() {
        let mut req = request(Uuid::new_v4(), Uuid::new_v4());
        req.stock_lines.push(StockLine {
            category_id: Uuid::new_v4(),
            origin: String::new(),
            quantity: 0,
        });
        assert!(req.validate().is_err());
    }

    #[test]
    fn linhas_duplicadas_sao_somadas_em_uma_so() {
        let mut req = request(Uuid::new_v4(), Uuid::new_v4());
        let categoria = Uuid::new_v4();
        req.stock_lines.push(StockLine {
            category_id: categoria,
            origin: "NF-1".into(),
            quantity: 3,
        });
        req.stock_lines.push(StockLine {
            category_id: categoria,
            origin: "NF-1".into(),
            quantity: 2,
        });
        req.stock_lines.push(StockLine {
            category_id: categoria,
            origin: "NF-2".into(),
            quantity: 1,
        });

        let merged = req.merged_stock_lines();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].origin, "NF-1");
        assert_eq!(merged[0].quantity, 5);
        assert_eq!(merged[1].quantity, 1);
    }

    #[test]
    fn request_valida_passa() {
        let mut req = request(Uuid::new_v4(), Uuid::new_v4());
        req.stock_lines.push(StockLine {
            category_id: Uuid::new_v4(),
            origin: "NF-1".into(),
            quantity: 3,
        });
        assert!(req.validate().is_ok());
        assert!(req.validate_consistency().is_ok());
    }
}
