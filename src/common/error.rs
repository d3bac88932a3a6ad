use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

// Um problema apontado pela pré-validação da transferência.
// `property` indica o campo do payload que originou o problema.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[schema(example = "um ou mais ativos não estão no local de origem")]
    pub message: String,
    #[schema(example = "assetIds")]
    pub property: String,
}

impl ValidationIssue {
    pub fn new(message: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            property: property.into(),
        }
    }
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    // Validação de forma do payload (crate `validator`).
    #[error("Erro de validação")]
    PayloadValidation(#[from] validator::ValidationErrors),

    // Pré-validação de disponibilidade: nada foi alterado no banco.
    #[error("Validação da transferência falhou")]
    ValidationFailed(Vec<ValidationIssue>),

    // Um update condicional de estoque afetou zero linhas no meio da
    // transação: saldo insuficiente. A transação inteira é desfeita.
    #[error("Quantidade insuficiente em estoque")]
    InsufficientQuantity,

    // Um update condicional de ativos afetou menos linhas do que o esperado:
    // algum ativo não estava mais na origem (ou já saiu de IN_STOCK).
    #[error("Ativo não está no local de origem")]
    AssetNotAtSource,

    // Um ativo vinculado à transferência já não está IN_TRANSIT (confirm ou
    // devolução encontraram estado divergente). A transação inteira é
    // desfeita.
    #[error("Ativo não está mais em trânsito")]
    AssetNotInTransit,

    #[error("Transferência não encontrada")]
    TransferNotFound,

    #[error("Ativo não encontrado")]
    AssetNotFound,

    #[error("Categoria não encontrada")]
    CategoryNotFound,

    #[error("Local não encontrado")]
    LocationNotFound,

    #[error("Movimentação de estoque não encontrada")]
    StockMovementNotFound,

    // Transições são de mão única: IN_TRANSIT -> COMPLETED | CANCELLED.
    #[error("Transferência já está encerrada")]
    TransferAlreadyClosed,

    // Ativo fora do local padrão, fora de IN_STOCK ou dentro de uma
    // transferência aberta não pode ser removido.
    #[error("Ativo não pode ser removido")]
    AssetNotRemovable,

    // Falha de persistência. Como tudo roda em uma transação, nada parcial
    // foi aplicado e repetir a operação inteira é seguro.
    #[error("Transação abortada")]
    TransactionAborted(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da pré-validação.
            AppError::ValidationFailed(issues) => {
                let body = Json(json!({
                    "error": "A validação da transferência falhou.",
                    "details": issues,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::PayloadValidation(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::InsufficientQuantity => (StatusCode::CONFLICT, "Quantidade insuficiente no local de origem."),
            AppError::AssetNotAtSource => (StatusCode::CONFLICT, "Um ou mais ativos não estão mais disponíveis na origem."),
            AppError::AssetNotInTransit => (StatusCode::CONFLICT, "Um ou mais ativos vinculados não estão mais em trânsito."),
            AppError::TransferAlreadyClosed => (StatusCode::CONFLICT, "A transferência já foi concluída ou cancelada."),
            AppError::AssetNotRemovable => (StatusCode::CONFLICT, "O ativo não atende aos critérios de remoção."),

            AppError::TransferNotFound => (StatusCode::NOT_FOUND, "Transferência não encontrada."),
            AppError::AssetNotFound => (StatusCode::NOT_FOUND, "Ativo não encontrado."),
            AppError::CategoryNotFound => (StatusCode::NOT_FOUND, "Categoria não encontrada."),
            AppError::LocationNotFound => (StatusCode::NOT_FOUND, "Local não encontrado."),
            AppError::StockMovementNotFound => (StatusCode::NOT_FOUND, "Movimentação de estoque não encontrada."),

            // Todos os outros erros (TransactionAborted, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn conflitos_de_regra_de_negocio_viram_409() {
        assert_eq!(status_of(AppError::InsufficientQuantity), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::AssetNotAtSource), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::AssetNotInTransit), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::TransferAlreadyClosed), StatusCode::CONFLICT);
        assert_eq!(status_of(AppError::AssetNotRemovable), StatusCode::CONFLICT);
    }

    #[test]
    fn entidades_ausentes_viram_404() {
        assert_eq!(status_of(AppError::TransferNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::AssetNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::StockMovementNotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validacao_falha_vira_400_com_detalhes() {
        let err = AppError::ValidationFailed(vec![ValidationIssue::new(
            "quantidade solicitada indisponível",
            "stockItems",
        )]);
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn falha_de_persistencia_vira_500() {
        let err = AppError::TransactionAborted(sqlx::Error::RowNotFound);
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
