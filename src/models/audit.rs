// src/models/audit.rs

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

// --- Entrada de Auditoria ---
// Gerada após o commit e enviada "fire-and-forget" para a fila do
// AuditRecorder. Nunca participa da transação principal.

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSubject {
    pub resource_id: Uuid,
    pub resource_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action: &'static str,
    pub metadata: Value,
    pub subject: AuditSubject,
}

impl AuditEntry {
    pub fn new(action: &'static str, resource_type: &'static str, resource_id: Uuid, metadata: Value) -> Self {
        Self {
            action,
            metadata,
            subject: AuditSubject {
                resource_id,
                resource_type,
            },
        }
    }
}
