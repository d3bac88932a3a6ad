// src/services/audit_service.rs

use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::models::audit::AuditEntry;

// --- AuditRecorder ---
// Fila explícita + um único worker consumidor, em vez de spawnar uma task
// por chamada: as entradas chegam na tabela na ordem em que foram enfileiradas
// e o commit da transação principal nunca espera por este caminho.
#[derive(Clone)]
pub struct AuditRecorder {
    tx: mpsc::UnboundedSender<AuditEntry>,
}

impl AuditRecorder {
    /// Sobe o worker que persiste as entradas em `audit_logs`.
    pub fn spawn(pool: PgPool) -> Self {
        Self::spawn_with(move |entry| {
            let pool = pool.clone();
            async move { persist_entry(&pool, entry).await }
        })
    }

    // Worker genérico sobre o handler de persistência (os testes injetam um
    // handler em memória). Falha no handler é logada e o worker segue vivo.
    pub(crate) fn spawn_with<H, Fut>(mut handler: H) -> Self
    where
        H: FnMut(AuditEntry) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), sqlx::Error>> + Send,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<AuditEntry>();

        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let action = entry.action;
                if let Err(err) = handler(entry).await {
                    tracing::warn!("Falha ao gravar auditoria ({action}): {err}");
                }
            }
        });

        Self { tx }
    }

    /// Fire-and-forget: nunca bloqueia, nunca devolve erro ao chamador.
    pub fn log(&self, entry: AuditEntry) {
        if self.tx.send(entry).is_err() {
            tracing::warn!("Fila de auditoria fechada; entrada descartada.");
        }
    }
}

async fn persist_entry(pool: &PgPool, entry: AuditEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (action, resource_type, resource_id, metadata)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(entry.action)
    .bind(entry.subject.resource_type)
    .bind(entry.subject.resource_id)
    .bind(&entry.metadata)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn entry(action: &'static str) -> AuditEntry {
        AuditEntry::new(action, "transfer", Uuid::new_v4(), json!({}))
    }

    #[tokio::test]
    async fn worker_unico_preserva_a_ordem_de_enfileiramento() {
        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel::<&'static str>();
        let recorder = AuditRecorder::spawn_with(move |e: AuditEntry| {
            let sink_tx = sink_tx.clone();
            async move {
                let _ = sink_tx.send(e.action);
                Ok(())
            }
        });

        recorder.log(entry("primeiro"));
        recorder.log(entry("segundo"));
        recorder.log(entry("terceiro"));

        assert_eq!(sink_rx.recv().await, Some("primeiro"));
        assert_eq!(sink_rx.recv().await, Some("segundo"));
        assert_eq!(sink_rx.recv().await, Some("terceiro"));
    }

    #[tokio::test]
    async fn falha_de_persistencia_nao_derruba_o_worker() {
        let (sink_tx, mut sink_rx) = mpsc::unbounded_channel::<&'static str>();
        let recorder = AuditRecorder::spawn_with(move |e: AuditEntry| {
            let sink_tx = sink_tx.clone();
            async move {
                if e.action == "quebra" {
                    return Err(sqlx::Error::PoolClosed);
                }
                let _ = sink_tx.send(e.action);
                Ok(())
            }
        });

        recorder.log(entry("quebra"));
        recorder.log(entry("sobrevive"));

        assert_eq!(sink_rx.recv().await, Some("sobrevive"));
    }

    #[tokio::test]
    async fn log_nunca_falha_mesmo_com_worker_encerrado() {
        let recorder = AuditRecorder::spawn_with(|_e: AuditEntry| async { Ok(()) });
        let clone = recorder.clone();
        drop(recorder);
        // O canal continua aberto pelo clone; enviar não entra em pânico.
        clone.log(entry("ainda-aberto"));
    }
}
