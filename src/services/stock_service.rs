// src/services/stock_service.rs

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{common::error::AppError, db::StockRepository};

// O livro-razão de estoque. `move_quantity` sempre roda dentro da transação
// de quem chama: se qualquer passo falhar, a transação inteira (inclusive o
// que já foi escrito aqui) é desfeita e nenhuma quantidade se perde.
#[derive(Clone)]
pub struct StockService {
    stock_repo: StockRepository,
}

impl StockService {
    pub fn new(stock_repo: StockRepository) -> Self {
        Self { stock_repo }
    }

    /// Move `quantity` unidades do balde (categoria, origem) de `from` para
    /// `to`. A origem é decrementada primeiro: com a atomicidade garantida
    /// pela transação a ordem não muda a correção, mas falhar cedo evita a
    /// escrita inútil no destino.
    pub async fn move_quantity(
        &self,
        conn: &mut PgConnection,
        category_id: Uuid,
        origin: &str,
        quantity: i32,
        from_location_id: Uuid,
        to_location_id: Uuid,
    ) -> Result<(), AppError> {
        // 1. Compare-and-decrement da origem. Zero linhas afetadas é falha
        //    dura: aborta a transação, nunca vira no-op.
        let affected = self
            .stock_repo
            .try_decrement(&mut *conn, category_id, from_location_id, origin, quantity)
            .await?;
        if affected == 0 {
            return Err(AppError::InsufficientQuantity);
        }

        // 2. Balde da origem zerou? Coleta, exceto no local padrão.
        self.stock_repo
            .delete_if_empty(&mut *conn, category_id, from_location_id, origin)
            .await?;

        // 3. Upsert-incremento do destino (cria o balde na primeira chegada).
        self.stock_repo
            .upsert_increment(&mut *conn, category_id, to_location_id, origin, quantity)
            .await?;

        Ok(())
    }

    /// Entrada direta de estoque (fora de transferência): só incrementa o
    /// balde do local.
    pub async fn add_quantity(
        &self,
        conn: &mut PgConnection,
        category_id: Uuid,
        origin: &str,
        quantity: i32,
        location_id: Uuid,
    ) -> Result<(), AppError> {
        self.stock_repo
            .upsert_increment(&mut *conn, category_id, location_id, origin, quantity)
            .await?;
        Ok(())
    }
}
