// src/services/transfer_service.rs

use serde_json::json;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AssetRepository, LocationRepository, TransferRepository},
    models::{
        asset::AssetStatus,
        audit::AuditEntry,
        transfer::{
            ConfirmDeliveryRequest, CreateTransferRequest, RemoveStockRequest, Transfer,
            TransferDetail,
        },
    },
    services::{
        audit_service::AuditRecorder, stock_service::StockService,
        validation_service::ValidationService,
    },
};

// O coordenador do ciclo de vida da transferência. Cada operação pública
// abre exatamente uma transação; nada parcial jamais fica observável. A
// auditoria é despachada depois do commit e nunca desfaz nada.
#[derive(Clone)]
pub struct TransferService {
    transfer_repo: TransferRepository,
    asset_repo: AssetRepository,
    location_repo: LocationRepository,
    stock_service: StockService,
    validation_service: ValidationService,
    audit: AuditRecorder,
}

impl TransferService {
    pub fn new(
        transfer_repo: TransferRepository,
        asset_repo: AssetRepository,
        location_repo: LocationRepository,
        stock_service: StockService,
        validation_service: ValidationService,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            transfer_repo,
            asset_repo,
            location_repo,
            stock_service,
            validation_service,
            audit,
        }
    }

    // ---
    // initiate
    // ---

    /// Cria a transferência e move ativos e quantidades em uma transação.
    /// Qualquer falha no meio (corrida perdida, saldo que sumiu) desfaz tudo.
    pub async fn create_transfer<'e, E>(
        &self,
        executor: E,
        request: &CreateTransferRequest,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Origem e destino precisam existir antes de qualquer escrita.
        for location_id in [request.from_location_id, request.to_location_id] {
            self.location_repo
                .find_by_id(&mut *tx, location_id)
                .await?
                .ok_or(AppError::LocationNotFound)?;
        }

        // Pré-validação dentro do snapshot da transação, antes de qualquer
        // mutação. Reprovou = nada foi alterado.
        let issues = self.validation_service.validate(&mut *tx, request).await?;
        if !issues.is_empty() {
            return Err(AppError::ValidationFailed(issues));
        }

        let transfer = self
            .transfer_repo
            .create(&mut *tx, request.from_location_id, request.to_location_id)
            .await?;

        // Ramo serializado: linha de movimentação por ativo + dois updates
        // em lote. O update condicional é o gate contra corridas, e o
        // predicado inclui o local de origem: IN_STOCK em outro local (um
        // removeAsset concorrente que devolveu o ativo para outro lugar)
        // também perde a corrida.
        if !request.asset_ids.is_empty() {
            for asset_id in &request.asset_ids {
                self.transfer_repo
                    .insert_asset_movement(&mut *tx, transfer.id, *asset_id)
                    .await?;
            }

            let claimed = self
                .asset_repo
                .claim_at(&mut *tx, &request.asset_ids, request.from_location_id)
                .await?;
            if claimed != request.asset_ids.len() as u64 {
                return Err(AppError::AssetNotAtSource);
            }

            self.asset_repo
                .set_location(&mut *tx, &request.asset_ids, request.to_location_id)
                .await?;
        }

        // Ramo de estoque: reserva + movimentação no livro-razão. Linhas
        // duplicadas do payload viram uma única movimentação por balde.
        let stock_lines = request.merged_stock_lines();
        for line in &stock_lines {
            self.transfer_repo
                .insert_stock_movement(
                    &mut *tx,
                    transfer.id,
                    line.category_id,
                    &line.origin,
                    line.quantity,
                    request.from_location_id,
                )
                .await?;

            self.stock_service
                .move_quantity(
                    &mut *tx,
                    line.category_id,
                    &line.origin,
                    line.quantity,
                    request.from_location_id,
                    request.to_location_id,
                )
                .await?;
        }

        tx.commit().await?;

        self.audit_create(&transfer, request);
        Ok(transfer)
    }

    // ---
    // leitura
    // ---

    pub async fn get_transfer<'e, E>(&self, executor: E, id: Uuid) -> Result<TransferDetail, AppError>
    where
        E: Acquire<'e, Database = Postgres>,
    {
        let mut conn = executor.acquire().await?;

        let header = self
            .transfer_repo
            .find_by_id(&mut *conn, id)
            .await?
            .ok_or(AppError::TransferNotFound)?;
        let asset_movements = self.transfer_repo.list_asset_movements(&mut *conn, id).await?;
        let stock_movements = self.transfer_repo.list_stock_movements(&mut *conn, id).await?;

        Ok(TransferDetail {
            header,
            asset_movements,
            stock_movements,
        })
    }

    // ---
    // confirm
    // ---

    /// IN_TRANSIT -> COMPLETED: todos os ativos vinculados viram DELIVERED
    /// na mesma transação. Se um único ativo falhar, nenhum é atualizado e a
    /// transferência continua aberta.
    pub async fn confirm_transfer<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        request: &ConfirmDeliveryRequest,
    ) -> Result<Transfer, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self
            .transfer_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::TransferNotFound)?;
        if !transfer.status.is_open() {
            return Err(AppError::TransferAlreadyClosed);
        }

        let movements = self.transfer_repo.list_asset_movements(&mut *tx, id).await?;
        let asset_ids: Vec<Uuid> = movements.iter().map(|m| m.asset_id).collect();

        if !asset_ids.is_empty() {
            let delivered = self
                .asset_repo
                .set_status(&mut *tx, &asset_ids, AssetStatus::InTransit, AssetStatus::Delivered)
                .await?;
            if delivered != asset_ids.len() as u64 {
                // Estado misto (entregue/em trânsito) nunca pode persistir.
                return Err(AppError::AssetNotInTransit);
            }
        }

        let updated = self
            .transfer_repo
            .complete(&mut *tx, id, request.delivery_lat, request.delivery_lng)
            .await?;
        if updated == 0 {
            return Err(AppError::TransferAlreadyClosed);
        }

        let confirmed = self
            .transfer_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::TransferNotFound)?;

        tx.commit().await?;

        self.audit.log(AuditEntry::new(
            "transfer_confirmed",
            "transfer",
            id,
            json!({
                "assets": asset_ids.len(),
                "deliveryLat": request.delivery_lat,
                "deliveryLng": request.delivery_lng,
            }),
        ));

        Ok(confirmed)
    }

    // ---
    // correções em trânsito
    // ---

    /// Desvincula um ativo de uma transferência aberta e o devolve ao local
    /// indicado. O status da transferência não muda, mesmo que ela fique
    /// vazia.
    pub async fn remove_asset<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        asset_id: Uuid,
        target_location_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self
            .transfer_repo
            .find_by_id(&mut *tx, transfer_id)
            .await?
            .ok_or(AppError::TransferNotFound)?;
        if !transfer.status.is_open() {
            return Err(AppError::TransferAlreadyClosed);
        }

        self.location_repo
            .find_by_id(&mut *tx, target_location_id)
            .await?
            .ok_or(AppError::LocationNotFound)?;

        // Apagar a linha de movimentação é o que "solta" o ativo.
        let detached = self
            .transfer_repo
            .delete_asset_movement(&mut *tx, transfer_id, asset_id)
            .await?;
        if detached == 0 {
            return Err(AppError::AssetNotFound);
        }

        let restored = self
            .asset_repo
            .set_status(&mut *tx, &[asset_id], AssetStatus::InTransit, AssetStatus::InStock)
            .await?;
        if restored == 0 {
            return Err(AppError::AssetNotInTransit);
        }
        self.asset_repo
            .set_location(&mut *tx, &[asset_id], target_location_id)
            .await?;

        tx.commit().await?;

        self.audit.log(AuditEntry::new(
            "asset_removed_from_transfer",
            "asset",
            asset_id,
            json!({ "transferId": transfer_id, "targetLocationId": target_location_id }),
        ));

        Ok(())
    }

    /// Reduz (ou zera) a reserva de estoque de uma transferência aberta e
    /// devolve a mesma quantidade ao balde de origem pré-transferência.
    pub async fn remove_stock<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        request: &RemoveStockRequest,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let transfer = self
            .transfer_repo
            .find_by_id(&mut *tx, transfer_id)
            .await?
            .ok_or(AppError::TransferNotFound)?;
        if !transfer.status.is_open() {
            return Err(AppError::TransferAlreadyClosed);
        }

        let movement = self
            .transfer_repo
            .find_stock_movement(&mut *tx, transfer_id, request.category_id, &request.origin)
            .await?
            .ok_or(AppError::StockMovementNotFound)?;

        // 1. Reduz a reserva; pedir mais do que resta é falha dura.
        let reduced = self
            .transfer_repo
            .try_decrement_stock_movement(&mut *tx, movement.id, request.quantity)
            .await?;
        if reduced == 0 {
            return Err(AppError::InsufficientQuantity);
        }

        // 2. Reserva zerou: a linha sai.
        self.transfer_repo
            .delete_stock_movement_if_empty(&mut *tx, movement.id)
            .await?;

        // 3. Devolve do destino para o balde de origem pré-transferência.
        //    O decremento condicional no destino também protege contra o
        //    caso de a quantidade já ter sido movida adiante.
        self.stock_service
            .move_quantity(
                &mut *tx,
                request.category_id,
                &request.origin,
                request.quantity,
                transfer.to_location_id,
                movement.from_location_id,
            )
            .await?;

        tx.commit().await?;

        self.audit.log(AuditEntry::new(
            "stock_removed_from_transfer",
            "transfer",
            transfer_id,
            json!({
                "categoryId": request.category_id,
                "origin": request.origin,
                "quantity": request.quantity,
                "restoredTo": movement.from_location_id,
            }),
        ));

        Ok(())
    }

    // ---
    // auditoria do initiate: uma entrada por unidade movida + uma da
    // transferência
    // ---

    fn audit_create(&self, transfer: &Transfer, request: &CreateTransferRequest) {
        for asset_id in &request.asset_ids {
            self.audit.log(AuditEntry::new(
                "asset_transferred",
                "asset",
                *asset_id,
                json!({
                    "transferId": transfer.id,
                    "fromLocationId": request.from_location_id,
                    "toLocationId": request.to_location_id,
                }),
            ));
        }
        let stock_lines = request.merged_stock_lines();
        for line in &stock_lines {
            self.audit.log(AuditEntry::new(
                "stock_transferred",
                "category",
                line.category_id,
                json!({
                    "transferId": transfer.id,
                    "origin": line.origin,
                    "quantity": line.quantity,
                    "fromLocationId": request.from_location_id,
                    "toLocationId": request.to_location_id,
                }),
            ));
        }
        self.audit.log(AuditEntry::new(
            "transfer_created",
            "transfer",
            transfer.id,
            json!({
                "assets": request.asset_ids.len(),
                "stockLines": stock_lines.len(),
            }),
        ));
    }
}

// Os testes abaixo rodam contra um banco de verdade (um por teste, com as
// migrações aplicadas): condicionais de UPDATE e corridas entre transações
// não se reproduzem em memória.
#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    use crate::{
        db::{
            filters::StockFilter, AssetRepository, CategoryRepository, LocationRepository,
            StockRepository, TransferRepository,
        },
        models::{
            category::CategoryKind,
            transfer::{StockLine, TransferStatus},
        },
    };

    fn service(pool: &PgPool) -> TransferService {
        let asset_repo = AssetRepository::new(pool.clone());
        let stock_repo = StockRepository::new(pool.clone());
        TransferService::new(
            TransferRepository::new(pool.clone()),
            asset_repo.clone(),
            LocationRepository::new(pool.clone()),
            StockService::new(stock_repo.clone()),
            ValidationService::new(asset_repo, stock_repo),
            AuditRecorder::spawn_with(|_e: AuditEntry| async { Ok(()) }),
        )
    }

    /// Almoxarifado padrão + um destino.
    async fn seed_locais(pool: &PgPool) -> (Uuid, Uuid) {
        let locations = LocationRepository::new(pool.clone());
        let origem = locations.create(pool, "Almoxarifado", None, true).await.unwrap();
        let destino = locations.create(pool, "Escola A", None, false).await.unwrap();
        (origem.id, destino.id)
    }

    async fn seed_categoria(pool: &PgPool, name: &str, kind: CategoryKind) -> Uuid {
        CategoryRepository::new(pool.clone())
            .create(pool, name, kind)
            .await
            .unwrap()
            .id
    }

    fn pedido_de_estoque(
        from: Uuid,
        to: Uuid,
        category_id: Uuid,
        origin: &str,
        quantity: i32,
    ) -> CreateTransferRequest {
        CreateTransferRequest {
            from_location_id: from,
            to_location_id: to,
            asset_ids: vec![],
            stock_lines: vec![StockLine {
                category_id,
                origin: origin.into(),
                quantity,
            }],
        }
    }

    #[sqlx::test]
    async fn transferencia_completa_conserva_ativos_e_quantidades(pool: PgPool) {
        let (origem, destino) = seed_locais(&pool).await;
        let cat_serial = seed_categoria(&pool, "Notebook", CategoryKind::Serialized).await;
        let cat_estoque = seed_categoria(&pool, "Cabo HDMI", CategoryKind::Stock).await;

        let assets = AssetRepository::new(pool.clone());
        let ativo = assets
            .create(&pool, Some("SN-1"), "PYR-00001", cat_serial, origem)
            .await
            .unwrap();
        let stock = StockRepository::new(pool.clone());
        stock
            .upsert_increment(&pool, cat_estoque, origem, "NF-1", 10)
            .await
            .unwrap();

        let svc = service(&pool);
        let mut req = pedido_de_estoque(origem, destino, cat_estoque, "NF-1", 4);
        req.asset_ids.push(ativo.id);
        let transfer = svc.create_transfer(&pool, &req).await.unwrap();
        assert_eq!(transfer.status, TransferStatus::InTransit);

        // Em trânsito: ativo já aponta para o destino, e as 10 unidades
        // continuam existindo (6 na origem + 4 no destino).
        let em_transito = assets.find_by_id(&pool, ativo.id).await.unwrap().unwrap();
        assert_eq!(em_transito.status, AssetStatus::InTransit);
        assert_eq!(em_transito.location_id, destino);
        assert_eq!(
            stock.available_quantity(&pool, cat_estoque, origem, "NF-1").await.unwrap(),
            6
        );
        assert_eq!(
            stock.available_quantity(&pool, cat_estoque, destino, "NF-1").await.unwrap(),
            4
        );

        let confirmada = svc
            .confirm_transfer(&pool, transfer.id, &ConfirmDeliveryRequest::default())
            .await
            .unwrap();
        assert_eq!(confirmada.status, TransferStatus::Completed);
        assert!(confirmada.delivered_at.is_some());

        let entregue = assets.find_by_id(&pool, ativo.id).await.unwrap().unwrap();
        assert_eq!(entregue.status, AssetStatus::Delivered);
    }

    #[sqlx::test]
    async fn corrida_pelas_ultimas_unidades_tem_um_so_vencedor(pool: PgPool) {
        let (origem, destino_a) = seed_locais(&pool).await;
        let destino_b = LocationRepository::new(pool.clone())
            .create(&pool, "Escola B", None, false)
            .await
            .unwrap()
            .id;
        let categoria = seed_categoria(&pool, "Mouse", CategoryKind::Stock).await;
        let stock = StockRepository::new(pool.clone());
        stock.upsert_increment(&pool, categoria, origem, "", 1).await.unwrap();

        let svc = service(&pool);
        let req_a = pedido_de_estoque(origem, destino_a, categoria, "", 1);
        let req_b = pedido_de_estoque(origem, destino_b, categoria, "", 1);
        let (a, b) = tokio::join!(
            svc.create_transfer(&pool, &req_a),
            svc.create_transfer(&pool, &req_b),
        );

        // Exatamente uma transação reivindica a última unidade; a outra
        // reprova na pré-validação ou perde o compare-and-decrement.
        assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
        for resultado in [a, b] {
            if let Err(err) = resultado {
                assert!(matches!(
                    err,
                    AppError::ValidationFailed(_) | AppError::InsufficientQuantity
                ));
            }
        }

        // Conservação: a unidade existe em exatamente um dos três locais.
        let mut total = 0;
        for local in [origem, destino_a, destino_b] {
            total += stock.available_quantity(&pool, categoria, local, "").await.unwrap();
        }
        assert_eq!(total, 1);
    }

    #[sqlx::test]
    async fn remove_stock_devolve_tudo_e_recolhe_o_balde_zerado(pool: PgPool) {
        let (origem, destino) = seed_locais(&pool).await;
        let categoria = seed_categoria(&pool, "Teclado", CategoryKind::Stock).await;
        let stock = StockRepository::new(pool.clone());
        stock
            .upsert_increment(&pool, categoria, origem, "NF-7", 5)
            .await
            .unwrap();

        let svc = service(&pool);
        let transfer = svc
            .create_transfer(&pool, &pedido_de_estoque(origem, destino, categoria, "NF-7", 5))
            .await
            .unwrap();

        svc.remove_stock(
            &pool,
            transfer.id,
            &RemoveStockRequest {
                category_id: categoria,
                origin: "NF-7".into(),
                quantity: 5,
            },
        )
        .await
        .unwrap();

        // Tudo de volta na origem; o balde do destino zerou e foi recolhido.
        assert_eq!(
            stock.available_quantity(&pool, categoria, origem, "NF-7").await.unwrap(),
            5
        );
        let no_destino = stock
            .list(&StockFilter {
                location_id: Some(destino),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(no_destino.is_empty());

        // A movimentação zerada saiu, mas a transferência continua aberta.
        let detalhe = svc.get_transfer(&pool, transfer.id).await.unwrap();
        assert!(detalhe.stock_movements.is_empty());
        assert_eq!(detalhe.header.status, TransferStatus::InTransit);
    }

    #[sqlx::test]
    async fn confirmacao_e_tudo_ou_nada(pool: PgPool) {
        let (origem, destino) = seed_locais(&pool).await;
        let categoria = seed_categoria(&pool, "Projetor", CategoryKind::Serialized).await;
        let assets = AssetRepository::new(pool.clone());
        let ativo_a = assets
            .create(&pool, None, "PYR-00010", categoria, origem)
            .await
            .unwrap();
        let ativo_b = assets
            .create(&pool, None, "PYR-00011", categoria, origem)
            .await
            .unwrap();

        let svc = service(&pool);
        let transfer = svc
            .create_transfer(
                &pool,
                &CreateTransferRequest {
                    from_location_id: origem,
                    to_location_id: destino,
                    asset_ids: vec![ativo_a.id, ativo_b.id],
                    stock_lines: vec![],
                },
            )
            .await
            .unwrap();

        // Um dos ativos escapa de IN_TRANSIT por fora do fluxo.
        sqlx::query("UPDATE assets SET status = 'IN_STOCK' WHERE id = $1")
            .bind(ativo_b.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = svc
            .confirm_transfer(&pool, transfer.id, &ConfirmDeliveryRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AssetNotInTransit));

        // Nada foi aplicado: a transferência segue aberta e o ativo íntegro
        // não virou DELIVERED.
        let detalhe = svc.get_transfer(&pool, transfer.id).await.unwrap();
        assert_eq!(detalhe.header.status, TransferStatus::InTransit);
        let intacto = assets.find_by_id(&pool, ativo_a.id).await.unwrap().unwrap();
        assert_eq!(intacto.status, AssetStatus::InTransit);
    }
}
