// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{AssetRepository, CategoryRepository, LocationRepository, StockRepository, TransferRepository},
    services::{
        audit_service::AuditRecorder,
        stock_service::StockService,
        transfer_service::TransferService,
        validation_service::ValidationService,
    },
};

// Toda a configuração entra por aqui, injetada na construção: nenhum estado
// mutável de pacote, nenhuma variável global.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub transfer_service: TransferService,
    pub stock_service: StockService,
    pub audit: AuditRecorder,
    pub transfer_repo: TransferRepository,
    pub asset_repo: AssetRepository,
    pub stock_repo: StockRepository,
    pub location_repo: LocationRepository,
    pub category_repo: CategoryRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let asset_repo = AssetRepository::new(db_pool.clone());
        let stock_repo = StockRepository::new(db_pool.clone());
        let transfer_repo = TransferRepository::new(db_pool.clone());
        let location_repo = LocationRepository::new(db_pool.clone());
        let category_repo = CategoryRepository::new(db_pool.clone());

        let audit = AuditRecorder::spawn(db_pool.clone());
        let stock_service = StockService::new(stock_repo.clone());
        let validation_service = ValidationService::new(asset_repo.clone(), stock_repo.clone());
        let transfer_service = TransferService::new(
            transfer_repo.clone(),
            asset_repo.clone(),
            location_repo.clone(),
            stock_service.clone(),
            validation_service,
            audit.clone(),
        );

        Ok(Self {
            db_pool,
            transfer_service,
            stock_service,
            audit,
            transfer_repo,
            asset_repo,
            stock_repo,
            location_repo,
            category_repo,
        })
    }
}
