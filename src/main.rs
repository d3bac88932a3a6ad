//src/main.rs

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod models;
mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Rotas do ciclo de vida das transferências
    let transfer_routes = Router::new()
        .route("/"
               ,post(handlers::transfers::create_transfer)
               .get(handlers::transfers::list_transfers)
        )
        .route("/{id}", get(handlers::transfers::get_transfer))
        .route("/{id}/confirm", post(handlers::transfers::confirm_transfer))
        .route("/{id}/assets/{asset_id}"
               ,delete(handlers::transfers::remove_asset_from_transfer)
        )
        .route("/{id}/stock/remove"
               ,post(handlers::transfers::remove_stock_from_transfer)
        );

    // Rotas de inventário (CRUD sem invariante entre entidades)
    let inventory_routes = Router::new()
        .route("/assets"
               ,post(handlers::inventory::create_asset)
               .get(handlers::inventory::list_assets)
        )
        .route("/assets/{id}", delete(handlers::inventory::delete_asset))
        .route("/stock", get(handlers::inventory::list_stock))
        .route("/stock-entry", post(handlers::inventory::stock_entry))
        .route("/locations"
               ,post(handlers::inventory::create_location)
               .get(handlers::inventory::list_locations)
        )
        .route("/categories"
               ,post(handlers::inventory::create_category)
               .get(handlers::inventory::list_categories)
        );

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/transfers", transfer_routes)
        .nest("/api/inventory", inventory_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let addr = "0.0.0.0:3000";
    let listener = TcpListener::bind(addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
