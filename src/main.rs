// src/main.rs

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

mod config; // Layered configuration and logging setup
mod dashboard; // Admin dashboard aggregations
mod error; // AppError and its HTTP rendering
mod notifications; // Low-stock alerts over SMS
mod products; // Catalog: products and variants
mod sales; // Sale recording and history
mod shared; // Response envelope
mod store; // Data-store seam used by the sale recorder
mod users; // Registration, login, JWT extractor

use notifications::{twilio::TwilioClient, LowStockDispatcher, SmsLowStockNotifier};
use sales::sale_recorder::SaleRecorder;
use store::PgStore;

// Shared state: connection pool and the sale recorder built on top of it.
pub struct AppState {
    pub db_pool: Pool<Postgres>,
    pub recorder: SaleRecorder<PgStore>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config = config::load_config().map_err(|e| {
        eprintln!("Invalid configuration: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    config.logging.init();

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to connect to PostgreSQL");
            std::io::Error::new(std::io::ErrorKind::Other, e)
        })?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&db_pool).await.map_err(|e| {
            tracing::error!(error = %e, "failed to apply migrations");
            std::io::Error::new(std::io::ErrorKind::Other, e)
        })?;
    }

    let store = Arc::new(PgStore::new(db_pool.clone()));
    let sms = config.sms.credentials().map(TwilioClient::new);
    if sms.is_none() {
        tracing::warn!("Twilio not configured, low-stock SMS alerts are disabled");
    }
    let dispatcher = LowStockDispatcher::new(Arc::new(SmsLowStockNotifier::new(store.clone(), sms)));
    let recorder = SaleRecorder::new(store, dispatcher, config.sales.stock_policy);

    let app_state = web::Data::new(AppState { db_pool, recorder });
    let shutdown_state = app_state.clone();
    let auth_config = web::Data::new(config.auth.clone());

    let bind = (config.server.host.clone(), config.server.port);
    tracing::info!(
        host = %bind.0,
        port = bind.1,
        stock_policy = ?config.sales.stock_policy,
        "starting bijou API"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .app_data(auth_config.clone())
            // Users
            .service(users::users_router::register_user)
            .service(users::users_router::login_user)
            .service(users::users_router::current_user)
            // Catalog
            .service(products::products_router::list_products)
            .service(products::products_router::create_product)
            .service(products::products_router::list_low_stock)
            .service(products::products_router::create_variant)
            .service(products::products_router::update_variant)
            .service(products::products_router::delete_variant)
            // Sales
            .service(sales::sales_router::record_sale)
            .service(sales::sales_router::list_sales)
            // Dashboard
            .service(dashboard::dashboard_router::dashboard)
            .service(dashboard::dashboard_router::sales_chart)
    })
    .bind(bind)?
    .run()
    .await?;

    // let in-flight alerts finish before exiting
    shutdown_state.recorder.dispatcher().drain().await;
    Ok(())
}
