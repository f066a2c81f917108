use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::{DateTime, Utc};
use dotenv::dotenv;
use std::sync::Arc;

mod ai;
mod config;
mod controllers;
mod db;
mod http;
mod services;
mod x402;

use ai::InferenceClient;
use config::Config;
use db::Database;
use services::ALL_SERVICES;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub inference: Arc<InferenceClient>,
    pub started_at: DateTime<Utc>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url).expect("Failed to initialize database"));

    let inference =
        Arc::new(InferenceClient::new(&config).expect("Failed to initialize inference client"));

    let started_at = Utc::now();

    log::info!(
        "Starting MindForHire server on port {} (x402 {})",
        port,
        if config.x402_enabled { "enabled" } else { "disabled" }
    );
    log::info!("Receiving wallet: {}", config.wallet_address);
    for service in ALL_SERVICES {
        log::info!("  POST {}  ${} USDC", service.endpoint(), service.price_str());
    }

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                inference: Arc::clone(&inference),
                started_at,
            }))
            // Matches the upstream's request body ceiling.
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::pricing::config)
            .configure(controllers::stats::config)
            .configure(controllers::services::config)
            .configure(controllers::well_known::config)
            .default_service(web::route().to(controllers::not_found))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
