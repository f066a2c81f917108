use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;

use crate::AppState;
use crate::services::AGENT_NAME;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/api/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let uptime = (Utc::now() - state.started_at).num_seconds().max(0);

    HttpResponse::Ok().json(serde_json::json!({
        "status": "alive",
        "agent": AGENT_NAME,
        "version": VERSION,
        "wallet": state.config.wallet_address,
        "x402_enabled": state.config.x402_enabled,
        "uptime": uptime,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
