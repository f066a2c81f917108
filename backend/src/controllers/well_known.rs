//! Agent identity surfaces: the root index, the x402 manifest, and the
//! ERC-8004 agent card. All public, no auth.

use actix_web::{HttpResponse, Responder, web};

use crate::AppState;
use crate::controllers::health::VERSION;
use crate::services::{AGENT_NAME, ALL_SERVICES};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(agent_index)));
    cfg.service(
        web::scope("/.well-known")
            .route("/x402-manifest.json", web::get().to(x402_manifest))
            .route("/8004-agent.json", web::get().to(agent_card)),
    );
}

/// Per-route x402 payment config, keyed "POST /api/{service}".
fn x402_routes(wallet: &str) -> serde_json::Value {
    let mut routes = serde_json::Map::new();
    for service in ALL_SERVICES {
        routes.insert(
            format!("POST {}", service.endpoint()),
            serde_json::json!({
                "price": service.price_str(),
                "currency": "USDC",
                "network": "base",
                "recipient": wallet,
                "description": service.description(),
            }),
        );
    }
    serde_json::Value::Object(routes)
}

async fn agent_index(state: web::Data<AppState>) -> impl Responder {
    let wallet = &state.config.wallet_address;
    let paid: Vec<serde_json::Value> = ALL_SERVICES
        .iter()
        .map(|service| {
            serde_json::json!({
                "method": "POST",
                "path": service.endpoint(),
                "price": format!("${} USDC", service.price_str()),
                "description": service.description(),
            })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "name": AGENT_NAME,
        "version": VERSION,
        "type": "AI Inference Reseller Agent",
        "description": "Autonomous AI agent selling inference services via x402 micro-payments. Registered on-chain via ERC-8004.",
        "identity": {
            "standard": "ERC-8004",
            "chain": "Base",
            "wallet": wallet,
            "payment": "x402 (USDC on Base)",
        },
        "endpoints": {
            "free": ["GET /api/health", "GET /api/pricing", "GET /api/stats"],
            "paid": paid,
        },
        "x402": x402_routes(wallet),
        "links": {
            "x402_docs": "https://docs.cdp.coinbase.com/x402/welcome",
            "8004scan": "https://www.8004scan.io",
        },
    }))
}

async fn x402_manifest(state: web::Data<AppState>) -> impl Responder {
    let wallet = &state.config.wallet_address;
    HttpResponse::Ok().json(serde_json::json!({
        "name": AGENT_NAME,
        "description": "AI Inference Reseller - Pay per request via x402",
        "version": VERSION,
        "url": state.config.public_url,
        "identity": { "standard": "ERC-8004", "chain": "base", "wallet": wallet },
        "payment": {
            "protocol": "x402",
            "currency": "USDC",
            "network": "base",
            "recipient": wallet,
        },
        "routes": x402_routes(wallet),
    }))
}

async fn agent_card(state: web::Data<AppState>) -> impl Responder {
    let services: Vec<&str> = ALL_SERVICES.iter().map(|s| s.as_str()).collect();
    HttpResponse::Ok().json(serde_json::json!({
        "name": AGENT_NAME,
        "description": "Autonomous AI inference reseller agent. Pay-per-request AI services via x402 micro-payments.",
        "standard": "ERC-8004",
        "chain": "base",
        "wallet": state.config.wallet_address,
        "url": state.config.public_url,
        "api_base": format!("http://localhost:{}", state.config.port),
        "services": services,
        "payment": "x402 (USDC on Base)",
        "status": "active",
    }))
}
