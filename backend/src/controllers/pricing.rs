use actix_web::{HttpResponse, Responder, web};

use crate::AppState;
use crate::services::{AGENT_NAME, ALL_SERVICES};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/pricing").route(web::get().to(get_pricing)));
}

async fn get_pricing(state: web::Data<AppState>) -> impl Responder {
    let services: Vec<serde_json::Value> = ALL_SERVICES
        .iter()
        .map(|service| {
            serde_json::json!({
                "id": service.as_str(),
                "endpoint": service.endpoint(),
                "method": "POST",
                "price_usdc": service.price_usdc(),
                "description": service.description(),
            })
        })
        .collect();

    HttpResponse::Ok().json(serde_json::json!({
        "agent": AGENT_NAME,
        "payment_protocol": "x402",
        "currency": "USDC",
        "network": "Base",
        "wallet": state.config.wallet_address,
        "x402_enabled": state.config.x402_enabled,
        "services": services,
        "how_to_pay": {
            "step_1": "Send a POST request to any paid endpoint",
            "step_2": "Receive HTTP 402 with payment details in headers",
            "step_3": "Sign payment with your wallet",
            "step_4": "Retry request with PAYMENT-SIGNATURE header",
            "step_5": "Receive AI-generated response",
        },
    }))
}
