pub mod health;
pub mod pricing;
pub mod services;
pub mod stats;
pub mod well_known;

use actix_web::{HttpResponse, Responder};

use crate::services::ALL_SERVICES;

/// JSON 404 listing what the agent actually serves.
pub async fn not_found() -> impl Responder {
    let paid: Vec<String> = ALL_SERVICES
        .iter()
        .map(|s| format!("POST {}", s.endpoint()))
        .collect();

    HttpResponse::NotFound().json(serde_json::json!({
        "error": "Endpoint not found",
        "available_endpoints": {
            "free": [
                "GET /",
                "GET /api/health",
                "GET /api/pricing",
                "GET /api/stats",
                "POST /api/try",
            ],
            "paid": paid,
        },
    }))
}
