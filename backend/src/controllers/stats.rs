use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;

use crate::AppState;
use crate::services::AGENT_NAME;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    limit: Option<i64>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/stats")
            .route("", web::get().to(get_stats))
            .route("/recent", web::get().to(get_recent)),
    );
}

async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    match state.db.get_stats() {
        Ok(stats) => HttpResponse::Ok().json(serde_json::json!({
            "agent": AGENT_NAME,
            "total_requests": stats.total_requests,
            "total_earned": stats.total_earned,
            "by_service": stats.by_service,
            "last_24h": stats.last_24h,
        })),
        Err(e) => {
            log::error!("Failed to fetch stats: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Failed to fetch stats"
            }))
        }
    }
}

async fn get_recent(state: web::Data<AppState>, query: web::Query<RecentQuery>) -> impl Responder {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    match state.db.get_recent_logs(limit) {
        Ok(logs) => HttpResponse::Ok().json(serde_json::json!({
            "agent": AGENT_NAME,
            "logs": logs,
        })),
        Err(e) => {
            log::error!("Failed to fetch recent logs: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "message": "Failed to fetch recent logs"
            }))
        }
    }
}
