//! The five paid inference endpoints plus the free playground endpoint.
//!
//! All paid handlers share one code path: payment gate, input extraction,
//! prompt assembly, upstream call, usage log, JSON response.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Instant;

use crate::AppState;
use crate::db::NewRequestLog;
use crate::services::{AGENT_NAME, ServiceKey};
use crate::x402;

const MAX_TRY_INPUT_CHARS: usize = 10_000;

/// Body accepted by the paid endpoints. The user input may arrive as the
/// generic `input` or the service-specific alias (`text`, `code`, `topic`,
/// `idea`); prompt options come from the `options` map plus any extra
/// string-valued top-level fields.
#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    idea: Option<String>,
    #[serde(default)]
    options: Option<HashMap<String, String>>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

impl ServiceRequest {
    fn user_input(&self) -> Option<&str> {
        [&self.input, &self.text, &self.code, &self.topic, &self.idea]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|s| !s.is_empty()))
    }

    /// Merge the options map with loose top-level string fields; the loose
    /// fields win, matching how callers commonly pass `to`, `level`, etc.
    fn merged_options(&self) -> HashMap<String, String> {
        let mut options = self.options.clone().unwrap_or_default();
        for (key, value) in &self.extra {
            if let serde_json::Value::String(s) = value {
                options.insert(key.clone(), s.clone());
            }
        }
        options
    }
}

#[derive(Debug, Deserialize)]
pub struct TryRequest {
    service: ServiceKey,
    input: String,
    #[serde(default)]
    options: Option<HashMap<String, String>>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/summarize").route(web::post().to(summarize)));
    cfg.service(web::resource("/api/translate").route(web::post().to(translate)));
    cfg.service(web::resource("/api/code-review").route(web::post().to(code_review)));
    cfg.service(web::resource("/api/explain").route(web::post().to(explain)));
    cfg.service(web::resource("/api/generate-prompt").route(web::post().to(generate_prompt)));
    cfg.service(web::resource("/api/try").route(web::post().to(try_service)));
}

async fn summarize(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ServiceRequest>,
) -> HttpResponse {
    run_paid_service(ServiceKey::Summarize, state, req, body.into_inner()).await
}

async fn translate(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ServiceRequest>,
) -> HttpResponse {
    run_paid_service(ServiceKey::Translate, state, req, body.into_inner()).await
}

async fn code_review(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ServiceRequest>,
) -> HttpResponse {
    run_paid_service(ServiceKey::CodeReview, state, req, body.into_inner()).await
}

async fn explain(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ServiceRequest>,
) -> HttpResponse {
    run_paid_service(ServiceKey::Explain, state, req, body.into_inner()).await
}

async fn generate_prompt(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ServiceRequest>,
) -> HttpResponse {
    run_paid_service(ServiceKey::GeneratePrompt, state, req, body.into_inner()).await
}

async fn run_paid_service(
    service: ServiceKey,
    state: web::Data<AppState>,
    req: HttpRequest,
    body: ServiceRequest,
) -> HttpResponse {
    let paid = match x402::require_payment(&state.config, &req, service).await {
        Ok(paid) => paid,
        Err(response) => return response,
    };

    let user_input = match body.user_input() {
        Some(input) => input.to_string(),
        None => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": format!(
                    "Missing input. Provide 'input' or '{}' field.",
                    service.input_alias()
                ),
            }));
        }
    };

    let options = body.merged_options();
    let system_prompt = service.system_prompt(&options);

    let started = Instant::now();
    let result = match state
        .inference
        .generate(&system_prompt, &user_input, service.max_tokens())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            log::error!("Inference error on {}: {}", service.endpoint(), e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Inference failed",
                "message": e,
            }));
        }
    };
    let duration_ms = started.elapsed().as_millis() as i64;

    log_request(&state, service, &user_input, &result, duration_ms, paid);

    HttpResponse::Ok().json(serde_json::json!({
        "service": service.as_str(),
        "result": result,
        "price_charged": format!("${} USDC", service.price_str()),
        "duration_ms": duration_ms,
        "agent": AGENT_NAME,
    }))
}

async fn try_service(state: web::Data<AppState>, body: web::Json<TryRequest>) -> HttpResponse {
    let body = body.into_inner();
    let input_chars = body.input.chars().count();
    if input_chars == 0 || input_chars > MAX_TRY_INPUT_CHARS {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid request",
            "errors": [format!("'input' must be between 1 and {} characters", MAX_TRY_INPUT_CHARS)],
        }));
    }

    let options = body.options.unwrap_or_default();
    let system_prompt = body.service.system_prompt(&options);

    let started = Instant::now();
    let result = match state
        .inference
        .generate(&system_prompt, &body.input, body.service.max_tokens())
        .await
    {
        Ok(result) => result,
        Err(e) => {
            log::error!("Try endpoint error: {}", e);
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "message": e,
            }));
        }
    };
    let duration_ms = started.elapsed().as_millis() as i64;

    // The playground is always free.
    log_request(&state, body.service, &body.input, &result, duration_ms, false);

    HttpResponse::Ok().json(serde_json::json!({
        "service": body.service.as_str(),
        "result": result,
        "price_usdc": body.service.price_usdc(),
        "duration_ms": duration_ms,
        "agent": AGENT_NAME,
    }))
}

/// Record a completed call. A failed insert loses one accounting row; the
/// caller already has their result, so respond normally and log the error.
fn log_request(
    state: &web::Data<AppState>,
    service: ServiceKey,
    input: &str,
    output: &str,
    duration_ms: i64,
    paid: bool,
) {
    let entry = NewRequestLog {
        endpoint: service.endpoint(),
        service: service.as_str().to_string(),
        price_usdc: service.price_usdc(),
        input_length: input.chars().count() as i64,
        output_length: output.chars().count() as i64,
        duration_ms,
        paid: paid as i64,
    };
    if let Err(e) = state.db.insert_request_log(&entry) {
        log::error!("Failed to log request for {}: {}", service.endpoint(), e);
    }
}
