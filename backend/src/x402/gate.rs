//! Inbound payment gate for paid endpoints.
//!
//! Callers that arrive without a payment signature get an HTTP 402 describing
//! what to pay; callers that attach one get it verified against the external
//! facilitator before the handler runs.

use actix_web::{HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::config::Config;
use crate::http;
use crate::services::{AGENT_NAME, ServiceKey};

const SIGNATURE_HEADERS: [&str; 2] = ["payment-signature", "x-payment-signature"];

#[derive(Debug, Deserialize)]
struct VerifyOutcome {
    #[serde(default)]
    valid: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// Gate a paid endpoint behind an x402 payment signature.
///
/// Returns `Ok(true)` when the request paid (x402 enabled and the signature
/// verified), `Ok(false)` when the gate is disabled, and `Err` with the
/// response to send otherwise.
pub async fn require_payment(
    config: &Config,
    req: &HttpRequest,
    service: ServiceKey,
) -> Result<bool, HttpResponse> {
    if !config.x402_enabled {
        return Ok(false);
    }

    let signature = SIGNATURE_HEADERS
        .iter()
        .find_map(|name| req.headers().get(*name))
        .and_then(|v| v.to_str().ok());

    let signature = match signature {
        Some(s) => s,
        None => return Err(payment_required(config, service)),
    };

    let verification = http::shared_client()
        .post(format!("{}/verify", config.x402_facilitator_url))
        .json(&serde_json::json!({
            "payload": signature,
            "recipient": config.wallet_address,
            "amount": service.price_str(),
            "currency": "USDC",
            "network": "base",
        }))
        .send()
        .await;

    let response = match verification {
        Ok(r) => r,
        Err(e) => {
            log::error!("x402 verification error: {}", e);
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Payment verification service unavailable",
                "message": "Try again later.",
            })));
        }
    };

    if !response.status().is_success() {
        return Err(HttpResponse::PaymentRequired().json(serde_json::json!({
            "error": "Payment verification failed",
            "message": "The payment signature could not be verified. Please retry.",
        })));
    }

    let outcome: VerifyOutcome = match response.json().await {
        Ok(o) => o,
        Err(e) => {
            log::error!("x402 verification error: {}", e);
            return Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Payment verification service unavailable",
                "message": "Try again later.",
            })));
        }
    };

    if !outcome.valid {
        return Err(HttpResponse::PaymentRequired().json(serde_json::json!({
            "error": "Invalid payment",
            "message": outcome.reason.unwrap_or_else(|| "Payment was not valid.".to_string()),
        })));
    }

    Ok(true)
}

/// 402 response advertising the payment terms for a service.
fn payment_required(config: &Config, service: ServiceKey) -> HttpResponse {
    let terms = serde_json::json!({
        "scheme": "exact",
        "amount": service.price_str(),
        "currency": "USDC",
        "network": "base",
        "recipient": config.wallet_address,
        "facilitator": config.x402_facilitator_url,
        "description": format!("{} API - ${} USDC", AGENT_NAME, service.price_str()),
    });

    HttpResponse::PaymentRequired()
        .insert_header(("X-Payment-Required", terms.to_string()))
        .json(serde_json::json!({
            "error": "Payment Required",
            "payment": {
                "amount": service.price_str(),
                "currency": "USDC",
                "network": "base",
                "recipient": config.wallet_address,
                "scheme": "exact",
                "facilitator": config.x402_facilitator_url,
            },
            "instructions": "Sign a payment transaction and retry with the PAYMENT-SIGNATURE header.",
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::{App, HttpServer, body, web};

    fn test_config(x402_enabled: bool) -> Config {
        Config {
            wallet_address: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
            conway_api_key: None,
            conway_wallet_private_key: None,
            conway_inference_url: crate::config::DEFAULT_INFERENCE_URL.to_string(),
            conway_model: "claude-sonnet-4.5".to_string(),
            x402_facilitator_url: crate::config::DEFAULT_FACILITATOR_URL.to_string(),
            x402_enabled,
            port: 3000,
            database_url: ":memory:".to_string(),
            public_url: crate::config::DEFAULT_PUBLIC_URL.to_string(),
        }
    }

    async fn verify_stub(data: web::Data<(StatusCode, serde_json::Value)>) -> HttpResponse {
        let (status, response_body) = data.get_ref();
        HttpResponse::build(*status).json(response_body)
    }

    /// Bind a one-route facilitator on an ephemeral port and return its URL.
    async fn spawn_facilitator(status: StatusCode, response_body: serde_json::Value) -> String {
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new((status, response_body.clone())))
                .route("/verify", web::post().to(verify_stub))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{}", addr)
    }

    fn signed_request() -> actix_web::HttpRequest {
        TestRequest::default()
            .insert_header(("payment-signature", "0xsigned"))
            .to_http_request()
    }

    #[actix_web::test]
    async fn test_disabled_gate_passes_unpaid() {
        let req = TestRequest::default().to_http_request();
        let paid = require_payment(&test_config(false), &req, ServiceKey::Summarize)
            .await
            .unwrap();
        assert!(!paid);
    }

    #[actix_web::test]
    async fn test_missing_signature_gets_402_with_terms() {
        let req = TestRequest::default().to_http_request();
        let response = require_payment(&test_config(true), &req, ServiceKey::CodeReview)
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let terms = response
            .headers()
            .get("X-Payment-Required")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        let terms: serde_json::Value = serde_json::from_str(terms).unwrap();
        assert_eq!(terms["scheme"], "exact");
        assert_eq!(terms["amount"], "0.02");
        assert_eq!(terms["network"], "base");
    }

    #[actix_web::test]
    async fn test_verified_signature_passes_paid() {
        let mut config = test_config(true);
        config.x402_facilitator_url =
            spawn_facilitator(StatusCode::OK, serde_json::json!({ "valid": true })).await;

        let paid = require_payment(&config, &signed_request(), ServiceKey::Summarize)
            .await
            .unwrap();
        assert!(paid);
    }

    #[actix_web::test]
    async fn test_facilitator_error_status_gets_402() {
        let mut config = test_config(true);
        config.x402_facilitator_url =
            spawn_facilitator(StatusCode::INTERNAL_SERVER_ERROR, serde_json::json!({})).await;

        let response = require_payment(&config, &signed_request(), ServiceKey::Summarize)
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let response_body: serde_json::Value =
            serde_json::from_slice(&body::to_bytes(response.into_body()).await.unwrap()).unwrap();
        assert_eq!(response_body["error"], "Payment verification failed");
    }

    #[actix_web::test]
    async fn test_rejected_payment_carries_facilitator_reason() {
        let mut config = test_config(true);
        config.x402_facilitator_url = spawn_facilitator(
            StatusCode::OK,
            serde_json::json!({ "valid": false, "reason": "authorization expired" }),
        )
        .await;

        let response = require_payment(&config, &signed_request(), ServiceKey::Summarize)
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let response_body: serde_json::Value =
            serde_json::from_slice(&body::to_bytes(response.into_body()).await.unwrap()).unwrap();
        assert_eq!(response_body["error"], "Invalid payment");
        assert_eq!(response_body["message"], "authorization expired");
    }

    #[actix_web::test]
    async fn test_unreachable_facilitator_gets_500() {
        let mut config = test_config(true);
        // Nothing listens on port 1; the connection is refused.
        config.x402_facilitator_url = "http://127.0.0.1:1".to_string();

        let response = require_payment(&config, &signed_request(), ServiceKey::Summarize)
            .await
            .unwrap_err();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
