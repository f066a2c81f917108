//! Upstream inference client.
//!
//! One POST per user request against the Conway chat-completions endpoint.
//! If the upstream answers 402, the x402 handshake runs once: parse the
//! payment requirements from the body, sign with the agent wallet, retry with
//! the X-PAYMENT header. A second 402 is terminal for the request.

use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::x402::{NETWORK_ID, PaymentRequired, X402Signer};

pub struct InferenceClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    signer: Option<Arc<X402Signer>>,
    /// Receiving wallet, used in funding hints when payments fail.
    wallet_address: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// The upstream speaks either OpenAI-style `choices` or Anthropic-style
/// `content` blocks depending on the routed model; accept both.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl InferenceClient {
    pub fn new(config: &Config) -> Result<Self, String> {
        let signer = match &config.conway_wallet_private_key {
            Some(key) => {
                let signer = X402Signer::new(key)?;
                log::info!("[X402] Agent wallet ready for outbound payments: {}", signer.address());
                Some(Arc::new(signer))
            }
            None => None,
        };

        Ok(Self {
            client: crate::http::shared_client().clone(),
            endpoint: config.conway_inference_url.clone(),
            model: config.conway_model.clone(),
            api_key: config.conway_api_key.clone(),
            signer,
            wallet_address: config.wallet_address.clone(),
        })
    }

    /// Run one completion and return the generated text.
    pub async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
        max_tokens: u32,
    ) -> Result<String, String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            "Conway API key not configured. Set CONWAY_API_KEY to enable AI inference.".to_string()
        })?;

        let request = CompletionRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_message.to_string(),
                },
            ],
        };

        let mut response = self
            .client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Inference request failed: {}", e))?;

        if response.status() == StatusCode::PAYMENT_REQUIRED {
            response = self
                .retry_with_payment(response, api_key, &request)
                .await
                .map_err(|e| {
                    format!(
                        "x402 payment failed: {}. Fund the agent wallet ({}) with USDC on Base network.",
                        e, self.wallet_address
                    )
                })?;
        }

        if response.status() == StatusCode::PAYMENT_REQUIRED {
            return Err(format!(
                "Insufficient USDC balance. Fund the agent wallet ({}) with USDC on Base network to use AI inference.",
                self.wallet_address
            ));
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Inference failed: {} - {}", status.as_u16(), body));
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse inference response: {}", e))?;

        Ok(extract_text(data))
    }

    /// Sign the payment the 402 response demands and retry the call once.
    async fn retry_with_payment(
        &self,
        payment_response: reqwest::Response,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<reqwest::Response, String> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            "Agent wallet private key not configured. Cannot process x402 payment.".to_string()
        })?;

        let required: PaymentRequired = payment_response
            .json()
            .await
            .map_err(|e| format!("Failed to parse payment requirements: {}", e))?;

        if required.accepts.is_empty() {
            return Err("No payment requirements received from upstream.".to_string());
        }

        let requirements = required
            .accepts
            .iter()
            .find(|r| r.scheme == "exact" && r.network == NETWORK_ID)
            .ok_or_else(|| {
                "No supported payment option found (need exact scheme on Base network)."
                    .to_string()
            })?;

        let payload = signer.sign_payment(requirements)?;
        let payment_header = payload.to_base64()?;

        log::info!(
            "[X402] Signed payment of {} USDC base units, retrying with X-PAYMENT header",
            payload.payload.authorization.value
        );

        self.client
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .header("X-PAYMENT", payment_header)
            .json(request)
            .send()
            .await
            .map_err(|e| format!("Paid request failed: {}", e))
    }
}

fn extract_text(data: CompletionResponse) -> String {
    if let Some(choice) = data.choices.into_iter().next() {
        if !choice.message.content.is_empty() {
            return choice.message.content;
        }
    }
    data.content
        .into_iter()
        .find_map(|block| block.text)
        .unwrap_or_else(|| "No response generated".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_prefers_choices() {
        let data: CompletionResponse = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "content": "from choices" } }],
            "content": [{ "type": "text", "text": "from blocks" }]
        }))
        .unwrap();
        assert_eq!(extract_text(data), "from choices");
    }

    #[test]
    fn test_extract_text_falls_back_to_content_blocks() {
        let data: CompletionResponse = serde_json::from_value(serde_json::json!({
            "content": [{ "type": "text", "text": "from blocks" }]
        }))
        .unwrap();
        assert_eq!(extract_text(data), "from blocks");
    }

    #[test]
    fn test_extract_text_empty_response() {
        let data: CompletionResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(extract_text(data), "No response generated");
    }

    mod payment_flow {
        use super::super::*;
        use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
        use std::sync::atomic::{AtomicUsize, Ordering};

        // Hardhat's first default account, test-only key.
        const TEST_KEY: &str =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

        struct StubState {
            /// Whether an X-PAYMENT header satisfies the stub.
            settles: bool,
            calls: Arc<AtomicUsize>,
        }

        /// Upstream that demands payment on every unpaid call.
        async fn upstream_stub(req: HttpRequest, state: web::Data<StubState>) -> HttpResponse {
            state.calls.fetch_add(1, Ordering::SeqCst);

            if state.settles && req.headers().contains_key("x-payment") {
                return HttpResponse::Ok().json(serde_json::json!({
                    "choices": [{ "message": { "content": "paid result" } }]
                }));
            }

            HttpResponse::PaymentRequired().json(serde_json::json!({
                "x402Version": 1,
                "accepts": [{
                    "scheme": "exact",
                    "network": NETWORK_ID,
                    "maxAmountRequired": "5000",
                    "payTo": "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
                    "asset": crate::x402::USDC_ADDRESS,
                    "maxTimeoutSeconds": 300
                }]
            }))
        }

        async fn spawn_upstream(settles: bool) -> (String, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let calls_for_app = calls.clone();
            let server = HttpServer::new(move || {
                App::new()
                    .app_data(web::Data::new(StubState {
                        settles,
                        calls: calls_for_app.clone(),
                    }))
                    .route("/v1/chat/completions", web::post().to(upstream_stub))
            })
            .workers(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
            let addr = server.addrs()[0];
            actix_web::rt::spawn(server.run());
            (format!("http://{}/v1/chat/completions", addr), calls)
        }

        fn stub_config(endpoint: &str) -> Config {
            Config {
                wallet_address: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
                conway_api_key: Some("test-key".to_string()),
                conway_wallet_private_key: Some(TEST_KEY.to_string()),
                conway_inference_url: endpoint.to_string(),
                conway_model: "claude-sonnet-4.5".to_string(),
                x402_facilitator_url: crate::config::DEFAULT_FACILITATOR_URL.to_string(),
                x402_enabled: false,
                port: 3000,
                database_url: ":memory:".to_string(),
                public_url: crate::config::DEFAULT_PUBLIC_URL.to_string(),
            }
        }

        #[actix_web::test]
        async fn test_payment_handshake_retries_once_and_succeeds() {
            let (endpoint, calls) = spawn_upstream(true).await;
            let client = InferenceClient::new(&stub_config(&endpoint)).unwrap();

            let result = client.generate("system", "user", 256).await.unwrap();
            assert_eq!(result, "paid result");
            // Unpaid call, then exactly one paid retry.
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[actix_web::test]
        async fn test_second_402_is_terminal() {
            let (endpoint, calls) = spawn_upstream(false).await;
            let client = InferenceClient::new(&stub_config(&endpoint)).unwrap();

            let err = client.generate("system", "user", 256).await.unwrap_err();
            assert!(err.contains("Insufficient USDC balance"));
            assert_eq!(calls.load(Ordering::SeqCst), 2);
        }

        #[actix_web::test]
        async fn test_402_without_wallet_key_is_an_error() {
            let (endpoint, calls) = spawn_upstream(false).await;
            let mut config = stub_config(&endpoint);
            config.conway_wallet_private_key = None;
            let client = InferenceClient::new(&config).unwrap();

            let err = client.generate("system", "user", 256).await.unwrap_err();
            assert!(err.contains("private key not configured"));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }
}
