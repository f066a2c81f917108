use std::env;

/// Default upstream chat-completions endpoint (Conway inference API).
pub const DEFAULT_INFERENCE_URL: &str = "https://inference.conway.tech/v1/chat/completions";

/// Default x402 payment facilitator.
pub const DEFAULT_FACILITATOR_URL: &str = "https://facilitator.x402.org";

/// Public URL the agent advertises in its manifest and agent card.
pub const DEFAULT_PUBLIC_URL: &str = "https://mindforhire.xyz";

#[derive(Clone)]
pub struct Config {
    /// Receiving wallet for x402 payments. Required.
    pub wallet_address: String,
    /// Bearer key for the upstream inference API.
    pub conway_api_key: Option<String>,
    /// Private key used to sign outbound x402 payments when the upstream
    /// itself answers 402. Optional; without it a 402 from upstream is fatal
    /// for that request.
    pub conway_wallet_private_key: Option<String>,
    pub conway_inference_url: String,
    pub conway_model: String,
    pub x402_facilitator_url: String,
    /// When false, paid endpoints serve requests without a payment check.
    pub x402_enabled: bool,
    pub port: u16,
    pub database_url: String,
    /// Where the agent says it lives, for manifest/agent-card consumers.
    pub public_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let wallet_address = env::var("WALLET_ADDRESS").unwrap_or_default();
        if wallet_address.is_empty() {
            log::error!("WALLET_ADDRESS must be set to the agent's receiving wallet address");
            std::process::exit(1);
        }

        let conway_api_key = env::var("CONWAY_API_KEY").ok().filter(|k| !k.is_empty());
        if conway_api_key.is_none() {
            log::warn!("CONWAY_API_KEY not set. Inference calls will fail.");
        }

        Self {
            wallet_address,
            conway_api_key,
            conway_wallet_private_key: env::var("CONWAY_WALLET_PRIVATE_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            conway_inference_url: env::var("CONWAY_INFERENCE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            conway_model: env::var("CONWAY_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4.5".to_string()),
            x402_facilitator_url: env::var("X402_FACILITATOR_URL")
                .unwrap_or_else(|_| DEFAULT_FACILITATOR_URL.to_string()),
            x402_enabled: env::var("X402_ENABLED").as_deref() == Ok("true"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "./.db/mindforhire.db".to_string()),
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string()),
        }
    }
}
