//! x402 Protocol data types

use serde::{Deserialize, Serialize};

/// USDC contract address on Base mainnet
pub const USDC_ADDRESS: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";

/// Base mainnet chain ID
pub const BASE_CHAIN_ID: u64 = 8453;

/// x402 protocol version
pub const X402_VERSION: u8 = 1;

/// Network identifier for Base
pub const NETWORK_ID: &str = "eip155:8453";

/// Refuse to sign any authorization above this many USDC base units (1 USDC
/// at 6 decimals). A reseller call should never cost more.
pub const MAX_SANE_AMOUNT: u64 = 1_000_000;

/// Deadline applied when the requirement does not carry one, in seconds.
pub const DEFAULT_DEADLINE_SECS: u64 = 300;

/// Payment requirements returned by the upstream in a 402 response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequired {
    #[serde(default)]
    pub x402_version: u8,
    pub accepts: Vec<PaymentRequirements>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub max_amount_required: String,
    #[serde(alias = "payToAddress")]
    pub pay_to: String,
    #[serde(default, alias = "usdcAddress")]
    pub asset: Option<String>,
    #[serde(default)]
    pub max_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub required_deadline_seconds: Option<u64>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extra: Option<RequirementExtra>,
}

/// EIP-712 domain hints some upstreams attach to the requirement.
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementExtra {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PaymentRequirements {
    /// Deadline in seconds granted by this requirement for the authorization.
    pub fn deadline_seconds(&self) -> u64 {
        self.max_timeout_seconds
            .or(self.required_deadline_seconds)
            .unwrap_or(DEFAULT_DEADLINE_SECS)
    }
}

/// Payment payload sent upstream in the X-PAYMENT header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u8,
    pub scheme: String,
    pub network: String,
    pub payload: ExactEvmPayload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    pub signature: String,
    pub authorization: Eip3009Authorization,
}

/// EIP-3009 TransferWithAuthorization, integers stringified for the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip3009Authorization {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
}

impl PaymentPayload {
    /// Encode the payment payload to base64 for the X-PAYMENT header.
    pub fn to_base64(&self) -> Result<String, String> {
        let json = serde_json::to_string(self)
            .map_err(|e| format!("Failed to serialize payment payload: {}", e))?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            json,
        ))
    }
}
