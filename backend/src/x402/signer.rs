//! EIP-3009 signing for x402 payments

use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use std::time::{SystemTime, UNIX_EPOCH};

use super::types::*;

/// Signs x402 payment authorizations with the agent's wallet key.
pub struct X402Signer {
    wallet: LocalWallet,
}

impl X402Signer {
    /// Create a signer from a private key (hex string with or without 0x prefix).
    pub fn new(private_key: &str) -> Result<Self, String> {
        let key_hex = private_key.strip_prefix("0x").unwrap_or(private_key);
        let key_bytes =
            hex::decode(key_hex).map_err(|e| format!("Invalid private key hex: {}", e))?;

        let signing_key = SigningKey::from_bytes(key_bytes.as_slice().into())
            .map_err(|e| format!("Invalid private key: {}", e))?;

        let wallet = LocalWallet::from(signing_key).with_chain_id(BASE_CHAIN_ID);

        Ok(Self { wallet })
    }

    /// Lowercase hex address of the signing wallet.
    pub fn address(&self) -> String {
        format!("{:?}", self.wallet.address()).to_lowercase()
    }

    /// Fresh random nonce for a single authorization.
    fn generate_nonce() -> H256 {
        let mut bytes = [0u8; 32];
        getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
        H256::from(keccak256(bytes))
    }

    /// Validate requirements and sign an EIP-3009 TransferWithAuthorization.
    ///
    /// Rejects anything that is not exact-scheme USDC on Base, and any amount
    /// above [`MAX_SANE_AMOUNT`], before a single byte is signed.
    pub fn sign_payment(
        &self,
        requirements: &PaymentRequirements,
    ) -> Result<PaymentPayload, String> {
        if requirements.network != NETWORK_ID {
            return Err(format!(
                "Unexpected payment network: {}. Expected {}.",
                requirements.network, NETWORK_ID
            ));
        }

        let asset = requirements
            .asset
            .as_deref()
            .unwrap_or(USDC_ADDRESS)
            .to_string();
        if asset.to_lowercase() != USDC_ADDRESS.to_lowercase() {
            return Err(format!(
                "Unexpected USDC contract: {}. Expected {}.",
                asset, USDC_ADDRESS
            ));
        }

        let value = U256::from_dec_str(&requirements.max_amount_required)
            .map_err(|e| format!("Invalid amount: {}", e))?;
        if value > U256::from(MAX_SANE_AMOUNT) {
            return Err(format!(
                "Payment amount too large: {}. Max allowed: {}.",
                value, MAX_SANE_AMOUNT
            ));
        }

        let to: Address = requirements
            .pay_to
            .parse()
            .map_err(|e| format!("Invalid payTo address: {}", e))?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("Time error: {}", e))?
            .as_secs();
        // Backdated 60s to absorb clock skew between us and the settlement chain.
        let valid_after = U256::from(now.saturating_sub(60));
        let valid_before = U256::from(now.saturating_add(requirements.deadline_seconds()));

        let nonce = Self::generate_nonce();

        let domain = Eip712Domain::for_requirement(requirements, &asset)?;
        let message = TransferWithAuthorizationMessage {
            from: self.wallet.address(),
            to,
            value,
            valid_after,
            valid_before,
            nonce,
        };

        let signature = self.sign_typed_data(&domain, &message)?;

        let authorization = Eip3009Authorization {
            from: self.address(),
            to: requirements.pay_to.to_lowercase(),
            value: value.to_string(),
            valid_after: valid_after.to_string(),
            valid_before: valid_before.to_string(),
            nonce: format!("{:?}", nonce),
        };

        Ok(PaymentPayload {
            x402_version: X402_VERSION,
            scheme: requirements.scheme.clone(),
            network: requirements.network.clone(),
            payload: ExactEvmPayload {
                signature,
                authorization,
            },
        })
    }

    /// Sign EIP-712 typed data: keccak256("\x19\x01" ++ domainSeparator ++ structHash).
    fn sign_typed_data(
        &self,
        domain: &Eip712Domain,
        message: &TransferWithAuthorizationMessage,
    ) -> Result<String, String> {
        let domain_separator = domain.separator();
        let struct_hash = message.struct_hash();

        let mut to_sign = Vec::with_capacity(66);
        to_sign.push(0x19);
        to_sign.push(0x01);
        to_sign.extend_from_slice(domain_separator.as_bytes());
        to_sign.extend_from_slice(struct_hash.as_bytes());
        let digest = H256::from(keccak256(&to_sign));

        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| format!("Failed to sign: {}", e))?;

        Ok(format!("0x{}", hex::encode(signature.to_vec())))
    }
}

/// EIP-712 domain for the USDC contract the requirement names.
struct Eip712Domain {
    name: String,
    version: String,
    chain_id: u64,
    verifying_contract: Address,
}

impl Eip712Domain {
    fn for_requirement(
        requirements: &PaymentRequirements,
        asset: &str,
    ) -> Result<Self, String> {
        let extra = requirements.extra.as_ref();
        Ok(Self {
            name: extra
                .and_then(|e| e.name.clone())
                .unwrap_or_else(|| "USD Coin".to_string()),
            version: extra
                .and_then(|e| e.version.clone())
                .unwrap_or_else(|| "2".to_string()),
            chain_id: BASE_CHAIN_ID,
            verifying_contract: asset
                .parse()
                .map_err(|e| format!("Invalid asset address: {}", e))?,
        })
    }

    fn separator(&self) -> H256 {
        let type_hash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );

        let mut encoded = Vec::new();
        encoded.extend_from_slice(&type_hash);
        encoded.extend_from_slice(&keccak256(self.name.as_bytes()));
        encoded.extend_from_slice(&keccak256(self.version.as_bytes()));
        encoded.extend_from_slice(&ethers::abi::encode(&[ethers::abi::Token::Uint(
            U256::from(self.chain_id),
        )]));
        encoded.extend_from_slice(&ethers::abi::encode(&[ethers::abi::Token::Address(
            self.verifying_contract,
        )]));

        H256::from(keccak256(&encoded))
    }
}

/// TransferWithAuthorization message for EIP-3009
struct TransferWithAuthorizationMessage {
    from: Address,
    to: Address,
    value: U256,
    valid_after: U256,
    valid_before: U256,
    nonce: H256,
}

impl TransferWithAuthorizationMessage {
    fn struct_hash(&self) -> H256 {
        let type_hash = keccak256(
            b"TransferWithAuthorization(address from,address to,uint256 value,uint256 validAfter,uint256 validBefore,bytes32 nonce)",
        );

        let encoded = ethers::abi::encode(&[
            ethers::abi::Token::FixedBytes(type_hash.to_vec()),
            ethers::abi::Token::Address(self.from),
            ethers::abi::Token::Address(self.to),
            ethers::abi::Token::Uint(self.value),
            ethers::abi::Token::Uint(self.valid_after),
            ethers::abi::Token::Uint(self.valid_before),
            ethers::abi::Token::FixedBytes(self.nonce.as_bytes().to_vec()),
        ]);

        H256::from(keccak256(&encoded))
    }
}
