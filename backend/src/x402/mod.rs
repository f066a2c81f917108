//! x402 Protocol implementation for pay-per-use AI endpoints
//!
//! Both sides of the protocol live here:
//! - Outbound: when the upstream inference API answers 402, parse the payment
//!   requirements, sign an EIP-3009 authorization with the agent wallet, and
//!   retry once with an X-PAYMENT header.
//! - Inbound: paid endpoints are gated behind a client-supplied payment
//!   signature, verified against the external facilitator.

mod gate;
mod signer;
mod types;

pub use gate::require_payment;
pub use signer::X402Signer;
pub use types::*;
