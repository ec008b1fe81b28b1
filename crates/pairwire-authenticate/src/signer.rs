//! Wallet-side signing
//!
//! Session requests are parsed by method name into a closed set of shapes
//! before anything is signed. Methods outside the set become
//! [`SigningRequest::Unimplemented`] instead of failing to parse.

use crate::errors::{AuthenticateError, Result};
use crate::formatter::MessageFormatter;
use async_trait::async_trait;
use pairwire_core::auth::{
    AuthPayload, Cacao, CacaoHeader, CacaoSignature, CacaoSignatureType,
};
use pairwire_core::Account;
use pairwire_crypto::Eip191Signer;
use serde_json::Value;

/// A session request a wallet knows how to sign
#[derive(Debug, Clone, PartialEq)]
pub enum SigningRequest {
    /// `personal_sign`: `[message, address]`
    PersonalSign {
        /// Message, already decoded from `0x` hex when it was hex
        message: String,
        /// Signing address
        address: String,
    },
    /// `eth_signTypedData` / `eth_signTypedData_v4`: `[address, typedData]`
    SignTypedData {
        /// Signing address
        address: String,
        /// EIP-712 typed data
        typed_data: Value,
    },
    /// `eth_sendTransaction`: `[transaction]`
    SendTransaction {
        /// Transaction object
        transaction: Value,
    },
    /// `wallet_sendCalls`: `[{ calls, ... }]`
    WalletSendCalls {
        /// Call batch
        calls: Value,
    },
    /// `solana_signTransaction`: `{ transaction }`
    SolanaSignTransaction {
        /// Serialised transaction
        transaction: String,
    },
    /// Any other method
    Unimplemented(String),
}

fn malformed(method: &str, detail: &str) -> AuthenticateError {
    AuthenticateError::MalformedRequest(format!("{method}: {detail}"))
}

fn string_at(params: &Value, index: usize, method: &str) -> Result<String> {
    params
        .get(index)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(method, &format!("expected string at position {index}")))
}

fn decode_message(raw: String) -> String {
    raw.strip_prefix("0x")
        .and_then(|encoded| hex::decode(encoded).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or(raw)
}

impl SigningRequest {
    /// Parse `params` according to `method`
    pub fn parse(method: &str, params: &Value) -> Result<Self> {
        match method {
            "personal_sign" => Ok(SigningRequest::PersonalSign {
                message: decode_message(string_at(params, 0, method)?),
                address: string_at(params, 1, method)?,
            }),
            "eth_signTypedData" | "eth_signTypedData_v4" => {
                let address = string_at(params, 0, method)?;
                let typed_data = match params.get(1) {
                    Some(Value::String(json)) => serde_json::from_str(json)
                        .map_err(|e| malformed(method, &e.to_string()))?,
                    Some(object @ Value::Object(_)) => object.clone(),
                    _ => return Err(malformed(method, "missing typed data")),
                };
                Ok(SigningRequest::SignTypedData {
                    address,
                    typed_data,
                })
            }
            "eth_sendTransaction" => params
                .get(0)
                .filter(|tx| tx.is_object())
                .map(|tx| SigningRequest::SendTransaction {
                    transaction: tx.clone(),
                })
                .ok_or_else(|| malformed(method, "missing transaction object")),
            "wallet_sendCalls" => params
                .get(0)
                .and_then(|batch| batch.get("calls"))
                .filter(|calls| calls.is_array())
                .map(|calls| SigningRequest::WalletSendCalls {
                    calls: calls.clone(),
                })
                .ok_or_else(|| malformed(method, "missing calls")),
            "solana_signTransaction" => params
                .get("transaction")
                .and_then(Value::as_str)
                .map(|tx| SigningRequest::SolanaSignTransaction {
                    transaction: tx.to_string(),
                })
                .ok_or_else(|| malformed(method, "missing transaction")),
            other => Ok(SigningRequest::Unimplemented(other.to_string())),
        }
    }
}

/// Signs parsed session requests
#[async_trait]
pub trait MethodSigner: Send + Sync {
    /// JSON-RPC result for `request`
    async fn sign(&self, request: &SigningRequest) -> Result<Value>;
}

/// `personal_sign` with a secp256k1 account
#[derive(Debug, Clone)]
pub struct PersonalSigner {
    signer: Eip191Signer,
}

impl PersonalSigner {
    /// Wrap an account
    pub fn new(signer: Eip191Signer) -> Self {
        Self { signer }
    }
}

#[async_trait]
impl MethodSigner for PersonalSigner {
    async fn sign(&self, request: &SigningRequest) -> Result<Value> {
        match request {
            SigningRequest::PersonalSign { message, address } => {
                if !address.eq_ignore_ascii_case(&self.signer.address()) {
                    return Err(AuthenticateError::Signing(format!(
                        "no key for address {address}"
                    )));
                }
                let signature = self
                    .signer
                    .sign(message)
                    .map_err(|e| AuthenticateError::Signing(e.to_string()))?;
                Ok(Value::String(signature))
            }
            SigningRequest::Unimplemented(method) => Err(AuthenticateError::Signing(format!(
                "method {method} is not implemented"
            ))),
            other => Err(AuthenticateError::Signing(format!(
                "unsupported request {other:?}"
            ))),
        }
    }
}

/// Sign the requester's payload as `account`, producing its CACAO
///
/// `include_recap` must match the verifier's setting or the signature will
/// cover a different message.
pub fn sign_cacao(
    formatter: &dyn MessageFormatter,
    signer: &Eip191Signer,
    auth_payload: &AuthPayload,
    account: &Account,
    include_recap: bool,
) -> Result<Cacao> {
    let payload = auth_payload.cacao_payload(account);
    let message = formatter.format_message(&payload, include_recap)?;
    let signature = signer
        .sign(&message)
        .map_err(|e| AuthenticateError::Signing(e.to_string()))?;
    Ok(Cacao {
        h: CacaoHeader {
            t: auth_payload.format,
        },
        p: payload,
        s: CacaoSignature {
            t: CacaoSignatureType::Eip191,
            s: signature,
            m: None,
        },
    })
}
