//! Handshake configuration
//!
//! Values come from defaults, then an optional TOML file, then `PAIRWIRE_*`
//! environment variables, and are validated once assembled.

use crate::errors::PairwireError;
use crate::rpc::ProtocolMethod;
use crate::session::DEFAULT_SESSION_TTL_SECS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "PAIRWIRE_";

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<(), PairwireError>;
}

/// Configuration shared by both handshake roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticateConfig {
    /// Lifetime of sessions created by the handshake
    pub session_ttl_secs: u64,
    /// Lifetime of an authenticate request
    pub request_ttl_secs: u64,
    /// Relay protocol recorded on sessions
    pub relay_protocol: String,
    /// Events granted to every negotiated namespace
    pub default_events: Vec<String>,
    /// Whether the ReCap statement is folded into the signed message
    pub include_recap_in_statement: bool,
}

impl Default for AuthenticateConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            request_ttl_secs: ProtocolMethod::SessionAuthenticate.ttl_secs(),
            relay_protocol: "irn".to_string(),
            default_events: vec!["chainChanged".to_string(), "accountsChanged".to_string()],
            include_recap_in_statement: true,
        }
    }
}

impl AuthenticateConfig {
    /// Parse a TOML document, missing keys taking their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, PairwireError> {
        toml::from_str(content).map_err(|e| PairwireError::config(format!("Invalid TOML: {e}")))
    }

    /// Load from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, PairwireError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply `PAIRWIRE_*` environment overrides
    pub fn merge_with_env(&mut self) -> Result<(), PairwireError> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from an explicit variable list
    pub fn merge_with_vars(
        &mut self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<(), PairwireError> {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "SESSION_TTL_SECS" => self.session_ttl_secs = parse_number(&key, &value)?,
                "REQUEST_TTL_SECS" => self.request_ttl_secs = parse_number(&key, &value)?,
                "RELAY_PROTOCOL" => self.relay_protocol = value,
                "DEFAULT_EVENTS" => {
                    self.default_events = value
                        .split(',')
                        .map(str::trim)
                        .filter(|event| !event.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "INCLUDE_RECAP_IN_STATEMENT" => {
                    self.include_recap_in_statement = value.parse().map_err(|_| {
                        PairwireError::config(format!("{key} must be true or false"))
                    })?;
                }
                _ => tracing::debug!(variable = %key, "Ignoring unknown configuration override"),
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, PairwireError> {
    value
        .parse()
        .map_err(|_| PairwireError::config(format!("{key} must be an unsigned integer")))
}

impl ConfigValidation for AuthenticateConfig {
    fn validate(&self) -> Result<(), PairwireError> {
        if self.session_ttl_secs == 0 {
            return Err(PairwireError::config("session_ttl_secs must be positive"));
        }
        if self.request_ttl_secs == 0 {
            return Err(PairwireError::config("request_ttl_secs must be positive"));
        }
        if self.relay_protocol.trim().is_empty() {
            return Err(PairwireError::config("relay_protocol must not be empty"));
        }
        Ok(())
    }
}
