//! Handshake participants and their application metadata

use serde::{Deserialize, Serialize};

/// Return addresses a peer advertises for reaching it again
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    /// Native deep link scheme (`myapp://`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<String>,
    /// Universal link used for link-mode delivery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal: Option<String>,
    /// Whether the peer accepts link-mode envelopes
    #[serde(default)]
    pub link_mode: bool,
}

/// Descriptive metadata of the application behind a participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Origin URL
    pub url: String,
    /// Icon URLs
    #[serde(default)]
    pub icons: Vec<String>,
    /// Optional reachability information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
}

impl AppMetadata {
    /// Universal link advertised by this application, if any
    pub fn universal_link(&self) -> Option<&str> {
        self.redirect
            .as_ref()
            .and_then(|redirect| redirect.universal.as_deref())
            .filter(|link| !link.is_empty())
    }
}

/// One side of the handshake: an X25519 public key plus metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Hex-encoded X25519 public key
    pub public_key: String,
    /// Application metadata
    pub metadata: AppMetadata,
}
