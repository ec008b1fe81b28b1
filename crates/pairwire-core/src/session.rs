//! Authenticated session records

use crate::identifiers::{Account, Blockchain, Topic};
use crate::participant::Participant;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default session lifetime: seven days
pub const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Permissions negotiated for one chain namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNamespace {
    /// Chains the session may use
    pub chains: BTreeSet<Blockchain>,
    /// Accounts proven during the handshake
    pub accounts: BTreeSet<Account>,
    /// RPC methods granted
    pub methods: BTreeSet<String>,
    /// Events the peer may emit
    pub events: BTreeSet<String>,
}

/// Namespace key (`eip155`) to negotiated permissions
pub type NamespaceSet = BTreeMap<String, SessionNamespace>;

/// How the session's peer is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportType {
    /// Messages published on relay topics
    Relay,
    /// Messages delivered through universal links
    LinkMode,
}

/// A session created by a completed handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Topic derived from the session key agreement
    pub topic: Topic,
    /// Pairing the handshake ran over
    pub pairing_topic: Topic,
    /// Unix seconds at creation
    pub created_at: u64,
    /// This side of the session
    pub self_participant: Participant,
    /// The other side of the session
    pub peer_participant: Participant,
    /// Public key of the responder, which controls the session
    pub controller: String,
    /// Negotiated permissions
    pub namespaces: NamespaceSet,
    /// Required namespaces; empty for capability-driven sessions
    pub required_namespaces: NamespaceSet,
    /// Unix seconds at expiry
    pub expiry: u64,
    /// Whether both sides confirmed the session
    pub acknowledged: bool,
    /// Delivery mechanism
    pub transport_type: TransportType,
    /// Relay protocol name
    pub relay_protocol: String,
}

impl Session {
    /// Whether the session is past its expiry at `now` (unix seconds)
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry <= now
    }

    /// All accounts across namespaces
    pub fn accounts(&self) -> Vec<&Account> {
        self.namespaces
            .values()
            .flat_map(|namespace| namespace.accounts.iter())
            .collect()
    }
}
