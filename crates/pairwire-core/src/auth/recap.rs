//! ReCap capability grants (`urn:recap:` resources)
//!
//! A ReCap is a base64url-encoded JSON object of the form
//! `{"att": {"eip155": {"request/personal_sign": [{}]}}}`. Parsing lands in
//! ordered maps so every consumer sees the same order regardless of how the
//! JSON keys were laid out.

use crate::errors::PairwireError;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// URN prefix of a ReCap resource
pub const RECAP_PREFIX: &str = "urn:recap:";

/// Action prefix for request grants
pub const REQUEST_ACTION_PREFIX: &str = "request/";

/// Decoded ReCap body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecapData {
    /// Attenuations: namespace -> action -> caveats
    #[serde(default)]
    pub att: BTreeMap<String, BTreeMap<String, Vec<serde_json::Value>>>,
}

/// A parsed `urn:recap:` resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecapUrn {
    urn: String,
    data: RecapData,
}

impl RecapUrn {
    /// Whether a resource string is a ReCap URN
    pub fn is_recap(resource: &str) -> bool {
        resource.starts_with(RECAP_PREFIX)
    }

    /// Parse a ReCap URN
    pub fn parse(urn: &str) -> Result<Self, PairwireError> {
        let encoded = urn
            .strip_prefix(RECAP_PREFIX)
            .ok_or_else(|| PairwireError::malformed(format!("Not a ReCap URN: {urn}")))?;
        let json = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .or_else(|_| URL_SAFE.decode(encoded))
            .map_err(|e| PairwireError::malformed(format!("ReCap is not base64url: {e}")))?;
        let data: RecapData = serde_json::from_slice(&json)?;
        Ok(Self {
            urn: urn.to_string(),
            data,
        })
    }

    /// Encode ReCap data as a URN
    pub fn encode(data: &RecapData) -> Result<Self, PairwireError> {
        let json = serde_json::to_vec(data)?;
        Ok(Self {
            urn: format!("{RECAP_PREFIX}{}", URL_SAFE_NO_PAD.encode(json)),
            data: data.clone(),
        })
    }

    /// Build a ReCap granting `request/<method>` for each method under a namespace
    pub fn for_methods<'a>(
        namespace: &str,
        methods: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, PairwireError> {
        let actions = methods
            .into_iter()
            .map(|method| {
                (
                    format!("{REQUEST_ACTION_PREFIX}{method}"),
                    vec![serde_json::json!({})],
                )
            })
            .collect();
        let mut data = RecapData::default();
        data.att.insert(namespace.to_string(), actions);
        Self::encode(&data)
    }

    /// Original URN string
    pub fn as_str(&self) -> &str {
        &self.urn
    }

    /// Decoded body
    pub fn data(&self) -> &RecapData {
        &self.data
    }

    /// Methods granted under `namespace` through `request/` actions, sorted
    pub fn request_methods(&self, namespace: &str) -> Vec<String> {
        self.data
            .att
            .get(namespace)
            .map(|actions| {
                actions
                    .keys()
                    .filter_map(|action| action.strip_prefix(REQUEST_ACTION_PREFIX))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Human readable statement appended to the sign-in message
    ///
    /// `I further authorize the stated URI to perform the following actions on
    /// my behalf: (1) 'request': 'a', 'b' for 'eip155'.`
    pub fn statement(&self) -> String {
        let mut clauses = Vec::new();
        for (index, (namespace, actions)) in self.data.att.iter().enumerate() {
            let mut by_kind: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for action in actions.keys() {
                if let Some((kind, name)) = action.split_once('/') {
                    by_kind.entry(kind).or_default().push(name);
                }
            }
            let parts: Vec<String> = by_kind
                .iter()
                .map(|(kind, names)| {
                    let names: Vec<String> = names.iter().map(|name| format!("'{name}'")).collect();
                    format!("'{kind}': {}", names.join(", "))
                })
                .collect();
            clauses.push(format!("({}) {} for '{namespace}'", index + 1, parts.join("; ")));
        }
        format!(
            "I further authorize the stated URI to perform the following actions on my behalf: {}.",
            clauses.join(", ")
        )
    }
}

/// The capability grant of a resource list: its last ReCap URN
pub fn last_recap(resources: Option<&[String]>) -> Option<&str> {
    resources?
        .iter()
        .rev()
        .find(|resource| RecapUrn::is_recap(resource))
        .map(String::as_str)
}
