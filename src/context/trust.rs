//! Trust bootstrap and permission oracle.
//!
//! ```text
//! Unbootstrapped --set_token--> Unbound --bind(matching token)--> Bound
//! ```
//!
//! The host sets a process-wide token exactly once, then binds its topology
//! provider by presenting the same token. Only the SHA-256 digest of the
//! token is kept. Permission checks fail closed until a provider is bound.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

use super::traits::{ConnectionGraph, PluginId};

/// Bootstrap progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustState {
    /// No token set yet.
    Unbootstrapped,
    /// Token set, no topology bound.
    Unbound,
    /// Topology bound; permission checks are live.
    Bound,
}

impl fmt::Display for TrustState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unbootstrapped => "unbootstrapped",
            Self::Unbound => "unbound",
            Self::Bound => "bound",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
pub(crate) struct TrustAnchor {
    token_digest: Option<[u8; 32]>,
    graph: Option<Arc<dyn ConnectionGraph>>,
}

fn digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

impl TrustAnchor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> TrustState {
        match (&self.token_digest, &self.graph) {
            (None, _) => TrustState::Unbootstrapped,
            (Some(_), None) => TrustState::Unbound,
            (Some(_), Some(_)) => TrustState::Bound,
        }
    }

    /// Set the token. Succeeds once, and only with a non-empty token.
    pub(crate) fn set_token(&mut self, token: &str) -> bool {
        if self.token_digest.is_some() || token.is_empty() {
            return false;
        }
        self.token_digest = Some(digest(token));
        true
    }

    /// Bind `graph` if `presented` matches the stored token. Rebinding with
    /// the right token replaces the previous provider.
    pub(crate) fn bind(&mut self, presented: &str, graph: Arc<dyn ConnectionGraph>) -> bool {
        match self.token_digest {
            Some(stored) if stored == digest(presented) => {
                self.graph = Some(graph);
                true
            }
            _ => false,
        }
    }

    /// Ask the bound topology whether `requester` may reach `owner`.
    pub(crate) fn permits(&self, requester: PluginId, owner: PluginId) -> bool {
        self.graph
            .as_ref()
            .is_some_and(|graph| graph.is_connected(requester, owner))
    }
}

impl fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustAnchor")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
