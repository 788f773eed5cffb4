//! The context broker.
//!
//! Combines the registry tables, the ownership ledger and the trust anchor
//! behind one `parking_lot::RwLock`, so lookups never observe a context that
//! is in a table but not yet in the ledger (or the reverse).

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::BrokerConfig;

use super::error::{LookupResult, RegisterError};
use super::fingerprint;
use super::interface::CapabilityInterface;
use super::ledger::OwnershipLedger;
use super::registry::{ContextRegistry, Selector};
use super::traits::{Category, ConnectionGraph, ContextValue, PluginId};
use super::trust::{TrustAnchor, TrustState};

#[derive(Debug)]
struct BrokerState {
    registry: ContextRegistry,
    ledger: OwnershipLedger,
    trust: TrustAnchor,
}

impl BrokerState {
    /// Permission for `requester` to use `value`. Caller holds the lock.
    fn permits(&self, requester: PluginId, value: &ContextValue) -> bool {
        if self.trust.state() != TrustState::Bound {
            return false;
        }

        let Some(owner) = self.ledger.owner_of(value) else {
            if self.registry.contains(value) {
                tracing::error!(
                    requester = %requester,
                    context = ?value,
                    "Registered context has no owner; registry and ledger diverged"
                );
            }
            debug_assert!(
                !self.registry.contains(value),
                "registered context has no owner"
            );
            return false;
        };

        self.trust.permits(requester, owner)
    }
}

/// Registry of plugin contexts with owner-only removal and topology-gated
/// lookup.
///
/// Construct one at host start-up and share it (`Arc<ContextBroker>`) with
/// every plugin. All operations are synchronous and bounded.
pub struct ContextBroker {
    state: RwLock<BrokerState>,
    compiler_lookups_gated: bool,
}

impl Default for ContextBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBroker {
    /// Broker with default policy: compiler lookups are not permission gated.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BrokerState {
                registry: ContextRegistry::new(),
                ledger: OwnershipLedger::new(),
                trust: TrustAnchor::new(),
            }),
            compiler_lookups_gated: false,
        }
    }

    pub fn with_config(config: &BrokerConfig) -> Self {
        Self {
            compiler_lookups_gated: config.compiler_lookups_gated,
            ..Self::new()
        }
    }

    /// Register `value` under `iface` on behalf of `owner`.
    ///
    /// The value must declare `iface` (or an interface extending it), its
    /// declared interfaces must lead to exactly one root contract, and
    /// `iface` must hash to the fingerprint it declares. A value can be
    /// registered only once across all categories and interfaces.
    ///
    /// # Errors
    ///
    /// Returns a [`RegisterError`] describing the first failed check. No
    /// state changes on error.
    pub fn register(
        &self,
        owner: PluginId,
        value: &ContextValue,
        iface: &CapabilityInterface,
    ) -> Result<(), RegisterError> {
        let result = self.try_register(owner, value, iface);
        if let Err(e) = &result {
            tracing::debug!(
                plugin_id = %owner,
                interface = %iface,
                error = %e,
                "Context registration rejected"
            );
        }
        result
    }

    fn try_register(
        &self,
        owner: PluginId,
        value: &ContextValue,
        iface: &CapabilityInterface,
    ) -> Result<(), RegisterError> {
        // Plugin code runs here, outside the lock.
        let declared = value.interfaces();

        if !declared.iter().any(|d| d.is_subtype_of(iface)) {
            return Err(RegisterError::NotImplemented {
                interface: iface.name().to_string(),
            });
        }

        let categories: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| declared.iter().any(|d| d.category() == *c))
            .collect();
        let [category] = categories[..] else {
            return Err(RegisterError::AmbiguousCategory { categories });
        };
        // The value's root contract decides the table, not the target interface.
        if category != iface.category() {
            return Err(RegisterError::NotImplemented {
                interface: iface.name().to_string(),
            });
        }

        fingerprint::verify(iface).map_err(|m| RegisterError::FingerprintMismatch {
            interface: iface.name().to_string(),
            expected: m.expected,
            actual: m.actual.to_string(),
        })?;

        let mut state = self.state.write();
        if state.ledger.contains(value) {
            return Err(RegisterError::AlreadyRegistered);
        }
        state.ledger.insert(owner, value.clone());
        state.registry.insert(category, iface.name(), value.clone());
        drop(state);

        tracing::info!(
            plugin_id = %owner,
            interface = %iface,
            category = %category,
            context_id = value.id().unwrap_or(""),
            "Registered context"
        );
        Ok(())
    }

    /// Remove `value` if `owner` registered it.
    ///
    /// Returns `false` when `owner` owns nothing, does not own `value`, or
    /// the value is not registered; these cases are indistinguishable.
    pub fn unregister(&self, owner: PluginId, value: &ContextValue) -> bool {
        let mut state = self.state.write();
        if !state.ledger.owns(owner, value) {
            return false;
        }

        let Some(category) = state.registry.remove(value) else {
            return false;
        };
        state.ledger.remove(owner, value);
        drop(state);

        tracing::info!(
            plugin_id = %owner,
            category = %category,
            "Unregistered context"
        );
        true
    }

    /// Remove every context `owner` registered under `iface`. Contexts
    /// other plugins registered under the same interface stay.
    ///
    /// Returns `true` if at least one context was removed.
    pub fn unregister_all(&self, owner: PluginId, iface: &CapabilityInterface) -> bool {
        let mut guard = self.state.write();
        let state = &mut *guard;
        if !state.ledger.owns_anything(owner) {
            return false;
        }

        let removed = state
            .registry
            .remove_where(iface.category(), iface.name(), |v| state.ledger.owns(owner, v));
        for value in &removed {
            state.ledger.remove(owner, value);
        }
        drop(guard);

        if !removed.is_empty() {
            tracing::info!(
                plugin_id = %owner,
                interface = %iface,
                removed = removed.len(),
                "Unregistered contexts"
            );
        }
        !removed.is_empty()
    }

    /// Set the process-wide trust token. Succeeds only on the first call
    /// with a non-empty token; the token is immutable afterwards.
    pub fn set_trust_token(&self, token: &str) -> bool {
        let set = self.state.write().trust.set_token(token);
        if set {
            tracing::info!("Trust token set");
        } else {
            tracing::warn!("Rejected attempt to set trust token");
        }
        set
    }

    /// Bind the host topology. Silently ignored unless `token` matches the
    /// stored trust token.
    pub fn bind_topology(&self, token: &str, graph: Arc<dyn ConnectionGraph>) {
        if self.state.write().trust.bind(token, graph) {
            tracing::info!("Connection graph bound");
        } else {
            tracing::warn!("Rejected connection graph binding");
        }
    }

    pub fn trust_state(&self) -> TrustState {
        self.state.read().trust.state()
    }

    /// Whether `requester` may use `value`: the bound topology must connect
    /// `requester` to the value's owner. Always `false` before binding.
    pub fn check_permission(&self, requester: PluginId, value: &ContextValue) -> bool {
        self.state.read().permits(requester, value)
    }

    /// Look up a context of `iface` in the `category` table.
    ///
    /// `Ok(None)` covers "not found", "wrong category" and "permission
    /// denied" alike. Compiler contexts skip the permission check unless
    /// the broker was configured with `compiler_lookups_gated`.
    ///
    /// # Errors
    ///
    /// [`LookupError::OrdinalOutOfRange`] when an ordinal selector points
    /// past the end of a non-empty bucket.
    ///
    /// [`LookupError::OrdinalOutOfRange`]: super::error::LookupError::OrdinalOutOfRange
    pub fn lookup(
        &self,
        category: Category,
        requester: PluginId,
        iface: &CapabilityInterface,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        if iface.category() != category {
            return Ok(None);
        }

        let state = self.state.read();
        let Some(value) = state.registry.select(category, iface.name(), selector)? else {
            return Ok(None);
        };

        let gated = category != Category::Compiler || self.compiler_lookups_gated;
        if gated && !state.permits(requester, &value) {
            tracing::debug!(
                requester = %requester,
                interface = %iface,
                category = %category,
                "Context lookup denied"
            );
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Look up a context in the table of `iface`'s own category.
    pub fn get(
        &self,
        requester: PluginId,
        iface: &CapabilityInterface,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        self.lookup(iface.category(), requester, iface, selector)
    }

    pub fn cpu_context(
        &self,
        requester: PluginId,
        iface: &CapabilityInterface,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        self.lookup(Category::Cpu, requester, iface, selector)
    }

    pub fn memory_context(
        &self,
        requester: PluginId,
        iface: &CapabilityInterface,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        self.lookup(Category::Memory, requester, iface, selector)
    }

    pub fn device_context(
        &self,
        requester: PluginId,
        iface: &CapabilityInterface,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        self.lookup(Category::Device, requester, iface, selector)
    }

    pub fn compiler_context(
        &self,
        requester: PluginId,
        iface: &CapabilityInterface,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        self.lookup(Category::Compiler, requester, iface, selector)
    }

    /// Owner of a registered context.
    pub fn owner_of(&self, value: &ContextValue) -> Option<PluginId> {
        self.state.read().ledger.owner_of(value)
    }

    /// Contexts currently registered by `owner`, in registration order.
    pub fn owned_by(&self, owner: PluginId) -> Vec<ContextValue> {
        self.state.read().ledger.owned_by(owner).to_vec()
    }

    pub fn is_registered(&self, value: &ContextValue) -> bool {
        self.state.read().ledger.contains(value)
    }

    /// Number of contexts registered in `category`.
    pub fn len(&self, category: Category) -> usize {
        self.state.read().registry.len(category)
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().ledger.len() == 0
    }
}

impl std::fmt::Debug for ContextBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ContextBroker")
            .field("registry", &state.registry)
            .field("trust", &state.trust.state())
            .field("compiler_lookups_gated", &self.compiler_lookups_gated)
            .finish_non_exhaustive()
    }
}
