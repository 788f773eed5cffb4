//! Ownership ledger.
//!
//! Authoritative map from plugin to the contexts it currently has
//! registered. Kept in lockstep with the registry tables: every registered
//! context has exactly one owner here and nothing else does.
//!
//! Owner resolution goes through an identity index instead of scanning every
//! plugin's list, so `owner_of` is O(1) rather than O(total contexts).

use std::collections::HashMap;

use super::traits::{ContextValue, Identity, PluginId};

#[derive(Debug, Default)]
pub(crate) struct OwnershipLedger {
    owned: HashMap<PluginId, Vec<ContextValue>>,
    owners: HashMap<Identity, PluginId>,
}

impl OwnershipLedger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Record `owner` as the owner of `value`. Returns `false` if the value
    /// already has an owner.
    pub(crate) fn insert(&mut self, owner: PluginId, value: ContextValue) -> bool {
        if self.owners.contains_key(&value.identity()) {
            return false;
        }
        self.owners.insert(value.identity(), owner);
        self.owned.entry(owner).or_default().push(value);
        true
    }

    pub(crate) fn owner_of(&self, value: &ContextValue) -> Option<PluginId> {
        self.owners.get(&value.identity()).copied()
    }

    pub(crate) fn contains(&self, value: &ContextValue) -> bool {
        self.owners.contains_key(&value.identity())
    }

    pub(crate) fn owns(&self, owner: PluginId, value: &ContextValue) -> bool {
        self.owner_of(value) == Some(owner)
    }

    pub(crate) fn owns_anything(&self, owner: PluginId) -> bool {
        self.owned.get(&owner).is_some_and(|values| !values.is_empty())
    }

    /// Contexts owned by `owner`, in registration order.
    pub(crate) fn owned_by(&self, owner: PluginId) -> &[ContextValue] {
        self.owned
            .get(&owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Forget `value` if `owner` owns it.
    pub(crate) fn remove(&mut self, owner: PluginId, value: &ContextValue) -> bool {
        if !self.owns(owner, value) {
            return false;
        }
        self.owners.remove(&value.identity());

        if let Some(values) = self.owned.get_mut(&owner) {
            values.retain(|v| v != value);
            if values.is_empty() {
                self.owned.remove(&owner);
            }
        }
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.owners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::interface::InterfaceRef;
    use crate::context::traits::Context;
    use std::sync::Arc;

    struct Plain;

    impl Context for Plain {
        fn interfaces(&self) -> Vec<InterfaceRef> {
            Vec::new()
        }
    }

    fn ctx() -> ContextValue {
        ContextValue::new(Arc::new(Plain))
    }

    #[test]
    fn ledger_tracks_single_owner() {
        let mut ledger = OwnershipLedger::new();
        let value = ctx();
        assert!(ledger.insert(PluginId(1), value.clone()));
        assert!(!ledger.insert(PluginId(2), value.clone()));
        assert_eq!(ledger.owner_of(&value), Some(PluginId(1)));
        assert!(ledger.owns(PluginId(1), &value));
        assert!(!ledger.owns(PluginId(2), &value));
        assert!(!ledger.owns_anything(PluginId(2)));
    }

    #[test]
    fn ledger_remove_requires_owner() {
        let mut ledger = OwnershipLedger::new();
        let value = ctx();
        ledger.insert(PluginId(1), value.clone());

        assert!(!ledger.remove(PluginId(2), &value));
        assert!(ledger.contains(&value));
        assert!(ledger.remove(PluginId(1), &value));
        assert!(!ledger.contains(&value));
        assert!(!ledger.owns_anything(PluginId(1)));
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn ledger_lists_owned_in_registration_order() {
        let mut ledger = OwnershipLedger::new();
        let (a, b) = (ctx(), ctx());
        ledger.insert(PluginId(7), a.clone());
        ledger.insert(PluginId(7), b.clone());
        assert_eq!(ledger.owned_by(PluginId(7)), &[a, b][..]);
        assert!(ledger.owned_by(PluginId(8)).is_empty());
    }
}
