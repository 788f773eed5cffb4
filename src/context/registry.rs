//! Context registry tables.
//!
//! One multi-map per [`Category`], from interface name to the contexts
//! registered under it in insertion order. Insertion order is the basis for
//! first-match and ordinal lookups.
//!
//! The tables do no locking and no permission checks; [`ContextBroker`]
//! wraps them together with the ownership ledger under a single lock.
//!
//! [`ContextBroker`]: super::broker::ContextBroker

use std::collections::HashMap;

use super::error::{LookupError, LookupResult};
use super::traits::{Category, ContextValue};

/// How to pick one context out of an interface bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// First registered context.
    First,
    /// Context at a 0-based position in insertion order. Out of range is a
    /// [`LookupError`], not "not found".
    Ordinal(usize),
    /// First context whose ID equals the given one (case-sensitive).
    Id(&'a str),
    /// The n-th (0-based) context among those whose ID matches.
    IdOrdinal(&'a str, usize),
}

/// Per-category interface tables.
#[derive(Default)]
pub(crate) struct ContextRegistry {
    tables: [HashMap<String, Vec<ContextValue>>; 4],
}

impl ContextRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn table(&self, category: Category) -> &HashMap<String, Vec<ContextValue>> {
        &self.tables[category.index()]
    }

    fn table_mut(&mut self, category: Category) -> &mut HashMap<String, Vec<ContextValue>> {
        &mut self.tables[category.index()]
    }

    /// Append `value` to the bucket for `(category, interface)`.
    pub(crate) fn insert(&mut self, category: Category, interface: &str, value: ContextValue) {
        self.table_mut(category)
            .entry(interface.to_string())
            .or_default()
            .push(value);
    }

    /// Contexts registered under `interface`, in insertion order.
    pub(crate) fn bucket(&self, category: Category, interface: &str) -> &[ContextValue] {
        self.table(category)
            .get(interface)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn contains(&self, value: &ContextValue) -> bool {
        self.tables
            .iter()
            .flat_map(HashMap::values)
            .any(|bucket| bucket.contains(value))
    }

    /// Number of contexts registered in `category`.
    pub(crate) fn len(&self, category: Category) -> usize {
        self.table(category).values().map(Vec::len).sum()
    }

    /// Remove `value` from whichever table holds it. Empty buckets are dropped.
    pub(crate) fn remove(&mut self, value: &ContextValue) -> Option<Category> {
        for category in Category::ALL {
            let table = self.table_mut(category);
            let hit = table.iter_mut().find_map(|(interface, bucket)| {
                let pos = bucket.iter().position(|v| v == value)?;
                bucket.remove(pos);
                Some((interface.clone(), bucket.is_empty()))
            });

            if let Some((interface, emptied)) = hit {
                if emptied {
                    table.remove(&interface);
                }
                return Some(category);
            }
        }
        None
    }

    /// Remove every context under `interface` that satisfies `pred`,
    /// returning the removed values.
    pub(crate) fn remove_where<F>(
        &mut self,
        category: Category,
        interface: &str,
        mut pred: F,
    ) -> Vec<ContextValue>
    where
        F: FnMut(&ContextValue) -> bool,
    {
        let table = self.table_mut(category);
        let Some(bucket) = table.get_mut(interface) else {
            return Vec::new();
        };

        let mut removed = Vec::new();
        bucket.retain(|value| {
            if pred(value) {
                removed.push(value.clone());
                false
            } else {
                true
            }
        });

        if bucket.is_empty() {
            table.remove(interface);
        }
        removed
    }

    /// Pick a context from the `(category, interface)` bucket.
    ///
    /// An absent bucket is "not found" for every selector.
    pub(crate) fn select(
        &self,
        category: Category,
        interface: &str,
        selector: Selector<'_>,
    ) -> LookupResult<Option<ContextValue>> {
        let bucket = self.bucket(category, interface);
        if bucket.is_empty() {
            return Ok(None);
        }

        let found = match selector {
            Selector::First => bucket.first(),
            Selector::Ordinal(ordinal) => {
                Some(bucket.get(ordinal).ok_or_else(|| LookupError::OrdinalOutOfRange {
                    interface: interface.to_string(),
                    ordinal,
                    len: bucket.len(),
                })?)
            }
            Selector::Id(id) => bucket.iter().find(|v| v.id() == Some(id)),
            Selector::IdOrdinal(id, ordinal) => {
                bucket.iter().filter(|v| v.id() == Some(id)).nth(ordinal)
            }
        };
        Ok(found.cloned())
    }
}

impl std::fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("cpu", &self.len(Category::Cpu))
            .field("memory", &self.len(Category::Memory))
            .field("device", &self.len(Category::Device))
            .field("compiler", &self.len(Category::Compiler))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::interface::InterfaceRef;
    use crate::context::traits::Context;
    use std::sync::Arc;

    struct Tagged(Option<&'static str>);

    impl Context for Tagged {
        fn interfaces(&self) -> Vec<InterfaceRef> {
            Vec::new()
        }

        fn id(&self) -> Option<&str> {
            self.0
        }
    }

    fn ctx(id: Option<&'static str>) -> ContextValue {
        ContextValue::new(Arc::new(Tagged(id)))
    }

    #[test]
    fn ordinal_selection_follows_insertion_order() {
        let mut registry = ContextRegistry::new();
        let (v1, v2) = (ctx(None), ctx(None));
        registry.insert(Category::Memory, "Ram", v1.clone());
        registry.insert(Category::Memory, "Ram", v2.clone());

        let first = registry.select(Category::Memory, "Ram", Selector::First).unwrap();
        assert_eq!(first, Some(v1.clone()));
        let at0 = registry.select(Category::Memory, "Ram", Selector::Ordinal(0)).unwrap();
        assert_eq!(at0, Some(v1));
        let at1 = registry.select(Category::Memory, "Ram", Selector::Ordinal(1)).unwrap();
        assert_eq!(at1, Some(v2));
        assert_eq!(
            registry.select(Category::Memory, "Ram", Selector::Ordinal(2)),
            Err(LookupError::OrdinalOutOfRange {
                interface: "Ram".into(),
                ordinal: 2,
                len: 2,
            })
        );
    }

    #[test]
    fn ordinal_into_missing_bucket_is_not_found() {
        let registry = ContextRegistry::new();
        assert_eq!(
            registry.select(Category::Cpu, "Z80", Selector::Ordinal(5)),
            Ok(None)
        );
    }

    #[test]
    fn id_selection_counts_only_matches() {
        let mut registry = ContextRegistry::new();
        let (x1, y, x2) = (ctx(Some("X")), ctx(Some("Y")), ctx(Some("X")));
        for v in [&x1, &y, &x2] {
            registry.insert(Category::Device, "Terminal", v.clone());
        }

        let sel = |s| registry.select(Category::Device, "Terminal", s).unwrap();
        assert_eq!(sel(Selector::Id("X")), Some(x1.clone()));
        assert_eq!(sel(Selector::Id("Y")), Some(y));
        assert_eq!(sel(Selector::Id("x")), None);
        assert_eq!(sel(Selector::IdOrdinal("X", 0)), Some(x1));
        assert_eq!(sel(Selector::IdOrdinal("X", 1)), Some(x2));
        assert_eq!(sel(Selector::IdOrdinal("X", 2)), None);
    }

    #[test]
    fn remove_drops_empty_buckets() {
        let mut registry = ContextRegistry::new();
        let v = ctx(None);
        registry.insert(Category::Cpu, "Cpu8080", v.clone());
        assert!(registry.contains(&v));

        assert_eq!(registry.remove(&v), Some(Category::Cpu));
        assert!(!registry.contains(&v));
        assert!(registry.bucket(Category::Cpu, "Cpu8080").is_empty());
        assert_eq!(registry.remove(&v), None);
    }

    #[test]
    fn remove_where_keeps_non_matching_entries() {
        let mut registry = ContextRegistry::new();
        let (keep, drop_a, drop_b) = (ctx(Some("keep")), ctx(None), ctx(None));
        for v in [&drop_a, &keep, &drop_b] {
            registry.insert(Category::Compiler, "Asm", v.clone());
        }

        let removed = registry.remove_where(Category::Compiler, "Asm", |v| v.id().is_none());
        assert_eq!(removed, vec![drop_a, drop_b]);
        assert_eq!(registry.bucket(Category::Compiler, "Asm"), &[keep][..]);
        assert_eq!(registry.len(Category::Compiler), 1);
    }
}
