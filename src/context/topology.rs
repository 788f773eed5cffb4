//! Static connection graph built from host configuration.

use std::collections::HashSet;

use crate::config::TopologyConfig;

use super::traits::{ConnectionGraph, PluginId};

/// Fixed set of directed links. `(a, b)` lets `a` access contexts owned by
/// `b`. A plugin reaches its own contexts only through an explicit self-link.
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    links: HashSet<(PluginId, PluginId)>,
}

impl StaticTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TopologyConfig) -> Self {
        let mut topology = Self::new();
        for link in &config.links {
            if link.bidirectional {
                topology.connect_both(link.from, link.to);
            } else {
                topology.connect(link.from, link.to);
            }
        }
        topology
    }

    /// Allow `from` to access contexts owned by `to`.
    pub fn connect(&mut self, from: PluginId, to: PluginId) -> &mut Self {
        self.links.insert((from, to));
        self
    }

    pub fn connect_both(&mut self, a: PluginId, b: PluginId) -> &mut Self {
        self.links.insert((a, b));
        self.links.insert((b, a));
        self
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl ConnectionGraph for StaticTopology {
    fn is_connected(&self, requester: PluginId, owner: PluginId) -> bool {
        self.links.contains(&(requester, owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;

    #[test]
    fn links_are_directed() {
        let mut topology = StaticTopology::new();
        topology.connect(PluginId(2), PluginId(1));
        assert!(topology.is_connected(PluginId(2), PluginId(1)));
        assert!(!topology.is_connected(PluginId(1), PluginId(2)));
        assert!(!topology.is_connected(PluginId(1), PluginId(1)));
    }

    #[test]
    fn from_config_expands_bidirectional_links() {
        let config = TopologyConfig {
            links: vec![
                LinkConfig {
                    from: PluginId(1),
                    to: PluginId(2),
                    bidirectional: true,
                },
                LinkConfig {
                    from: PluginId(3),
                    to: PluginId(1),
                    bidirectional: false,
                },
            ],
        };
        let topology = StaticTopology::from_config(&config);
        assert_eq!(topology.len(), 3);
        assert!(topology.is_connected(PluginId(2), PluginId(1)));
        assert!(topology.is_connected(PluginId(3), PluginId(1)));
        assert!(!topology.is_connected(PluginId(1), PluginId(3)));
    }
}
