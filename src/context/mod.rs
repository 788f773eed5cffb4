//! Plugin context broker.
//!
//! Plugins publish typed extension points (*contexts*) and consume those of
//! other plugins through a single [`ContextBroker`]. The broker:
//!
//! - stores contexts per [`Category`] (CPU, memory, device, compiler), keyed
//!   by capability interface, in insertion order
//! - refuses registrations whose interface does not hash to the contract
//!   fingerprint it declares (see [`fingerprint`])
//! - lets only the registering plugin remove a context
//! - answers lookups only when the host topology connects the requester to
//!   the context's owner
//!
//! # Trust bootstrap
//!
//! The host sets a trust token once and then binds its topology with the
//! same token. Until then every permission-gated lookup comes back empty.
//!
//! ```
//! use std::sync::Arc;
//! use ctxbroker::context::{
//!     interface, Context, ContextBroker, ContextValue, InterfaceRef, PluginId, Selector,
//!     StaticTopology,
//! };
//!
//! struct Ram;
//!
//! impl Context for Ram {
//!     fn interfaces(&self) -> Vec<InterfaceRef> {
//!         vec![interface::memory_context()]
//!     }
//! }
//!
//! let broker = ContextBroker::new();
//! let mem = interface::memory_context();
//! let ram = ContextValue::new(Arc::new(Ram));
//! broker.register(PluginId(1), &ram, &mem).unwrap();
//!
//! assert!(broker.set_trust_token("host-token"));
//! let mut topology = StaticTopology::new();
//! topology.connect(PluginId(2), PluginId(1));
//! broker.bind_topology("host-token", Arc::new(topology));
//!
//! assert_eq!(broker.get(PluginId(2), &mem, Selector::First), Ok(Some(ram)));
//! assert_eq!(broker.get(PluginId(3), &mem, Selector::First), Ok(None));
//! ```

pub mod broker;
pub mod error;
pub mod fingerprint;
pub mod interface;
mod ledger;
pub mod registry;
pub mod topology;
pub mod traits;
pub mod trust;

pub use broker::ContextBroker;
pub use error::{LookupError, LookupResult, RegisterError};
pub use fingerprint::Fingerprint;
pub use interface::{CapabilityInterface, ContractId, InterfaceRef, MethodSignature};
pub use registry::Selector;
pub use topology::StaticTopology;
pub use traits::{Category, ConnectionGraph, Context, ContextValue, PluginId};
pub use trust::TrustState;
