//! ctxbroker - plugin context broker for modular emulators.
//!
//! Plugins (CPU, memory, device, compiler) publish typed extension points
//! called *contexts*. Other plugins may only consume a context when the
//! host-defined topology says the two plugins are connected. See
//! [`context`] for the broker itself and [`config`] for host-side settings.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod context;

pub use config::BrokerConfig;
pub use context::{
    CapabilityInterface, Category, ConnectionGraph, Context, ContextBroker, ContextValue,
    ContractId, LookupError, MethodSignature, PluginId, RegisterError, Selector, StaticTopology,
    TrustState,
};
