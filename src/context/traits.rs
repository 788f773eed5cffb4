//! Core broker types.
//!
//! Plugin identity, capability categories and the [`Context`] trait that
//! every published extension point implements.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::interface::InterfaceRef;

/// Opaque identifier of a plugin instance, stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(pub u64);

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PluginId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Root capability domains. A context belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Processor contexts (interrupts, execution state)
    Cpu,
    /// Operating memory contexts
    Memory,
    /// Peripheral device contexts
    Device,
    /// Compiler contexts
    Compiler,
}

impl Category {
    /// All categories, in category inference order.
    pub const ALL: [Self; 4] = [Self::Cpu, Self::Memory, Self::Device, Self::Compiler];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Device => "device",
            Self::Compiler => "compiler",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Memory => 1,
            Self::Device => 2,
            Self::Compiler => 3,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upcast helper so concrete contexts can be recovered from a trait object.
///
/// Implemented for every `'static` type; never implement it by hand.
pub trait AsAnyArc {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// A typed extension point published by a plugin.
///
/// Implementors declare, at compile time, which capability interfaces they
/// implement. The broker derives the context's [`Category`] from the root
/// contracts those interfaces extend.
pub trait Context: AsAnyArc + Send + Sync {
    /// Capability interfaces this value implements.
    fn interfaces(&self) -> Vec<InterfaceRef>;

    /// Optional disambiguation ID, used when a plugin registers several
    /// contexts under the same interface. Matched case-sensitively.
    fn id(&self) -> Option<&str> {
        None
    }
}

/// Identity of a registered value: the address of its shared allocation.
///
/// Stable while the value is registered because the registry holds a
/// strong reference.
pub(crate) type Identity = usize;

/// Shared handle to a context. Equality is identity, not structure.
#[derive(Clone)]
pub struct ContextValue(Arc<dyn Context>);

impl ContextValue {
    /// Wrap a concrete context.
    pub fn new<T: Context + 'static>(value: Arc<T>) -> Self {
        Self(value)
    }

    /// Wrap an already type-erased context.
    pub fn from_arc(value: Arc<dyn Context>) -> Self {
        Self(value)
    }

    /// The context's disambiguation ID, if it has one.
    pub fn id(&self) -> Option<&str> {
        self.0.id()
    }

    /// Interfaces declared by the underlying value.
    pub fn interfaces(&self) -> Vec<InterfaceRef> {
        self.0.interfaces()
    }

    /// Recover the concrete implementation type.
    pub fn downcast<T: Context + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).into_any_arc().downcast::<T>().ok()
    }

    /// Borrow the trait object.
    pub fn as_context(&self) -> &dyn Context {
        self.0.as_ref()
    }

    /// Whether both handles refer to the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    pub(crate) fn identity(&self) -> Identity {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ContextValue {}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextValue")
            .field("identity", &format_args!("{:#x}", self.identity()))
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

impl<T: Context + 'static> From<Arc<T>> for ContextValue {
    fn from(value: Arc<T>) -> Self {
        Self::new(value)
    }
}

/// Host-supplied topology oracle.
///
/// Answers whether `requester` may interact with `owner`. The broker treats
/// the answer as opaque; symmetry is host policy.
pub trait ConnectionGraph: Send + Sync {
    fn is_connected(&self, requester: PluginId, owner: PluginId) -> bool;
}

impl<F> ConnectionGraph for F
where
    F: Fn(PluginId, PluginId) -> bool + Send + Sync,
{
    fn is_connected(&self, requester: PluginId, owner: PluginId) -> bool {
        self(requester, owner)
    }
}
