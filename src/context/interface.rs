//! Capability interface declarations.
//!
//! A capability interface is the named contract a context implements. Four
//! root contracts exist, one per [`Category`]; every other interface extends
//! exactly one parent and carries an explicit, versioned [`ContractId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::traits::Category;

/// Shared handle to an interface declaration.
pub type InterfaceRef = Arc<CapabilityInterface>;

/// One method of a contract, described by canonical type names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Canonical return type name
    pub returns: String,
    /// Canonical parameter type names, in order
    #[serde(default)]
    pub params: Vec<String>,
}

impl MethodSignature {
    pub fn new<I, S>(name: impl Into<String>, returns: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            returns: returns.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

/// Versioned contract identifier declared by an extension interface.
///
/// `fingerprint` is the structural fingerprint the declaring side was built
/// against; registration is refused when the interface's actual shape hashes
/// to something else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractId {
    pub version: u32,
    pub fingerprint: String,
}

impl ContractId {
    pub fn new(version: u32, fingerprint: impl Into<String>) -> Self {
        Self {
            version,
            fingerprint: fingerprint.into(),
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}:{}", self.version, self.fingerprint)
    }
}

#[derive(Debug)]
enum Lineage {
    Root(Category),
    Extends(InterfaceRef),
}

/// A capability interface: name, method shape and place in the hierarchy.
///
/// Interfaces are identified by name within their root category.
#[derive(Debug)]
pub struct CapabilityInterface {
    name: String,
    lineage: Lineage,
    methods: Vec<MethodSignature>,
    contract: Option<ContractId>,
}

impl CapabilityInterface {
    fn root(name: &str, category: Category, methods: Vec<MethodSignature>) -> Self {
        Self {
            name: name.to_string(),
            lineage: Lineage::Root(category),
            methods,
            contract: None,
        }
    }

    /// Declare an interface extending `parent`.
    pub fn extension(
        name: impl Into<String>,
        parent: &InterfaceRef,
        contract: ContractId,
        methods: Vec<MethodSignature>,
    ) -> InterfaceRef {
        Arc::new(Self {
            name: name.into(),
            lineage: Lineage::Extends(Arc::clone(parent)),
            methods,
            contract: Some(contract),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Methods declared directly on this interface (not inherited ones).
    pub fn methods(&self) -> &[MethodSignature] {
        &self.methods
    }

    pub fn parent(&self) -> Option<&InterfaceRef> {
        match &self.lineage {
            Lineage::Root(_) => None,
            Lineage::Extends(parent) => Some(parent),
        }
    }

    /// Declared contract, `None` for the built-in root contracts.
    pub fn contract(&self) -> Option<&ContractId> {
        self.contract.as_ref()
    }

    pub fn is_root(&self) -> bool {
        matches!(self.lineage, Lineage::Root(_))
    }

    /// Category of the root contract at the top of this interface's chain.
    pub fn category(&self) -> Category {
        let mut current = self;
        loop {
            match &current.lineage {
                Lineage::Root(category) => return *category,
                Lineage::Extends(parent) => current = &**parent,
            }
        }
    }

    /// Whether `self` is `other` or transitively extends it. Interfaces
    /// under different root contracts never match, whatever their names.
    pub fn is_subtype_of(&self, other: &CapabilityInterface) -> bool {
        if self.category() != other.category() {
            return false;
        }
        let mut current = Some(self);
        while let Some(iface) = current {
            if iface.name == other.name {
                return true;
            }
            current = iface.parent().map(|parent| &**parent);
        }
        false
    }
}

impl fmt::Display for CapabilityInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

static CPU_CONTEXT: LazyLock<InterfaceRef> = LazyLock::new(|| {
    Arc::new(CapabilityInterface::root(
        "CpuContext",
        Category::Cpu,
        vec![
            MethodSignature::new("clear_interrupt", "()", ["DeviceContext", "u8"]),
            MethodSignature::new("id", "Option<&str>", Vec::<String>::new()),
            MethodSignature::new("is_interrupt_supported", "bool", Vec::<String>::new()),
            MethodSignature::new("set_interrupt", "()", ["DeviceContext", "u8"]),
        ],
    ))
});

static MEMORY_CONTEXT: LazyLock<InterfaceRef> = LazyLock::new(|| {
    Arc::new(CapabilityInterface::root(
        "MemoryContext",
        Category::Memory,
        vec![
            MethodSignature::new("clear", "()", Vec::<String>::new()),
            MethodSignature::new("data_type", "DataType", Vec::<String>::new()),
            MethodSignature::new("id", "Option<&str>", Vec::<String>::new()),
            MethodSignature::new("read", "Word", ["u64"]),
            MethodSignature::new("write", "()", ["u64", "Word"]),
        ],
    ))
});

static DEVICE_CONTEXT: LazyLock<InterfaceRef> = LazyLock::new(|| {
    Arc::new(CapabilityInterface::root(
        "DeviceContext",
        Category::Device,
        vec![
            MethodSignature::new("data_type", "DataType", Vec::<String>::new()),
            MethodSignature::new("id", "Option<&str>", Vec::<String>::new()),
            MethodSignature::new("read", "Word", Vec::<String>::new()),
            MethodSignature::new("write", "()", ["Word"]),
        ],
    ))
});

static COMPILER_CONTEXT: LazyLock<InterfaceRef> = LazyLock::new(|| {
    Arc::new(CapabilityInterface::root(
        "CompilerContext",
        Category::Compiler,
        vec![
            MethodSignature::new("id", "Option<&str>", Vec::<String>::new()),
            MethodSignature::new("program_start", "Option<u64>", Vec::<String>::new()),
        ],
    ))
});

/// Built-in root contract for CPU contexts.
pub fn cpu_context() -> InterfaceRef {
    Arc::clone(&CPU_CONTEXT)
}

/// Built-in root contract for memory contexts.
pub fn memory_context() -> InterfaceRef {
    Arc::clone(&MEMORY_CONTEXT)
}

/// Built-in root contract for device contexts.
pub fn device_context() -> InterfaceRef {
    Arc::clone(&DEVICE_CONTEXT)
}

/// Built-in root contract for compiler contexts.
pub fn compiler_context() -> InterfaceRef {
    Arc::clone(&COMPILER_CONTEXT)
}

/// Root contract of `category`.
pub fn root_contract(category: Category) -> InterfaceRef {
    match category {
        Category::Cpu => cpu_context(),
        Category::Memory => memory_context(),
        Category::Device => device_context(),
        Category::Compiler => compiler_context(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_contracts_report_their_category() {
        for category in Category::ALL {
            let root = root_contract(category);
            assert!(root.is_root());
            assert_eq!(root.category(), category);
            assert!(root.contract().is_none());
        }
    }

    #[test]
    fn extension_inherits_category_through_chain() {
        let mem = memory_context();
        let banked = CapabilityInterface::extension(
            "BankedMemory",
            &mem,
            ContractId::new(1, "00"),
            vec![MethodSignature::new("select_bank", "()", ["u8"])],
        );
        let paged = CapabilityInterface::extension(
            "PagedBankedMemory",
            &banked,
            ContractId::new(1, "00"),
            Vec::new(),
        );
        assert_eq!(paged.category(), Category::Memory);
        assert!(paged.is_subtype_of(&banked));
        assert!(paged.is_subtype_of(&mem));
        assert!(!banked.is_subtype_of(&paged));
        assert!(!paged.is_subtype_of(&cpu_context()));
    }

    #[test]
    fn same_name_under_different_roots_is_not_a_subtype() {
        let on_memory = CapabilityInterface::extension(
            "Banked",
            &memory_context(),
            ContractId::new(1, "00"),
            Vec::new(),
        );
        let on_device = CapabilityInterface::extension(
            "Banked",
            &device_context(),
            ContractId::new(1, "00"),
            Vec::new(),
        );
        assert!(!on_memory.is_subtype_of(&on_device));
        assert!(!on_device.is_subtype_of(&on_memory));
        assert!(on_memory.is_subtype_of(&on_memory));
    }

    #[test]
    fn method_signature_deserializes_without_params() {
        let sig: MethodSignature =
            serde_json::from_str(r#"{"name":"reset","returns":"()"}"#).unwrap();
        assert!(sig.params.is_empty());
    }
}
