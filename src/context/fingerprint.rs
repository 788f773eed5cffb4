//! Structural contract fingerprints.
//!
//! Detects drift between the shape a plugin was built against and the shape
//! the broker is about to accept, without the two sides being compiled
//! together. Methods are sorted by name, rendered as
//! `<returns> <name>(<param>,...);` and the concatenation is digested with
//! SHA-256. Fingerprints are upper-case hex and compared case-insensitively.

use sha2::{Digest, Sha256};
use std::fmt;
use std::fmt::Write as _;

use super::interface::{CapabilityInterface, MethodSignature};

/// Hex-encoded structural digest of a method set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a declared fingerprint.
    pub fn matches(&self, declared: &str) -> bool {
        self.0.eq_ignore_ascii_case(declared)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declared and computed fingerprints disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub actual: Fingerprint,
}

/// Canonical text form of a method set, the digest input.
pub fn canonical_signature(methods: &[MethodSignature]) -> String {
    let mut sorted: Vec<&MethodSignature> = methods.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut out = String::new();
    for method in sorted {
        let _ = write!(out, "{} {}(", method.returns, method.name);
        for param in &method.params {
            out.push_str(param);
            out.push(',');
        }
        out.push_str(");");
    }
    out
}

/// Fingerprint of a raw method set.
pub fn fingerprint_methods(methods: &[MethodSignature]) -> Fingerprint {
    let digest = Sha256::digest(canonical_signature(methods).as_bytes());
    Fingerprint(hex::encode_upper(digest))
}

/// Fingerprint of the methods `iface` declares itself.
pub fn fingerprint(iface: &CapabilityInterface) -> Fingerprint {
    fingerprint_methods(iface.methods())
}

/// Check an interface's actual shape against the fingerprint it declares.
///
/// Root contracts carry no declaration and are verified against their own
/// computed fingerprint.
pub fn verify(iface: &CapabilityInterface) -> Result<Fingerprint, Mismatch> {
    let actual = fingerprint(iface);
    let expected = match iface.contract() {
        Some(contract) => contract.fingerprint.clone(),
        None => actual.0.clone(),
    };

    if actual.matches(&expected) {
        Ok(actual)
    } else {
        Err(Mismatch { expected, actual })
    }
}
