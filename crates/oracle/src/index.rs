//! Implementation index: interface method -> concrete implementations.

use common::MethodIdentity;
use std::collections::HashMap;

/// Maps an abstract or interface method identity to every registered method
/// that implements it.
///
/// Each alternative is the identity of a registered implementor; its record
/// (direct data and callee set) is final once registered, so the alternative
/// never changes after it is appended. Growth is monotonic.
#[derive(Debug, Default)]
pub struct ImplementationIndex {
    alternatives: HashMap<MethodIdentity, Vec<MethodIdentity>>,
}

impl ImplementationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `implementor` as one alternative for `interface_method`.
    ///
    /// Called once per implemented interface, on the implementor's first
    /// registration. Returns `false` if the pair was already known.
    pub fn add(&mut self, interface_method: MethodIdentity, implementor: MethodIdentity) -> bool {
        let alternatives = self.alternatives.entry(interface_method).or_default();
        if alternatives.contains(&implementor) {
            return false;
        }
        alternatives.push(implementor);
        true
    }

    /// All known implementations of `interface_method`, in registration order.
    pub fn lookup(&self, interface_method: &MethodIdentity) -> &[MethodIdentity] {
        self.alternatives
            .get(interface_method)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_implementations(&self, interface_method: &MethodIdentity) -> bool {
        !self.lookup(interface_method).is_empty()
    }

    /// Iterates `(interface method, implementors)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&MethodIdentity, &[MethodIdentity])> {
        self.alternatives.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Number of interface methods with at least one implementation.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}
