//! Reachability resolver: depth-first personal-data reachability over the
//! fact registry and the implementation index.
//!
//! # Algorithm
//! For each identity popped from the work stack:
//! 1. Already visited in this traversal: skip. Every node is expanded at most
//!    once per traversal, whatever the cycle shape.
//! 2. Implemented by registered methods: union the direct data of **every**
//!    implementation and continue into each implementation's callees. Any
//!    implementation may be selected at run time, so results are never narrowed.
//! 3. Registered: union its direct data and continue into its callees.
//! 4. Unknown: same namespace prefix as the entry point means the method may
//!    still arrive in a later unit (`pending`); otherwise it is external code
//!    that is never waited for (`out_of_scope`).
//!
//! The traversal uses an explicit stack, so call chain depth is bounded by
//! memory, not by the thread's stack.

use crate::index::ImplementationIndex;
use common::{Category, FactRegistry, MethodIdentity, MethodRecord, Transfer};
use std::collections::{BTreeSet, HashSet};

/// Union of personal data reachable from some point in the call graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reach {
    pub categories: BTreeSet<Category>,
    pub transfers: BTreeSet<Transfer>,
}

impl Reach {
    fn absorb(&mut self, record: &MethodRecord) {
        self.categories.extend(record.categories.iter().cloned());
        self.transfers.extend(record.transfers.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.transfers.is_empty()
    }
}

/// How an identity with neither a record nor an implementation is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// Inside the program under analysis; may be registered by a later unit.
    Pending,
    /// Third-party or platform code; never retried.
    OutOfScope,
}

/// Result of resolving one entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryResolution {
    pub reach: Reach,
    /// Same-namespace methods that were called but are not registered yet.
    pub pending: BTreeSet<MethodIdentity>,
    /// Unregistered methods outside the namespace. They are never waited
    /// for, and an entry that reaches one is never finalized.
    pub out_of_scope: BTreeSet<MethodIdentity>,
    /// Interface methods that were expanded through the implementation index.
    pub interfaces: BTreeSet<MethodIdentity>,
}

impl EntryResolution {
    /// Every reachable method is registered.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty() && self.out_of_scope.is_empty()
    }
}

/// Read-only view over the session's registries.
pub struct Resolver<'a> {
    registry: &'a FactRegistry,
    index: &'a ImplementationIndex,
    namespace_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a FactRegistry,
        index: &'a ImplementationIndex,
        namespace_depth: usize,
    ) -> Self {
        Self {
            registry,
            index,
            namespace_depth,
        }
    }

    /// Resolves an entry point from scratch, with a fresh visited set.
    pub fn resolve_entry(&self, entry: &MethodIdentity) -> EntryResolution {
        let mut visited = HashSet::new();
        let mut out = EntryResolution::default();
        let scope = entry.namespace_prefix(self.namespace_depth);
        self.resolve(entry, &scope, &mut visited, &mut out);
        out
    }

    /// Accumulates into `out` everything reachable from `start` that is not
    /// yet in `visited`.
    ///
    /// `scope` is the namespace prefix the pending/out-of-scope decision is
    /// made against.
    pub fn resolve(
        &self,
        start: &MethodIdentity,
        scope: &str,
        visited: &mut HashSet<MethodIdentity>,
        out: &mut EntryResolution,
    ) {
        let mut stack: Vec<&MethodIdentity> = vec![start];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }

            let implementations = self.index.lookup(current);
            if !implementations.is_empty() {
                out.interfaces.insert(current.clone());
                for implementor in implementations {
                    if let Some(record) = self.registry.lookup(implementor) {
                        out.reach.absorb(record);
                        stack.extend(record.callees.iter().filter(|c| !visited.contains(*c)));
                    }
                }
            } else if let Some(record) = self.registry.lookup(current) {
                out.reach.absorb(record);
                stack.extend(record.callees.iter().filter(|c| !visited.contains(*c)));
            } else {
                match self.classify(scope, current) {
                    Missing::Pending => {
                        out.pending.insert(current.clone());
                    }
                    Missing::OutOfScope => {
                        tracing::trace!(method = %current, "outside analysed namespace");
                        out.out_of_scope.insert(current.clone());
                    }
                }
            }
        }
    }

    /// Compares the namespace prefix of `missing` with `scope`.
    pub fn classify(&self, scope: &str, missing: &MethodIdentity) -> Missing {
        if missing.namespace_prefix(self.namespace_depth) == scope {
            Missing::Pending
        } else {
            Missing::OutOfScope
        }
    }
}
