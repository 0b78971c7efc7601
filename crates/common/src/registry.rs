//! # Fact Registry: Append-Only Method Store
//!
//! Holds one `MethodRecord` per registered `MethodIdentity` for the lifetime
//! of an analysis session. The first registration of an identity is
//! authoritative; later attempts are no-ops.

use crate::{Category, MethodFacts, MethodIdentity, Transfer};
use std::collections::{BTreeSet, HashMap};

/// Immutable facts about one registered method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    pub identity: MethodIdentity,
    pub callees: BTreeSet<MethodIdentity>,
    pub categories: BTreeSet<Category>,
    pub transfers: BTreeSet<Transfer>,
    pub implements: BTreeSet<MethodIdentity>,
}

impl MethodRecord {
    /// Builds a record from front-end facts.
    ///
    /// A method whose fact extraction failed keeps its callees but is
    /// degraded to empty categories and transfers.
    pub fn from_facts(facts: &MethodFacts) -> Self {
        let (categories, transfers) = match &facts.error {
            Some(error) => {
                tracing::warn!(
                    method = %facts.identity,
                    error = %error,
                    "fact extraction failed, treating method as carrying no personal data"
                );
                (BTreeSet::new(), BTreeSet::new())
            }
            None => (
                facts.categories.iter().cloned().collect(),
                facts.transfers.iter().cloned().collect(),
            ),
        };

        Self {
            identity: facts.identity.clone(),
            callees: facts.callees.iter().cloned().collect(),
            categories,
            transfers,
            implements: facts.implements.iter().cloned().collect(),
        }
    }
}

/// In-memory fact registry keyed by method identity.
#[derive(Debug, Default)]
pub struct FactRegistry {
    records: HashMap<MethodIdentity, MethodRecord>,
}

impl FactRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record. Returns the stored record on first registration,
    /// `None` when the identity was already present (the stored record is kept).
    pub fn register(&mut self, record: MethodRecord) -> Option<&MethodRecord> {
        use std::collections::hash_map::Entry;
        match self.records.entry(record.identity.clone()) {
            Entry::Occupied(_) => {
                tracing::debug!(method = %record.identity, "already registered, ignoring");
                None
            }
            Entry::Vacant(slot) => Some(slot.insert(record)),
        }
    }

    pub fn lookup(&self, identity: &MethodIdentity) -> Option<&MethodRecord> {
        self.records.get(identity)
    }

    pub fn contains(&self, identity: &MethodIdentity) -> bool {
        self.records.contains_key(identity)
    }

    /// Returns the number of registered methods.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &MethodRecord> {
        self.records.values()
    }
}
