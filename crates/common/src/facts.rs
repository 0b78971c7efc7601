//! Flat fact records delivered by the source front end, one batch per source unit.

use crate::{Category, MethodIdentity, Transfer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Everything the front end extracted about a single method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodFacts {
    pub identity: MethodIdentity,
    /// Direct call targets. Calls the front end could not resolve are simply absent.
    #[serde(default)]
    pub callees: Vec<MethodIdentity>,
    /// Personal-data categories used directly in this method's body.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Transfers declared by methods this method invokes directly.
    #[serde(default)]
    pub transfers: Vec<Transfer>,
    /// Externally reachable (request handler, exported API, ...).
    #[serde(default)]
    pub entry_point: bool,
    /// Interface method identities this method implements.
    #[serde(default)]
    pub implements: Vec<MethodIdentity>,
    /// Abstract declarations carry no body and are never registered.
    #[serde(default)]
    pub is_abstract: bool,
    /// Set when the front end failed to extract this method's data facts.
    #[serde(default)]
    pub error: Option<String>,
}

impl MethodFacts {
    /// A concrete, non-entry method with no callees and no data.
    pub fn new(identity: MethodIdentity) -> Self {
        Self {
            identity,
            callees: Vec::new(),
            categories: Vec::new(),
            transfers: Vec::new(),
            entry_point: false,
            implements: Vec::new(),
            is_abstract: false,
            error: None,
        }
    }

    pub fn calls(mut self, callee: MethodIdentity) -> Self {
        self.callees.push(callee);
        self
    }

    pub fn category(mut self, category: impl Into<Category>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn transfer(mut self, transfer: Transfer) -> Self {
        self.transfers.push(transfer);
        self
    }

    pub fn implementing(mut self, interface_method: MethodIdentity) -> Self {
        self.implements.push(interface_method);
        self
    }

    pub fn entry(mut self) -> Self {
        self.entry_point = true;
        self
    }

    pub fn abstract_decl(mut self) -> Self {
        self.is_abstract = true;
        self
    }
}

/// One incremental batch of facts: a single source unit's methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFacts {
    /// Fully qualified unit name (`package.FileStem`). Reports are keyed by it.
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodFacts>,
}

impl UnitFacts {
    pub fn new(name: impl Into<String>, methods: Vec<MethodFacts>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }

    /// Entry points declared by this unit, in declaration order, without duplicates.
    pub fn entry_points(&self) -> Vec<MethodIdentity> {
        let mut seen: HashSet<&MethodIdentity> = HashSet::new();
        let mut out = Vec::new();
        for m in &self.methods {
            if m.entry_point && seen.insert(&m.identity) {
                out.push(m.identity.clone());
            }
        }
        out
    }
}
