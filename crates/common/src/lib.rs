//! # Common: Facts, Identities & the Fact Registry
//!
//! **Role**: The vocabulary shared by every pdflow crate.
//!
//! **Core Types**:
//! - `MethodIdentity`: structural key of a method (owner type, name, parameter types).
//! - `Transfer`: a declared disclosure `{recipientId, policyURL}`.
//! - `MethodFacts` / `UnitFacts`: the flat per-method records delivered by the source front end.
//! - `FactRegistry`: append-only store of registered `MethodRecord`s.
//! - `AnalysisConfig`: layered session configuration.

pub mod config;
pub mod facts;
pub mod identity;
pub mod registry;

pub use config::{AnalysisConfig, CliOverrides, ConfigError};
pub use facts::{MethodFacts, UnitFacts};
pub use identity::{namespace_prefix, MethodIdentity};
pub use registry::{FactRegistry, MethodRecord};

use serde::{Deserialize, Serialize};

/// A personal-data classification, usually the qualified name of the annotated type.
pub type Category = String;

/// A declared disclosure of data to an external recipient.
///
/// Equality and ordering use both fields, so sets of transfers are
/// deduplicated by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(rename = "recipientId", default)]
    pub recipient_id: String,
    #[serde(rename = "policyURL", default)]
    pub policy_url: String,
}

impl Transfer {
    pub fn new(recipient_id: impl Into<String>, policy_url: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            policy_url: policy_url.into(),
        }
    }
}
