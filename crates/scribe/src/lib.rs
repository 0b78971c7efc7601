//! # The Scribe: Compliance Reports
//!
//! **Role**: Renders the reachable personal data of a unit's entry points
//! into one aggregate report per unit, and writes it to a report sink.
//!
//! Category and transfer arrays are emitted sorted so that reports are
//! byte-for-byte reproducible across runs.

pub mod html;
pub mod sink;

pub use sink::{DirectorySink, MemorySink, ReportSink};

use common::{Category, Transfer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Errors from report rendering and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),
    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),
    #[error("Invalid report name: {0:?}")]
    InvalidName(String),
}

/// Per-entry-point record inside a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purpose {
    pub name: String,
    #[serde(default)]
    pub opt_out: bool,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub retention: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub pm: Option<String>,
    #[serde(default)]
    pub purposes: Vec<Purpose>,
    #[serde(default)]
    pub data: Vec<Category>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

impl Purpose {
    pub fn new<'a>(
        name: impl Into<String>,
        data: impl IntoIterator<Item = &'a Category>,
        transfers: impl IntoIterator<Item = &'a Transfer>,
    ) -> Self {
        let data: BTreeSet<&Category> = data.into_iter().collect();
        let transfers: BTreeSet<&Transfer> = transfers.into_iter().collect();
        Self {
            name: name.into(),
            opt_out: false,
            required: true,
            retention: None,
            description: String::new(),
            pm: None,
            purposes: Vec::new(),
            data: data.into_iter().cloned().collect(),
            transfers: transfers.into_iter().cloned().collect(),
        }
    }
}

/// Aggregate report for one source unit that declares entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub name: String,
    #[serde(default)]
    pub opt_out: bool,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub retention: Option<String>,
    #[serde(default)]
    pub pm: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub purposes: Vec<Purpose>,
    /// Union of every purpose's data.
    #[serde(default)]
    pub data: Vec<Category>,
    /// Union of every purpose's transfers.
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

fn default_required() -> bool {
    true
}

impl Report {
    /// Builds a report and its unit-level unions from per-entry-point purposes.
    pub fn from_purposes(name: impl Into<String>, purposes: Vec<Purpose>) -> Self {
        let data: BTreeSet<&Category> = purposes.iter().flat_map(|p| &p.data).collect();
        let transfers: BTreeSet<&Transfer> = purposes.iter().flat_map(|p| &p.transfers).collect();
        let data = data.into_iter().cloned().collect();
        let transfers = transfers.into_iter().cloned().collect();
        Self {
            name: name.into(),
            opt_out: false,
            required: true,
            retention: None,
            pm: None,
            description: String::new(),
            purposes,
            data,
            transfers,
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
