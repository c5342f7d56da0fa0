//! Projected directory entries and queries over them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::certificate::OperatorCertificate;
use crate::record::SignedChangeRecord;
use crate::SECTION_CERTIFICATES;

/// The current view of one operator, accumulated from its change records.
///
/// Entries are always rebuilt from a chain by integrating records in
/// order; they are never patched in place by the log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Operator name.
    pub name: String,
    /// Section name → latest section data.
    pub sections: BTreeMap<String, serde_json::Value>,
    /// Every record integrated into this entry, in chain order.
    pub records: Vec<SignedChangeRecord>,
}

impl DirectoryEntry {
    /// Create an empty entry for the given operator.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Integrate a change record: its data replaces the section value and
    /// the record is appended to the audit trail.
    pub fn integrate(&mut self, record: &SignedChangeRecord) {
        self.sections
            .insert(record.record.section.clone(), record.record.data.clone());
        self.records.push(record.clone());
    }

    /// Look up a section's current data.
    pub fn section(&self, name: &str) -> Option<&serde_json::Value> {
        self.sections.get(name)
    }

    /// Certificates published in the `certificates` section.
    ///
    /// Returns an empty list when the section is absent or malformed.
    pub fn certificates(&self) -> Vec<OperatorCertificate> {
        self.section(SECTION_CERTIFICATES)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }
}

/// Filter for directory lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryQuery {
    /// Only return the entry for this operator.
    #[serde(default)]
    pub operator: Option<String>,
    /// Only return entries carrying every listed section.
    #[serde(default)]
    pub sections: Vec<String>,
}

impl DirectoryQuery {
    /// Query matching every entry.
    pub fn all() -> Self {
        Self::default()
    }

    /// Query matching a single operator.
    pub fn operator(name: impl Into<String>) -> Self {
        Self {
            operator: Some(name.into()),
            sections: Vec::new(),
        }
    }

    /// Additionally require a section to be present.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.sections.push(section.into());
        self
    }

    /// Whether an entry satisfies the query.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        if let Some(operator) = &self.operator
            && *operator != entry.name
        {
            return false;
        }
        self.sections
            .iter()
            .all(|s| entry.sections.contains_key(s))
    }
}

/// Apply a query to a set of entries, preserving their order.
pub fn filter_entries<'a>(
    entries: impl IntoIterator<Item = &'a DirectoryEntry>,
    query: &DirectoryQuery,
) -> Vec<DirectoryEntry> {
    entries
        .into_iter()
        .filter(|e| query.matches(e))
        .cloned()
        .collect()
}
