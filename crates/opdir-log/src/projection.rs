//! Projection of a chain into directory entries.

use std::collections::BTreeMap;

use opdir_types::{DirectoryEntry, SignedChangeRecord};

/// Rebuild every operator's entry from a chain, integrating records in
/// order.
pub fn project<'a>(
    chain: impl IntoIterator<Item = &'a SignedChangeRecord>,
) -> BTreeMap<String, DirectoryEntry> {
    let mut entries = BTreeMap::new();
    for record in chain {
        entries
            .entry(record.record.name.clone())
            .or_insert_with(|| DirectoryEntry::new(record.record.name.clone()))
            .integrate(record);
    }
    entries
}
