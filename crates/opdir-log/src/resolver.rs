//! Fork resolution: pick the authoritative chain.

use std::collections::{BTreeMap, HashMap};

use opdir_types::{DirectoryEntry, RecordHash, SignedChangeRecord};
use opdir_verify::{TrustStore, Verification, verify_record};
use tracing::{debug, warn};

use crate::chain::{Chain, RecordGraph};
use crate::projection::project;

/// The selected chain and its projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub chain: Vec<SignedChangeRecord>,
    pub entries: BTreeMap<String, DirectoryEntry>,
}

impl Resolution {
    pub fn tip(&self) -> Option<&SignedChangeRecord> {
        self.chain.last()
    }
}

/// Verification outcomes keyed by record hash.
///
/// A record's preceding records are its unique path from the root, so its
/// outcome is the same in every chain that contains it.
type VerdictCache = HashMap<RecordHash, bool>;

/// The longest prefix of `chain` in which every record verifies against
/// the records before it.
///
/// The first failing record ends the prefix; its descendants are never
/// considered.
pub fn valid_prefix<'g>(chain: &Chain<'g>, trust: &TrustStore) -> Vec<&'g SignedChangeRecord> {
    valid_prefix_cached(chain, trust, &mut VerdictCache::new())
}

fn valid_prefix_cached<'g>(
    chain: &Chain<'g>,
    trust: &TrustStore,
    cache: &mut VerdictCache,
) -> Vec<&'g SignedChangeRecord> {
    let mut valid: Vec<&'g SignedChangeRecord> = Vec::with_capacity(chain.len());
    for record in chain.iter() {
        let ok = match cache.get(&record.hash) {
            Some(&ok) => ok,
            None => {
                let ok = match verify_record(record, valid.iter().copied(), trust) {
                    Ok(Verification::Valid) => true,
                    Ok(Verification::Rejected(reason)) => {
                        warn!(hash = %record.hash, name = %record.record.name, %reason, "record rejected");
                        false
                    }
                    Err(e) => {
                        warn!(hash = %record.hash, error = %e, "record failed verification");
                        false
                    }
                };
                cache.insert(record.hash, ok);
                ok
            }
        };
        if !ok {
            break;
        }
        valid.push(record);
    }
    valid
}

/// Verify every chain of `graph` and select the authoritative one.
///
/// The surviving chain whose root was created last wins. On equal root
/// times the chain examined first is kept, unless a later one extends it:
/// a chain cut short by a rejected record never shadows a valid sibling
/// branch. With no surviving chain the resolution is empty.
pub fn resolve(graph: &RecordGraph, trust: &TrustStore) -> Resolution {
    let mut cache = VerdictCache::new();
    let mut best: Option<Vec<&SignedChangeRecord>> = None;

    for chain in graph.chains() {
        let valid = valid_prefix_cached(&chain, trust, &mut cache);
        let Some(root) = valid.first() else {
            continue;
        };

        let replace = match best.as_deref() {
            None | Some([]) => true,
            Some(current) => {
                root.record.created_at > current[0].record.created_at || extends(&valid, current)
            }
        };
        if replace {
            best = Some(valid);
        }
    }

    let chain: Vec<SignedChangeRecord> = best
        .unwrap_or_default()
        .into_iter()
        .cloned()
        .collect();
    let entries = project(&chain);

    debug!(
        records = graph.len(),
        chain_len = chain.len(),
        operators = entries.len(),
        "resolved authoritative chain"
    );

    Resolution { chain, entries }
}

/// Whether `candidate` strictly extends `current`.
fn extends(candidate: &[&SignedChangeRecord], current: &[&SignedChangeRecord]) -> bool {
    candidate.len() > current.len()
        && candidate.iter().zip(current).all(|(a, b)| a.hash == b.hash)
}
