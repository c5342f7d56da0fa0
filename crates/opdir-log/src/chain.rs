//! Chain reconstruction from an unordered record set.

use std::collections::{HashMap, HashSet};

use opdir_types::{RecordHash, SignedChangeRecord};
use tracing::debug;

/// Records indexed by hash, with parent → children edges.
///
/// Roots and children keep the order in which records were added, which
/// makes chain examination order follow storage read order. A record
/// whose hash was already seen is dropped. A record whose parent is not in
/// the set is an orphan and belongs to no chain.
#[derive(Debug, Default)]
pub struct RecordGraph {
    records: Vec<SignedChangeRecord>,
    index: HashMap<RecordHash, usize>,
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
    orphans: usize,
}

impl RecordGraph {
    pub fn build(records: impl IntoIterator<Item = SignedChangeRecord>) -> Self {
        let mut graph = Self::default();
        for record in records {
            if graph.index.contains_key(&record.hash) {
                continue;
            }
            graph.index.insert(record.hash, graph.records.len());
            graph.records.push(record);
            graph.children.push(Vec::new());
        }

        for (idx, record) in graph.records.iter().enumerate() {
            match &record.parent_hash {
                None => graph.roots.push(idx),
                Some(parent) => match graph.index.get(parent) {
                    Some(&p) => graph.children[p].push(idx),
                    None => graph.orphans += 1,
                },
            }
        }

        if graph.orphans > 0 {
            debug!(orphans = graph.orphans, "records with unknown parents ignored");
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose parent is unknown.
    pub fn orphans(&self) -> usize {
        self.orphans
    }

    pub fn get(&self, hash: &RecordHash) -> Option<&SignedChangeRecord> {
        self.index.get(hash).map(|&i| &self.records[i])
    }

    /// Every maximal root-to-leaf chain, in examination order.
    ///
    /// Depth-first with an explicit stack; the first child is expanded
    /// first. A fork yields one chain per branch.
    pub fn chains(&self) -> Vec<Chain<'_>> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();

        for &root in &self.roots {
            let mut path: Vec<usize> = Vec::new();
            let mut stack = vec![(root, 0usize)];

            while let Some((idx, depth)) = stack.pop() {
                if !visited.insert(idx) {
                    continue;
                }
                path.truncate(depth);
                path.push(idx);

                let children = &self.children[idx];
                if children.is_empty() {
                    out.push(Chain {
                        records: path.iter().map(|&i| &self.records[i]).collect(),
                    });
                    continue;
                }
                for &child in children.iter().rev() {
                    stack.push((child, depth + 1));
                }
            }
        }
        out
    }
}

/// One root-to-leaf sequence borrowed from a [`RecordGraph`].
#[derive(Debug, Clone, PartialEq)]
pub struct Chain<'g> {
    records: Vec<&'g SignedChangeRecord>,
}

impl<'g> Chain<'g> {
    pub fn root(&self) -> Option<&'g SignedChangeRecord> {
        self.records.first().copied()
    }

    pub fn leaf(&self) -> Option<&'g SignedChangeRecord> {
        self.records.last().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[&'g SignedChangeRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &'g SignedChangeRecord> + '_ {
        self.records.iter().copied()
    }
}
