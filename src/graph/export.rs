//! Tree-to-flat exporter.
//!
//! The structural dual of [`crate::graph::import`]: walks a forest of owned
//! trees and produces one deduplicated package record per `(key, version)`
//! identity plus one edge per parent→child encounter. Reused identities keep
//! their first document-local id, so the flat encoding can express the DAG
//! the tree shape cannot.

use crate::model::{Dependency, License, VersionedKey};
use indexmap::IndexMap;

/// One exported package record.
///
/// `id` is document-local and sequential in first-seen order; format adapters
/// turn it into an SPDXID or bom-ref. License data is attached here once, on
/// first materialization; later tree occurrences of the same identity do not
/// re-attach it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPackage {
    pub id: usize,
    pub name: String,
    pub namespace: String,
    pub version: Option<String>,
    pub licenses: Vec<License>,
    pub description: String,
    pub checksum: String,
    /// Package-URL locator, when the ecosystem type allows one.
    pub purl: Option<String>,
}

/// Flattened scan: deduplicated packages plus `(parent id, child id)` edges.
///
/// `roots` lists the package ids of the top-level forest nodes, in order;
/// adapters use it to register the document subject's direct dependencies.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlatScan {
    pub packages: Vec<ExportedPackage>,
    pub edges: Vec<(usize, usize)>,
    pub roots: Vec<usize>,
}

/// Flatten a forest into packages and relationship edges.
///
/// Pre-order walk with an explicit stack; every parent→child relationship in
/// the input emits exactly one edge, even when both endpoints were already
/// materialized elsewhere.
#[must_use]
pub fn flatten_forest(forest: &[Dependency]) -> FlatScan {
    let mut visited: IndexMap<VersionedKey, usize> = IndexMap::new();
    let mut out = FlatScan::default();

    let mut stack: Vec<(Option<usize>, &Dependency)> =
        forest.iter().rev().map(|dep| (None, dep)).collect();

    while let Some((parent, dep)) = stack.pop() {
        let identity = dep.versioned_key();
        let id = match visited.get(&identity) {
            Some(&id) => id,
            None => {
                let id = out.packages.len();
                out.packages.push(materialize(dep, id));
                visited.insert(identity, id);
                id
            }
        };

        match parent {
            Some(parent) => out.edges.push((parent, id)),
            None => {
                if !out.roots.contains(&id) {
                    out.roots.push(id);
                }
            }
        }

        stack.extend(dep.dependencies.iter().rev().map(|child| (Some(id), child)));
    }

    out
}

fn materialize(dep: &Dependency, id: usize) -> ExportedPackage {
    ExportedPackage {
        id,
        name: dep.name.clone(),
        namespace: dep.namespace.clone(),
        version: dep.version().map(str::to_string),
        licenses: dep.licenses.clone(),
        description: dep.description.clone(),
        checksum: dep.checksum.clone(),
        purl: dep.purl(),
    }
}
