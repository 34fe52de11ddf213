//! Flat-to-tree importer.
//!
//! Reconstructs a forest of owned [`Dependency`] trees from a flat component
//! map plus an ordered relationship list, as produced by parsing SPDX or
//! CycloneDX documents. The pass is tolerant: edges referencing undeclared
//! components are dropped with a warning, cyclic relationship data truncates
//! into leaf stubs instead of looping.

use crate::model::{Dependency, VersionedKey};
use indexmap::IndexMap;

/// The flat shape consumed by [`build_forest`].
///
/// `components` is keyed by the document-local component id (SPDXID,
/// bom-ref) in declaration order; each entry starts childless. `edges` are
/// `(source, target)` pairs in document order, meaning "source depends on
/// target". `root` optionally names the document's own subject: edges from it
/// are skipped and it never appears in the output forest, so its direct
/// dependencies become the forest roots.
#[derive(Debug, Default)]
pub struct FlatGraph {
    pub components: IndexMap<String, Dependency>,
    pub edges: Vec<(String, String)>,
    pub root: Option<String>,
}

impl FlatGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, id: impl Into<String>, dep: Dependency) {
        self.components.insert(id.into(), dep);
    }

    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.edges.push((source.into(), target.into()));
    }
}

/// Reconstruct the dependency forest from a flat document ("detach-and-graft").
///
/// Edge processing detaches every referenced target from the root-candidate
/// pool and grafts a childless stub of it under its source; whatever was never
/// referenced as a target is a forest root. A second pass then walks the
/// forest and splices each detached component — with its full subtree — into
/// the first stub occurrence of its `(key, version)` identity. Every other
/// occurrence stays a leaf stub, which bounds the output for diamond
/// dependencies and terminates cycles.
#[must_use]
pub fn build_forest(graph: FlatGraph) -> Vec<Dependency> {
    let FlatGraph {
        mut components,
        edges,
        root,
    } = graph;

    if let Some(root_id) = &root {
        components.shift_remove(root_id);
    }

    // Phase 1: graft a stub of every edge target under its source. Components
    // consumed as targets move into `detached`, keyed by document id.
    let mut detached: IndexMap<String, Dependency> = IndexMap::new();

    for (source, target) in &edges {
        if root.as_deref() == Some(source.as_str()) {
            continue;
        }

        if let Some(dep) = components.shift_remove(target) {
            detached.insert(target.clone(), dep);
        }
        let Some(stub) = detached.get(target).map(Dependency::as_stub) else {
            tracing::warn!(%source, %target, "relationship target not declared; edge dropped");
            continue;
        };

        let parent = components
            .get_mut(source)
            .or_else(|| detached.get_mut(source));
        match parent {
            Some(parent) => parent.dependencies.push(stub),
            None => {
                tracing::warn!(%source, %target, "relationship source not declared; edge dropped");
            }
        }
    }

    // Phase 2: re-key the detached pool by identity and expand the forest.
    // Each identity is spliced in exactly once; the pool only shrinks.
    let mut pool: IndexMap<VersionedKey, Dependency> = detached
        .into_values()
        .map(|dep| (dep.versioned_key(), dep))
        .collect();

    let mut forest: Vec<Dependency> = components.into_values().collect();
    expand(&mut forest, &mut pool);

    // Components only reachable through a cycle have no root; promote them so
    // they still appear in the forest, truncated at the cycle edge.
    while let Some((key, orphan)) = pool.shift_remove_index(0) {
        tracing::debug!(key = %key.key, "promoting cycle-bound component to forest root");
        forest.push(orphan);
        let start = forest.len() - 1;
        expand(&mut forest[start..], &mut pool);
    }

    forest
}

/// Depth-first splice pass over `nodes` with an explicit work stack.
fn expand(nodes: &mut [Dependency], pool: &mut IndexMap<VersionedKey, Dependency>) {
    let mut stack: Vec<&mut Dependency> = nodes.iter_mut().collect();
    while let Some(node) = stack.pop() {
        for child in node.dependencies.iter_mut() {
            if let Some(full) = pool.shift_remove(&child.versioned_key()) {
                *child = full;
            }
            stack.push(child);
        }
    }
}
