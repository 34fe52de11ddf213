//! Format-agnostic conversion between flat SBOM encodings and owned
//! dependency trees.
//!
//! Flat encodings (SPDX packages + relationships, CycloneDX components +
//! dependency registrations) store a component list and an edge list side by
//! side; the graph model stores owned trees. [`import`] reconstructs a forest
//! from the flat shape, [`export`] flattens a forest back. Both are
//! single-threaded, allocation-only transforms over their own inputs: no IO,
//! no shared state, explicit work stacks instead of recursion.

pub mod export;
pub mod import;

pub use export::{flatten_forest, ExportedPackage, FlatScan};
pub use import::{build_forest, FlatGraph};
