//! **A canonical dependency graph model with SBOM interchange.**
//!
//! `sbom-graph` collects software dependency information from many ecosystems
//! into one canonical graph model and converts it losslessly between several
//! Software Bill-of-Materials encodings (SPDX, CycloneDX, an internal JSON
//! document) and the indented dependency-tree dumps produced by build tools
//! (Maven, Gradle).
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: the canonical entities. A [`model::DependencyScan`] owns
//!   a forest of [`model::Dependency`] trees; children are owned value
//!   copies, never shared references, so a diamond dependency appears as one
//!   fully-expanded occurrence plus leaf stubs.
//! - **[`graph`]**: the conversion engine. [`graph::build_forest`]
//!   reconstructs trees from the flat component-list + relationship-list
//!   shape SBOM formats use; [`graph::flatten_forest`] is the inverse,
//!   producing a deduplicated package list plus edges.
//! - **[`parsers`]**: format adapters (SPDX tag-value/JSON/YAML/XML,
//!   CycloneDX JSON/XML, internal JSON) and the indentation-based
//!   [`parsers::IndentTreeParser`] for build-tool dumps, plus content-based
//!   format detection.
//!
//! ## Parsing an SBOM
//!
//! ```no_run
//! use std::path::Path;
//! use sbom_graph::parsers::load_scans;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scans = load_scans(Path::new("bom.cdx.json"), None)?;
//!     for scan in &scans {
//!         println!("{}: {} distinct components", scan.module, scan.iter_deps_once().count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Converting between formats
//!
//! ```no_run
//! use std::path::Path;
//! use sbom_graph::parsers::{dump_scans, load_scans, ScanFormat};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scans = load_scans(Path::new("bom.spdx.json"), None)?;
//!     let cdx = dump_scans(&scans, ScanFormat::CycloneDxJson)?;
//!     std::fs::write("bom.cdx.json", cdx)?;
//!     Ok(())
//! }
//! ```
//!
//! The conversion algorithms are single-threaded and side-effect-free: each
//! call owns its inputs and outputs, traversals use explicit work stacks so
//! adversarially deep trees cannot overflow the call stack, and cyclic
//! relationship data terminates by construction (see [`graph`]).

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]

pub mod cli;
pub mod error;
pub mod graph;
pub mod model;
pub mod parsers;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use graph::{build_forest, flatten_forest, ExportedPackage, FlatGraph, FlatScan};
pub use model::{CryptoAlgorithm, Dependency, DependencyScan, License, LicenseKind, VersionedKey};
pub use parsers::{
    dump_scans, load_scans, load_scans_str, FormatDetector, IndentTreeParser, ScanFormat,
};
