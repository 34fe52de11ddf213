//! Canonical dependency graph model.
//!
//! Scanners and format adapters all speak in terms of these structures:
//! a [`DependencyScan`] owns a forest of [`Dependency`] trees, and every
//! recurring component is an independent value copy, never a shared
//! reference. This keeps ownership trivial at the cost of representing a
//! diamond dependency as one fully-expanded occurrence plus leaf stubs;
//! the conversion algorithms in [`crate::graph`] rely on exactly that shape.

mod dependency;
mod license;

pub use dependency::*;
pub use license::*;
