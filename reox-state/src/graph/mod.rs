//! Dependency Graph
//!
//! This module tracks which computed values and effects depend on which
//! state cells.
//!
//! # Overview
//!
//! Dependencies are declared up front as a list of state handles, so the
//! graph is bipartite and shallow:
//!
//! - Sources are state cells.
//! - Dependents are computed values or effects.
//! - An edge from cell `S` to dependent `D` means `D` listed `S`.
//!
//! When a cell changes, the store walks its reverse edges to re-arm
//! dependent computed values. At commit it walks them again to find the
//! effects to run.
//!
//! Both directions are indexed so either question is a single lookup.

mod index;
mod node;

pub use index::DependencyIndex;
pub use node::Dependent;
