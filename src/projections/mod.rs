//! Hierarchy projections
//!
//! Read models derived from a finished decomposition.

pub mod edge_levels;
pub mod hierarchy_summary;

pub use edge_levels::*;
pub use hierarchy_summary::*;

use crate::algorithms::hierarchy::Hierarchy;

/// Trait for read models built from a decomposition
pub trait HierarchyProjection {
    /// Rebuild the projection from a decomposition result
    fn apply(&mut self, hierarchy: &Hierarchy);

    /// Reset to the empty state
    fn clear(&mut self);
}
