//! Linear spatial network analysis
//!
//! Builds an undirected weighted graph from polylines whose endpoints are deduplicated
//! under a precision model, answers shortest-path queries over it, and decomposes it
//! from a root into a main route and nested levels of branch routes.

pub mod aggregate;
pub mod algorithms;
pub mod config;
pub mod errors;
pub mod projections;
pub mod value_objects;

// Re-export main types
pub use aggregate::*;

pub use algorithms::{
    Component, Hierarchy, HierarchyDecomposer, HierarchyRoute, OrphanComponent,
    ShortestPathTree, SnappedLink,
};

pub use config::{AnalysisConfig, OrphanPolicy};

pub use errors::{ChainingFailureReason, DegenerateInput, NetworkError, NetworkResult};

// Re-export value objects
pub use value_objects::{Coordinate, Edge, HierarchyLevel, PrecisionModel, VertexKey};

// Re-export projections
pub use projections::{
    EdgeAssignment, EdgeLevelProjection, HierarchyProjection, HierarchySummary, LevelSummary,
};
