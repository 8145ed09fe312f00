//! Graph algorithms over the network storage
//!
//! The decomposer in [`hierarchy`] is built from the other two: one Dijkstra tree per
//! frontier root and one component pass per level.

pub mod components;
pub mod hierarchy;
pub mod shortest_path;

pub use components::{
    component_subgraphs, connected_components, flood_fill_from, subgraph_for, Component,
};
pub use hierarchy::{
    Hierarchy, HierarchyDecomposer, HierarchyRoute, OrphanComponent, SnappedLink,
};
pub use shortest_path::{shortest_path, shortest_path_tree, ShortestPathTree};
