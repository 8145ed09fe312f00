//! Network errors
//!
//! Vertex lookups that miss and targets in another component are normal query outcomes
//! (see [`PathLookup`](crate::aggregate::PathLookup)); only conditions the caller must
//! correct before retrying are represented here.

use crate::value_objects::{Coordinate, HierarchyLevel};

/// Result type for network operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors that can occur while building or querying a network
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    #[error("Degenerate input: {0}")]
    DegenerateInput(#[from] DegenerateInput),

    #[error("Edges do not form a single simple path: {reason}")]
    ChainingFailure { reason: ChainingFailureReason },

    #[error("Orphan component at level {level}: {vertex_count} vertices, {edge_count} edges")]
    OrphanComponent {
        level: HierarchyLevel,
        vertex_count: usize,
        edge_count: usize,
    },

    #[error("Vertex {index} is not part of the network")]
    UnknownVertex { index: usize },

    #[error("Graph has not been initialized")]
    NotInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Input that is rejected before any traversal
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DegenerateInput {
    #[error("network needs at least 2 distinct vertices, found {found}")]
    TooFewVertices { found: usize },

    #[error("root and target are the same vertex {coordinate}")]
    RootEqualsTarget { coordinate: Coordinate },

    #[error("polyline {index} has {len} coordinates, at least 2 are required")]
    ShortPolyline { index: usize, len: usize },

    #[error("polyline {index} contains a non-finite coordinate")]
    NonFiniteCoordinate { index: usize },
}

/// Why an edge set could not be linked into one polyline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainingFailureReason {
    #[error("no edges")]
    Empty,

    #[error("branch at {at}")]
    Branching { at: Coordinate },

    #[error("edge at {at} has zero length after snapping")]
    Collapsed { at: Coordinate },

    #[error("edges form a closed cycle")]
    Cycle,

    #[error("only {linked} of {total} edges are linked")]
    Disconnected { linked: usize, total: usize },
}

impl NetworkError {
    pub(crate) fn chaining(reason: ChainingFailureReason) -> Self {
        NetworkError::ChainingFailure { reason }
    }
}
