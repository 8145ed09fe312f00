//! Paths through the network
//!
//! A `Path` is an ordered walk from a source vertex to a destination vertex. Unordered
//! edge sets are turned back into a walk by [`chain_edges`].

use indexmap::{IndexMap, IndexSet};
use petgraph::stable_graph::NodeIndex;
use serde::{Deserialize, Serialize};

use crate::aggregate::network_graph::NetworkUnGraph;
use crate::errors::{ChainingFailureReason, NetworkError, NetworkResult};
use crate::value_objects::{Coordinate, Edge};

/// An endpoint-ordered walk with its total length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    coordinates: Vec<Coordinate>,
    length: f64,
}

impl Path {
    /// Create a path from an ordered coordinate sequence
    pub fn from_coordinates(coordinates: Vec<Coordinate>) -> Self {
        let length = coordinates
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum();
        Self {
            coordinates,
            length,
        }
    }

    pub(crate) fn from_nodes(graph: &NetworkUnGraph, nodes: &[NodeIndex]) -> Self {
        Self::from_coordinates(nodes.iter().map(|&n| graph[n]).collect())
    }

    /// Ordered coordinates from source to destination
    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    /// Consume the path, keeping its coordinates
    pub fn into_coordinates(self) -> Vec<Coordinate> {
        self.coordinates
    }

    /// Sum of edge weights
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn source(&self) -> Option<&Coordinate> {
        self.coordinates.first()
    }

    pub fn target(&self) -> Option<&Coordinate> {
        self.coordinates.last()
    }

    /// Edges in walk order, each oriented from source side to destination side
    pub fn edges(&self) -> Vec<Edge> {
        self.coordinates
            .windows(2)
            .filter_map(|pair| Edge::new(pair[0], pair[1]))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.coordinates.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }
}

/// Outcome of a point-to-point query
#[derive(Debug, Clone, PartialEq)]
pub enum PathLookup {
    /// A shortest path exists
    Found(Path),
    /// The coordinate matches no vertex within tolerance
    NotFound { coordinate: Coordinate },
    /// Both vertices exist but lie in different components
    Unreachable,
}

impl PathLookup {
    pub fn path(&self) -> Option<&Path> {
        match self {
            PathLookup::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<Path> {
        match self {
            PathLookup::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PathLookup::Found(_))
    }
}

/// Link an unordered edge set into one coordinate sequence.
///
/// Duplicate edges collapse. The walk starts at the first degree-1 endpoint of the first
/// edge when it has one, so an already ordered walk comes back unchanged. Any vertex of
/// degree above 2, a closed cycle, or a set that falls apart into several pieces is a
/// chaining failure; split such sets per branch before calling.
pub fn chain_edges(edges: &[Edge]) -> NetworkResult<Vec<Coordinate>> {
    let edges: IndexSet<Edge> = edges.iter().copied().collect();
    if edges.is_empty() {
        return Err(NetworkError::chaining(ChainingFailureReason::Empty));
    }

    let mut incident: IndexMap<Coordinate, Vec<usize>> = IndexMap::new();
    for (i, edge) in edges.iter().enumerate() {
        incident.entry(edge.a).or_default().push(i);
        incident.entry(edge.b).or_default().push(i);
    }

    if let Some((at, _)) = incident.iter().find(|(_, list)| list.len() > 2) {
        return Err(NetworkError::chaining(ChainingFailureReason::Branching { at: *at }));
    }

    let is_end = |c: &Coordinate| incident.get(c).is_some_and(|list| list.len() == 1);
    let first = edges[0];
    let start = if is_end(&first.a) {
        first.a
    } else if is_end(&first.b) {
        first.b
    } else {
        match incident.iter().find(|(_, list)| list.len() == 1) {
            Some((c, _)) => *c,
            None => return Err(NetworkError::chaining(ChainingFailureReason::Cycle)),
        }
    };

    let mut used = vec![false; edges.len()];
    let mut linked = 0;
    let mut current = start;
    let mut chain = vec![start];
    while let Some(&next_edge) = incident
        .get(&current)
        .and_then(|list| list.iter().find(|&&i| !used[i]))
    {
        used[next_edge] = true;
        linked += 1;
        let Some(next) = edges[next_edge].opposite(&current) else {
            break;
        };
        chain.push(next);
        current = next;
    }

    if linked < edges.len() {
        return Err(NetworkError::chaining(ChainingFailureReason::Disconnected {
            linked,
            total: edges.len(),
        }));
    }
    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coordinate {
        Coordinate::new(x, y)
    }

    fn e(a: (f64, f64), b: (f64, f64)) -> Edge {
        Edge::new(a.into(), b.into()).unwrap()
    }

    #[test]
    fn test_path_length_and_edges() {
        let path = Path::from_coordinates(vec![c(0.0, 0.0), c(3.0, 4.0), c(3.0, 10.0)]);

        assert_eq!(path.length(), 11.0);
        assert_eq!(path.edge_count(), 2);
        assert_eq!(path.edges()[1], e((3.0, 10.0), (3.0, 4.0)));
        assert_eq!(path.source(), Some(&c(0.0, 0.0)));
        assert_eq!(path.target(), Some(&c(3.0, 10.0)));
    }

    #[test]
    fn test_chain_unordered_edges() {
        let edges = [
            e((10.0, 0.0), (20.0, 0.0)),
            e((20.0, 0.0), (20.0, 5.0)),
            e((0.0, 0.0), (10.0, 0.0)),
        ];

        let chain = chain_edges(&edges).unwrap();
        assert_eq!(chain, vec![c(20.0, 5.0), c(20.0, 0.0), c(10.0, 0.0), c(0.0, 0.0)]);
    }

    #[test]
    fn test_chain_ordered_walk_roundtrip() {
        let path = Path::from_coordinates(vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0), c(2.0, 1.0)]);

        assert_eq!(chain_edges(&path.edges()).unwrap(), path.coordinates());
    }

    #[test]
    fn test_chain_single_reversed_edge() {
        let chain = chain_edges(&[e((5.0, 5.0), (0.0, 0.0))]).unwrap();
        assert_eq!(chain, vec![c(5.0, 5.0), c(0.0, 0.0)]);
    }

    #[test]
    fn test_chain_collapses_duplicates() {
        let edges = [e((0.0, 0.0), (1.0, 0.0)), e((1.0, 0.0), (0.0, 0.0))];
        assert_eq!(chain_edges(&edges).unwrap().len(), 2);
    }

    #[test]
    fn test_chain_rejects_branch() {
        let edges = [
            e((0.0, 0.0), (10.0, 0.0)),
            e((10.0, 0.0), (20.0, 0.0)),
            e((10.0, 0.0), (10.0, 10.0)),
        ];

        match chain_edges(&edges) {
            Err(NetworkError::ChainingFailure {
                reason: ChainingFailureReason::Branching { at },
            }) => assert_eq!(at, c(10.0, 0.0)),
            other => panic!("Expected branching failure, got {other:?}"),
        }
    }

    #[test]
    fn test_chain_rejects_cycle() {
        let edges = [
            e((0.0, 0.0), (1.0, 0.0)),
            e((1.0, 0.0), (1.0, 1.0)),
            e((1.0, 1.0), (0.0, 0.0)),
        ];

        assert_eq!(
            chain_edges(&edges),
            Err(NetworkError::chaining(ChainingFailureReason::Cycle))
        );
    }

    #[test]
    fn test_chain_rejects_disjoint_pieces() {
        let edges = [e((0.0, 0.0), (1.0, 0.0)), e((5.0, 5.0), (6.0, 5.0))];

        assert_eq!(
            chain_edges(&edges),
            Err(NetworkError::chaining(ChainingFailureReason::Disconnected {
                linked: 1,
                total: 2
            }))
        );
    }

    #[test]
    fn test_chain_rejects_empty() {
        assert_eq!(
            chain_edges(&[]),
            Err(NetworkError::chaining(ChainingFailureReason::Empty))
        );
    }

    #[test]
    fn test_lookup_accessors() {
        let found = PathLookup::Found(Path::from_coordinates(vec![c(0.0, 0.0), c(1.0, 0.0)]));
        assert!(found.is_found());
        assert_eq!(found.path().map(Path::length), Some(1.0));

        let missing = PathLookup::NotFound {
            coordinate: c(9.0, 9.0),
        };
        assert!(!missing.is_found());
        assert!(missing.into_path().is_none());
        assert!(PathLookup::Unreachable.path().is_none());
    }
}
