//! Network graph aggregate
//!
//! An undirected weighted graph over deduplicated vertices. Vertex `i` of the petgraph
//! storage is the `i`-th distinct coordinate seen by the builder, so node indices double
//! as insertion order for every deterministic tie-break downstream.

use indexmap::{IndexMap, IndexSet};
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::HashSet;

use crate::aggregate::path::{Path, PathLookup};
use crate::algorithms::components::flood_fill_from;
use crate::algorithms::hierarchy::{Hierarchy, HierarchyDecomposer};
use crate::algorithms::shortest_path::{shortest_path, shortest_path_tree};
use crate::config::OrphanPolicy;
use crate::errors::{DegenerateInput, NetworkResult};
use crate::value_objects::{Coordinate, Edge, PrecisionModel, VertexKey};

/// Petgraph storage shared by the algorithms; weights are Euclidean edge lengths
pub type NetworkUnGraph = StableUnGraph<Coordinate, f64>;

/// Spatial index entry for vertices
#[derive(Debug, Clone)]
struct SpatialVertex {
    node: NodeIndex,
    position: [f64; 2],
}

impl RTreeObject for SpatialVertex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for SpatialVertex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Initialized network: interned vertices, deduplicated edges and a vertex index
#[derive(Debug, Clone)]
pub struct NetworkGraph {
    precision: PrecisionModel,
    vertices: IndexMap<VertexKey, NodeIndex>,
    graph: NetworkUnGraph,
    spatial: RTree<SpatialVertex>,
}

impl NetworkGraph {
    /// Build the graph from interned vertices and `(min, max)` vertex-position pairs
    pub(crate) fn from_parts(
        precision: PrecisionModel,
        vertices: &IndexMap<VertexKey, Coordinate>,
        edges: &IndexSet<(usize, usize)>,
    ) -> Self {
        let mut graph = NetworkUnGraph::with_capacity(vertices.len(), edges.len());
        let mut index = IndexMap::with_capacity(vertices.len());
        let mut spatial = Vec::with_capacity(vertices.len());

        for (key, coordinate) in vertices {
            let node = graph.add_node(*coordinate);
            index.insert(*key, node);
            spatial.push(SpatialVertex {
                node,
                position: [coordinate.x, coordinate.y],
            });
        }

        for &(a, b) in edges {
            let weight = graph[NodeIndex::new(a)].distance_to(&graph[NodeIndex::new(b)]);
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), weight);
        }

        Self {
            precision,
            vertices: index,
            graph,
            spatial: RTree::bulk_load(spatial),
        }
    }

    /// The precision model every vertex was snapped with
    pub fn precision(&self) -> PrecisionModel {
        self.precision
    }

    /// Number of distinct vertices
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = &Coordinate> {
        self.graph.node_indices().map(move |n| &self.graph[n])
    }

    /// Edges in insertion order, oriented as first added
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|e| Edge {
                a: self.graph[e.source()],
                b: self.graph[e.target()],
            })
            .collect()
    }

    /// Underlying petgraph storage
    pub fn graph(&self) -> &NetworkUnGraph {
        &self.graph
    }

    /// An owned copy the decomposer can remove edges from
    pub fn working_copy(&self) -> NetworkUnGraph {
        self.graph.clone()
    }

    /// Coordinate stored at a node
    pub fn coordinate(&self, node: NodeIndex) -> Option<Coordinate> {
        self.graph.node_weight(node).copied()
    }

    /// Whether a coordinate matches a vertex exactly under the precision model
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.vertices.contains_key(&self.precision.key(coordinate))
    }

    /// Resolve a picked coordinate to a vertex.
    ///
    /// An exact key match wins. Otherwise the nearest vertex within `tolerance` is used,
    /// the lower insertion index breaking distance ties.
    pub fn locate(&self, coordinate: &Coordinate, tolerance: f64) -> Option<NodeIndex> {
        if let Some(&node) = self.vertices.get(&self.precision.key(coordinate)) {
            return Some(node);
        }
        self.nearest_within(coordinate, tolerance, |_| true)
            .map(|(node, _)| node)
    }

    /// Nearest vertex accepted by `accept` within `tolerance`, with its distance.
    ///
    /// Distance ties go to the lower insertion index.
    pub(crate) fn nearest_within(
        &self,
        coordinate: &Coordinate,
        tolerance: f64,
        accept: impl Fn(NodeIndex) -> bool,
    ) -> Option<(NodeIndex, f64)> {
        if tolerance <= 0.0 || !coordinate.is_finite() {
            return None;
        }

        let point = [coordinate.x, coordinate.y];
        self.spatial
            .locate_within_distance(point, tolerance * tolerance)
            .filter(|v| accept(v.node))
            .map(|v| (v.distance_2(&point), v.node))
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
            .map(|(distance_2, node)| (node, distance_2.sqrt()))
    }

    fn edge_indices_of(&self, edges: &[Edge]) -> HashSet<petgraph::stable_graph::EdgeIndex> {
        edges
            .iter()
            .filter_map(|edge| {
                let a = self.vertices.get(&self.precision.key(&edge.a))?;
                let b = self.vertices.get(&self.precision.key(&edge.b))?;
                self.graph.find_edge(*a, *b)
            })
            .collect()
    }

    /// Shortest route between two picked coordinates
    pub fn shortest_path(
        &self,
        root: &Coordinate,
        target: &Coordinate,
        tolerance: f64,
    ) -> NetworkResult<PathLookup> {
        if self.precision.key(root) == self.precision.key(target) {
            return Err(DegenerateInput::RootEqualsTarget {
                coordinate: self.precision.snap(root),
            }
            .into());
        }

        let Some(from) = self.locate(root, tolerance) else {
            return Ok(PathLookup::NotFound { coordinate: *root });
        };
        let Some(to) = self.locate(target, tolerance) else {
            return Ok(PathLookup::NotFound {
                coordinate: *target,
            });
        };
        if from == to {
            return Err(DegenerateInput::RootEqualsTarget {
                coordinate: self.graph[from],
            }
            .into());
        }

        Ok(match shortest_path(&self.graph, from, to) {
            Some(nodes) => PathLookup::Found(Path::from_nodes(&self.graph, &nodes)),
            None => PathLookup::Unreachable,
        })
    }

    /// Every destination reachable from `root`, longest first.
    ///
    /// Equal lengths keep vertex insertion order. A root that matches no vertex yields
    /// an empty list.
    pub fn all_paths_from(&self, root: &Coordinate, tolerance: f64) -> Vec<Path> {
        let Some(from) = self.locate(root, tolerance) else {
            return Vec::new();
        };

        let tree = shortest_path_tree(&self.graph, from, None);
        tree.ranked_destinations()
            .into_iter()
            .filter_map(|(node, _)| tree.node_path(node))
            .map(|nodes| Path::from_nodes(&self.graph, &nodes))
            .collect()
    }

    /// Region reachable from `start` without crossing any of `excluded`
    pub fn reachable_from(
        &self,
        start: &Coordinate,
        excluded: &[Edge],
        tolerance: f64,
    ) -> Option<NetworkUnGraph> {
        let node = self.locate(start, tolerance)?;
        Some(flood_fill_from(&self.graph, node, &self.edge_indices_of(excluded)))
    }

    /// Main/branch hierarchy rooted at `root`, or `None` if it matches no vertex
    pub fn decompose(
        &self,
        root: &Coordinate,
        tolerance: f64,
        policy: OrphanPolicy,
    ) -> NetworkResult<Option<Hierarchy>> {
        match self.locate(root, tolerance) {
            Some(node) => HierarchyDecomposer::new(self, policy)
                .with_snap_tolerance(tolerance)
                .decompose(node)
                .map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> NetworkGraph {
        let precision = PrecisionModel::Floating;
        let coords = [
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 1.0),
        ];
        let vertices: IndexMap<VertexKey, Coordinate> =
            coords.iter().map(|c| (precision.key(c), *c)).collect();
        let edges: IndexSet<(usize, usize)> =
            [(0, 1), (1, 2), (2, 3), (0, 3)].into_iter().collect();
        NetworkGraph::from_parts(precision, &vertices, &edges)
    }

    #[test]
    fn test_from_parts_keeps_insertion_order() {
        let network = square();

        assert_eq!(network.vertex_count(), 4);
        assert_eq!(network.edge_count(), 4);
        assert_eq!(network.coordinate(NodeIndex::new(2)), Some(Coordinate::new(1.0, 1.0)));
        assert_eq!(network.vertices().next(), Some(&Coordinate::new(0.0, 0.0)));
        assert_eq!(
            network.edges()[3],
            Edge::new(Coordinate::new(0.0, 1.0), Coordinate::new(0.0, 0.0)).unwrap()
        );
    }

    #[test]
    fn test_locate_exact_and_within_tolerance() {
        let network = square();

        assert_eq!(network.locate(&Coordinate::new(1.0, 0.0), 0.0), Some(NodeIndex::new(1)));
        assert_eq!(network.locate(&Coordinate::new(1.05, 0.0), 0.0), None);
        assert_eq!(network.locate(&Coordinate::new(1.05, 0.0), 0.1), Some(NodeIndex::new(1)));
        assert_eq!(network.locate(&Coordinate::new(0.5, 0.5), 0.1), None);
    }

    #[test]
    fn test_locate_tie_prefers_first_vertex() {
        let network = square();
        let centre = Coordinate::new(0.5, 0.0);

        assert_eq!(network.locate(&centre, 1.0), Some(NodeIndex::new(0)));
    }

    #[test]
    fn test_all_paths_from_ranked_longest_first() {
        let network = square();
        let paths = network.all_paths_from(&Coordinate::new(0.0, 0.0), 0.0);

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[0].length(), 2.0);
        assert_eq!(paths[0].target(), Some(&Coordinate::new(1.0, 1.0)));
        assert_eq!(paths[1].target(), Some(&Coordinate::new(1.0, 0.0)));
        assert_eq!(paths[2].target(), Some(&Coordinate::new(0.0, 1.0)));
    }

    #[test]
    fn test_reachable_from_with_exclusions() {
        let network = square();
        let cut = [
            Edge::new(Coordinate::new(1.0, 0.0), Coordinate::new(1.0, 1.0)).unwrap(),
            Edge::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0)).unwrap(),
        ];

        let region = network
            .reachable_from(&Coordinate::new(0.0, 0.0), &cut, 0.0)
            .unwrap();
        assert_eq!(region.node_count(), 2);
        assert_eq!(region.edge_count(), 1);
        assert!(network.reachable_from(&Coordinate::new(9.0, 9.0), &cut, 0.0).is_none());
    }
}
