//! Connected components and subgraph extraction
//!
//! Two ways to carve up a network:
//! - [`connected_components`] / [`component_subgraphs`] partition the whole graph.
//! - [`flood_fill_from`] grows one region from a vertex while refusing to cross a
//!   given set of edges.
//!
//! Subgraphs are `StableGraph` copies with the other vertices removed, so node and edge
//! indices stay valid against the graph they were taken from.

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{Bfs, EdgeFiltered, EdgeRef, IntoEdgeReferences, NodeIndexable};
use std::borrow::Cow;
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::aggregate::network_graph::NetworkUnGraph;

/// A maximal connected vertex group with the edges among its vertices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Vertices in ascending index order
    pub vertices: Vec<NodeIndex>,
    /// Edges in ascending index order
    pub edges: Vec<EdgeIndex>,
}

impl Component {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_isolated_vertex(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Partition the graph into connected components.
///
/// Components are listed by their lowest vertex index. A vertex without edges forms its
/// own single-vertex component.
pub fn connected_components(graph: &NetworkUnGraph) -> Vec<Component> {
    let mut sets = UnionFind::<usize>::new(graph.node_bound());
    for edge in graph.edge_references() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let mut groups: IndexMap<usize, Component> = IndexMap::new();
    for node in graph.node_indices() {
        groups
            .entry(sets.find(node.index()))
            .or_insert_with(|| Component {
                vertices: Vec::new(),
                edges: Vec::new(),
            })
            .vertices
            .push(node);
    }
    for edge in graph.edge_references() {
        if let Some(component) = groups.get_mut(&sets.find(edge.source().index())) {
            component.edges.push(edge.id());
        }
    }

    groups.into_values().collect()
}

/// One subgraph per connected component.
///
/// A connected graph comes back borrowed, without a copy.
pub fn component_subgraphs(graph: &NetworkUnGraph) -> Vec<Cow<'_, NetworkUnGraph>> {
    let components = connected_components(graph);
    if components.len() == 1 {
        return vec![Cow::Borrowed(graph)];
    }

    components
        .iter()
        .map(|component| Cow::Owned(subgraph_for(&component.vertices, graph)))
        .collect()
}

/// Induced subgraph on `vertices`: every edge with both endpoints in the set.
///
/// A lone vertex yields a single-vertex subgraph without edges.
pub fn subgraph_for(vertices: &[NodeIndex], graph: &NetworkUnGraph) -> NetworkUnGraph {
    let keep: HashSet<NodeIndex> = vertices.iter().copied().collect();
    let mut subgraph = graph.clone();
    subgraph.retain_nodes(|_, node| keep.contains(&node));
    subgraph
}

/// Breadth-first region around `start` that never crosses an `excluded` edge.
///
/// The result holds the reached vertices and the non-excluded edges among them. A start
/// vertex missing from the graph yields an empty graph.
pub fn flood_fill_from(
    graph: &NetworkUnGraph,
    start: NodeIndex,
    excluded: &HashSet<EdgeIndex>,
) -> NetworkUnGraph {
    if !graph.contains_node(start) {
        return NetworkUnGraph::default();
    }

    let filtered = EdgeFiltered::from_fn(graph, |edge| !excluded.contains(&edge.id()));
    let mut reached = HashSet::new();
    let mut bfs = Bfs::new(&filtered, start);
    while let Some(node) = bfs.next(&filtered) {
        reached.insert(node);
    }

    let mut region = graph.clone();
    region.retain_edges(|_, edge| !excluded.contains(&edge));
    region.retain_nodes(|_, node| reached.contains(&node));
    region
}
