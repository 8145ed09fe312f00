//! Dijkstra shortest paths over the network
//!
//! Ties are resolved deterministically: the frontier pops the smallest tentative
//! distance and, among equal distances, the lowest vertex index. A vertex keeps its
//! first predecessor unless a strictly shorter distance is found.

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::aggregate::network_graph::NetworkUnGraph;

/// Heap entry ordered so that `BinaryHeap` pops the nearest, lowest-index vertex first
#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f64,
    node: NodeIndex,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Result of a single-source search
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    root: NodeIndex,
    distances: HashMap<NodeIndex, f64>,
    predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
    settled: Vec<NodeIndex>,
    done: HashSet<NodeIndex>,
}

impl ShortestPathTree {
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Final distance of a settled vertex
    pub fn distance_to(&self, node: NodeIndex) -> Option<f64> {
        if self.is_settled(node) {
            self.distances.get(&node).copied()
        } else {
            None
        }
    }

    fn is_settled(&self, node: NodeIndex) -> bool {
        self.done.contains(&node)
    }

    /// Settled destinations other than the root, in settle order
    pub fn destinations(&self) -> impl Iterator<Item = (NodeIndex, f64)> + '_ {
        self.settled
            .iter()
            .filter(move |&&n| n != self.root)
            .filter_map(move |&n| self.distances.get(&n).map(|&d| (n, d)))
    }

    /// Destinations ordered longest first, lower vertex index first on equal length
    pub fn ranked_destinations(&self) -> Vec<(NodeIndex, f64)> {
        let mut ranked: Vec<_> = self.destinations().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Vertices from the root to `target`, both included
    pub fn node_path(&self, target: NodeIndex) -> Option<Vec<NodeIndex>> {
        if !self.is_settled(target) {
            return None;
        }
        let mut nodes = vec![target];
        let mut current = target;
        while current != self.root {
            let &(previous, _) = self.predecessors.get(&current)?;
            nodes.push(previous);
            current = previous;
        }
        nodes.reverse();
        Some(nodes)
    }

    /// Edges from the root to `target`, in walk order
    pub fn edge_path(&self, target: NodeIndex) -> Option<Vec<EdgeIndex>> {
        if !self.is_settled(target) {
            return None;
        }
        let mut edges = Vec::new();
        let mut current = target;
        while current != self.root {
            let &(previous, edge) = self.predecessors.get(&current)?;
            edges.push(edge);
            current = previous;
        }
        edges.reverse();
        Some(edges)
    }
}

/// Single-source Dijkstra from `root`.
///
/// With a `target` the search stops once the target is settled; without one it settles
/// every vertex of the root's component. Vertices outside that component are absent.
pub fn shortest_path_tree(
    graph: &NetworkUnGraph,
    root: NodeIndex,
    target: Option<NodeIndex>,
) -> ShortestPathTree {
    let mut distances = HashMap::new();
    let mut predecessors = HashMap::new();
    let mut settled = Vec::new();
    let mut done = HashSet::new();
    let mut heap = BinaryHeap::new();

    if graph.contains_node(root) {
        distances.insert(root, 0.0);
        heap.push(Frontier {
            distance: 0.0,
            node: root,
        });
    }

    while let Some(Frontier { distance, node }) = heap.pop() {
        if !done.insert(node) {
            continue;
        }
        settled.push(node);
        if Some(node) == target {
            break;
        }

        for edge in graph.edges(node) {
            let next = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if done.contains(&next) {
                continue;
            }
            let candidate = distance + *edge.weight();
            let improves = match distances.get(&next) {
                Some(&known) => candidate < known,
                None => true,
            };
            if improves {
                distances.insert(next, candidate);
                predecessors.insert(next, (node, edge.id()));
                heap.push(Frontier {
                    distance: candidate,
                    node: next,
                });
            }
        }
    }

    ShortestPathTree {
        root,
        distances,
        predecessors,
        settled,
        done,
    }
}

/// Vertices of a shortest `root` → `target` walk, or `None` when unreachable
pub fn shortest_path(
    graph: &NetworkUnGraph,
    root: NodeIndex,
    target: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    shortest_path_tree(graph, root, Some(target)).node_path(target)
}
