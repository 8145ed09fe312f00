//! Main/branch hierarchy decomposition
//!
//! Starting at a root vertex, the decomposer peels the network apart one level at a time:
//!
//! 1. From every frontier root, rank all shortest paths longest first.
//! 2. Greedily accept paths whose non-root vertices are still unused on this level.
//! 3. Remove the accepted edges from the working graph.
//! 4. Each remaining component touching the level just accepted becomes a frontier root
//!    of the next level; components touching nothing are orphans, handled per
//!    [`OrphanPolicy`].
//!
//! The loop ends when the working graph has no edges or no component can be attached.
//! Every accepted level removes at least the longest path of each frontier root, so the
//! working graph shrinks on every step.

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

use crate::aggregate::network_graph::{NetworkGraph, NetworkUnGraph};
use crate::aggregate::path::Path;
use crate::algorithms::components::{connected_components, Component};
use crate::algorithms::shortest_path::shortest_path_tree;
use crate::config::OrphanPolicy;
use crate::errors::{NetworkError, NetworkResult};
use crate::value_objects::{Coordinate, Edge, HierarchyLevel};

/// One accepted path and the level it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRoute {
    pub level: HierarchyLevel,
    /// Frontier root the path starts from; for branch levels, the connecting vertex
    pub root: Coordinate,
    pub path: Path,
}

/// A remaining component that could not be attached to the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrphanComponent {
    /// Level the component would have been assigned to
    pub level: HierarchyLevel,
    pub vertices: Vec<Coordinate>,
    pub edges: Vec<Edge>,
}

/// An orphan joined to the hierarchy through a nearby vertex instead of a shared one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnappedLink {
    /// Level the component was attached at
    pub level: HierarchyLevel,
    /// Component vertex that roots the attached routes
    pub vertex: Coordinate,
    /// Assigned vertex it was snapped to
    pub anchor: Coordinate,
    pub distance: f64,
}

/// Ordered decomposition result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub root: Coordinate,
    /// Routes in acceptance order; levels never decrease along the list
    pub routes: Vec<HierarchyRoute>,
    pub orphans: Vec<OrphanComponent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snapped: Vec<SnappedLink>,
}

impl Hierarchy {
    /// Number of levels holding at least one route
    pub fn level_count(&self) -> usize {
        self.routes
            .last()
            .map_or(0, |route| route.level.value() as usize + 1)
    }

    pub fn routes_at(&self, level: HierarchyLevel) -> impl Iterator<Item = &HierarchyRoute> {
        self.routes.iter().filter(move |route| route.level == level)
    }

    /// Edges of every route on `level`
    pub fn edges_at(&self, level: HierarchyLevel) -> Vec<Edge> {
        self.routes_at(level)
            .flat_map(|route| route.path.edges())
            .collect()
    }

    /// `(edge set, level)` pairs, one per level in increasing order
    pub fn level_edge_sets(&self) -> Vec<(Vec<Edge>, HierarchyLevel)> {
        (0..self.level_count() as u32)
            .map(HierarchyLevel)
            .map(|level| (self.edges_at(level), level))
            .collect()
    }

    /// Distinct connecting vertices of the branch levels
    pub fn connecting_vertices(&self) -> Vec<(HierarchyLevel, Coordinate)> {
        let mut seen = HashSet::new();
        self.routes
            .iter()
            .filter(|route| !route.level.is_main())
            .filter(|route| seen.insert((route.level, route.root)))
            .map(|route| (route.level, route.root))
            .collect()
    }

    /// Total number of edges assigned to a level
    pub fn edge_count(&self) -> usize {
        self.routes.iter().map(|route| route.path.edge_count()).sum()
    }

    pub fn total_length(&self) -> f64 {
        self.routes.iter().map(|route| route.path.length()).sum()
    }

    pub fn has_orphans(&self) -> bool {
        !self.orphans.is_empty()
    }
}

/// Decomposer state between levels
enum State {
    Leveling {
        level: HierarchyLevel,
        frontier: Vec<NodeIndex>,
    },
    Done,
}

/// Mutable bookkeeping of one decomposition run
struct Work {
    active: NetworkUnGraph,
    assigned: HashSet<NodeIndex>,
    routes: Vec<HierarchyRoute>,
    orphans: Vec<OrphanComponent>,
    snapped: Vec<SnappedLink>,
}

/// Splits a network into a main route and nested branch routes
pub struct HierarchyDecomposer<'a> {
    network: &'a NetworkGraph,
    policy: OrphanPolicy,
    snap_tolerance: f64,
}

impl<'a> HierarchyDecomposer<'a> {
    pub fn new(network: &'a NetworkGraph, policy: OrphanPolicy) -> Self {
        Self {
            network,
            policy,
            snap_tolerance: 0.0,
        }
    }

    /// Search radius for [`OrphanPolicy::SnapToNearest`]
    pub fn with_snap_tolerance(mut self, snap_tolerance: f64) -> Self {
        self.snap_tolerance = snap_tolerance;
        self
    }

    /// Decompose the network from `root`
    pub fn decompose(&self, root: NodeIndex) -> NetworkResult<Hierarchy> {
        let root_coordinate = self
            .network
            .coordinate(root)
            .ok_or(NetworkError::UnknownVertex {
                index: root.index(),
            })?;

        let mut work = Work {
            active: self.network.working_copy(),
            assigned: HashSet::new(),
            routes: Vec::new(),
            orphans: Vec::new(),
            snapped: Vec::new(),
        };

        let mut state = State::Leveling {
            level: HierarchyLevel::MAIN,
            frontier: vec![root],
        };
        while let State::Leveling { level, frontier } = state {
            state = self.step(&mut work, level, frontier)?;
        }

        info!(
            root = %root_coordinate,
            levels = work.routes.last().map_or(0, |r| r.level.value() + 1),
            routes = work.routes.len(),
            orphans = work.orphans.len(),
            "Hierarchy decomposition complete"
        );

        Ok(Hierarchy {
            root: root_coordinate,
            routes: work.routes,
            orphans: work.orphans,
            snapped: work.snapped,
        })
    }

    fn step(
        &self,
        work: &mut Work,
        level: HierarchyLevel,
        frontier: Vec<NodeIndex>,
    ) -> NetworkResult<State> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut accepted: Vec<EdgeIndex> = Vec::new();
        let mut level_vertices: HashSet<NodeIndex> = HashSet::new();
        let routes_before = work.routes.len();

        for &root in &frontier {
            let tree = shortest_path_tree(&work.active, root, None);
            for (destination, _) in tree.ranked_destinations() {
                let (Some(nodes), Some(edges)) =
                    (tree.node_path(destination), tree.edge_path(destination))
                else {
                    continue;
                };
                if nodes[1..].iter().any(|node| visited.contains(node)) {
                    continue;
                }

                visited.extend(nodes[1..].iter().copied());
                level_vertices.extend(nodes.iter().copied());
                accepted.extend(edges);
                work.routes.push(HierarchyRoute {
                    level,
                    root: work.active[root],
                    path: Path::from_nodes(&work.active, &nodes),
                });
            }
        }

        if accepted.is_empty() {
            return Ok(State::Done);
        }
        for edge in &accepted {
            work.active.remove_edge(*edge);
        }
        work.assigned.extend(level_vertices.iter().copied());

        debug!(
            %level,
            roots = frontier.len(),
            routes = work.routes.len() - routes_before,
            edges = accepted.len(),
            remaining = work.active.edge_count(),
            "Hierarchy level accepted"
        );

        if work.active.edge_count() == 0 {
            return Ok(State::Done);
        }

        let mut components: Vec<Component> = connected_components(&work.active)
            .into_iter()
            .filter(|component| !component.is_isolated_vertex())
            .collect();
        components.sort_by(|a, b| b.edge_count().cmp(&a.edge_count()));

        let next = level.next();
        let mut next_frontier = Vec::new();
        for component in components {
            let connecting = component
                .vertices
                .iter()
                .find(|v| level_vertices.contains(*v))
                .copied();
            match connecting {
                Some(vertex) => next_frontier.push(vertex),
                None => match self.snap(work, next, &component) {
                    Some(vertex) => next_frontier.push(vertex),
                    None => self.orphan(work, next, &component)?,
                },
            }
        }

        if next_frontier.is_empty() {
            return Ok(State::Done);
        }
        Ok(State::Leveling {
            level: next,
            frontier: next_frontier,
        })
    }

    /// Under `SnapToNearest`, the component vertex closest to any assigned vertex
    fn snap(
        &self,
        work: &mut Work,
        level: HierarchyLevel,
        component: &Component,
    ) -> Option<NodeIndex> {
        if self.policy != OrphanPolicy::SnapToNearest {
            return None;
        }

        let (vertex, anchor, distance) = component
            .vertices
            .iter()
            .filter_map(|&vertex| {
                let coordinate = work.active[vertex];
                self.network
                    .nearest_within(&coordinate, self.snap_tolerance, |n| {
                        work.assigned.contains(&n)
                    })
                    .map(|(anchor, distance)| (vertex, anchor, distance))
            })
            .min_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0)))?;

        let link = SnappedLink {
            level,
            vertex: work.active[vertex],
            anchor: work.active[anchor],
            distance,
        };
        debug!(
            %level,
            vertex = %link.vertex,
            anchor = %link.anchor,
            distance,
            "Snapped component to nearby vertex"
        );
        work.snapped.push(link);
        Some(vertex)
    }

    fn orphan(
        &self,
        work: &mut Work,
        level: HierarchyLevel,
        component: &Component,
    ) -> NetworkResult<()> {
        if self.policy == OrphanPolicy::Fail {
            return Err(NetworkError::OrphanComponent {
                level,
                vertex_count: component.vertex_count(),
                edge_count: component.edge_count(),
            });
        }

        let orphan = OrphanComponent {
            level,
            vertices: component
                .vertices
                .iter()
                .map(|&v| work.active[v])
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            edges: component
                .edges
                .iter()
                .filter_map(|&e| work.active.edge_endpoints(e))
                .filter_map(|(a, b)| Edge::new(work.active[a], work.active[b]))
                .collect(),
        };

        if self.policy == OrphanPolicy::Warn {
            warn!(
                %level,
                vertices = orphan.vertices.len(),
                edges = orphan.edges.len(),
                "Dropping component with no connecting vertex"
            );
        } else {
            debug!(
                %level,
                vertices = orphan.vertices.len(),
                edges = orphan.edges.len(),
                "Dropping component with no connecting vertex"
            );
        }

        for &edge in &component.edges {
            work.active.remove_edge(edge);
        }
        work.orphans.push(orphan);
        Ok(())
    }
}
