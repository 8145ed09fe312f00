//! Graph builder
//!
//! Collects polylines, interns their snapped endpoints and turns every consecutive
//! coordinate pair into an undirected edge. `initialize` freezes the collected vertices
//! and edges into a [`NetworkGraph`]; queries run against that frozen graph.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use tracing::{debug, info, trace};

use crate::aggregate::network_graph::{NetworkGraph, NetworkUnGraph};
use crate::aggregate::path::{chain_edges, Path, PathLookup};
use crate::algorithms::hierarchy::Hierarchy;
use crate::config::AnalysisConfig;
use crate::errors::{ChainingFailureReason, DegenerateInput, NetworkError, NetworkResult};
use crate::value_objects::{Coordinate, Edge, VertexKey};

/// Accumulates polylines into a network
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: AnalysisConfig,
    /// Interned vertices; the position of a key is its vertex index
    vertices: IndexMap<VertexKey, Coordinate>,
    /// Edges as `(lower, higher)` vertex positions
    edges: IndexSet<(usize, usize)>,
    /// Snapped key sequences of every accepted polyline
    lines: HashSet<Vec<VertexKey>>,
    network: Option<NetworkGraph>,
}

impl GraphBuilder {
    /// Create a builder with a validated configuration
    pub fn new(config: AnalysisConfig) -> NetworkResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Add polylines to the network.
    ///
    /// The whole batch is validated before anything is added. Returns `false` when at
    /// least one polyline repeats an earlier one vertex for vertex; repeats add nothing.
    /// Consecutive coordinates that snap to the same vertex are skipped.
    pub fn add<I, P>(&mut self, polylines: I) -> NetworkResult<bool>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[Coordinate]>,
    {
        let polylines: Vec<P> = polylines.into_iter().collect();
        for (index, line) in polylines.iter().enumerate() {
            let line = line.as_ref();
            if line.len() < 2 {
                return Err(DegenerateInput::ShortPolyline {
                    index,
                    len: line.len(),
                }
                .into());
            }
            if !line.iter().all(Coordinate::is_finite) {
                return Err(DegenerateInput::NonFiniteCoordinate { index }.into());
            }
        }

        let precision = self.config.precision;
        let vertices_before = self.vertices.len();
        let edges_before = self.edges.len();
        let mut all_new = true;

        for (index, line) in polylines.iter().enumerate() {
            let snapped: Vec<Coordinate> =
                line.as_ref().iter().map(|c| precision.snap(c)).collect();
            let keys: Vec<VertexKey> = snapped.iter().map(|c| precision.key(c)).collect();
            if self.lines.contains(&keys) {
                all_new = false;
                trace!(polyline = index, "Skipping repeated polyline");
                continue;
            }

            for (pair, key_pair) in snapped.windows(2).zip(keys.windows(2)) {
                if key_pair[0] == key_pair[1] {
                    trace!(polyline = index, at = %pair[0], "Skipping zero-length segment");
                    continue;
                }
                let a = self.intern(key_pair[0], pair[0]);
                let b = self.intern(key_pair[1], pair[1]);
                self.edges.insert((a.min(b), a.max(b)));
            }
            self.lines.insert(keys);
        }

        let added_vertices = self.vertices.len() - vertices_before;
        let added_edges = self.edges.len() - edges_before;
        if added_edges > 0 {
            self.network = None;
        }
        debug!(
            polylines = polylines.len(),
            added_vertices,
            added_edges,
            "Added polylines to network"
        );

        Ok(all_new)
    }

    fn intern(&mut self, key: VertexKey, coordinate: Coordinate) -> usize {
        self.vertices.insert_full(key, coordinate).0
    }

    /// Freeze the collected polylines into a queryable network.
    ///
    /// Calling again without new input returns the same network.
    pub fn initialize(&mut self) -> NetworkResult<&NetworkGraph> {
        if self.network.is_none() {
            if self.vertices.len() < 2 {
                return Err(DegenerateInput::TooFewVertices {
                    found: self.vertices.len(),
                }
                .into());
            }

            let network =
                NetworkGraph::from_parts(self.config.precision, &self.vertices, &self.edges);
            info!(
                vertices = network.vertex_count(),
                edges = network.edge_count(),
                "Network initialized"
            );
            self.network = Some(network);
        }

        self.network.as_ref().ok_or(NetworkError::NotInitialized)
    }

    /// The initialized network
    pub fn network(&self) -> NetworkResult<&NetworkGraph> {
        self.network.as_ref().ok_or(NetworkError::NotInitialized)
    }

    /// Shortest path between two picked coordinates
    pub fn perform(&self, root: &Coordinate, target: &Coordinate) -> NetworkResult<PathLookup> {
        self.network()?
            .shortest_path(root, target, self.config.snap_tolerance)
    }

    /// Link an unordered edge list into one coordinate sequence.
    ///
    /// Endpoints are snapped first so edges taken from different sources still meet. An
    /// edge whose endpoints snap together is a chaining failure.
    pub fn build_string(&self, edges: &[Edge]) -> NetworkResult<Vec<Coordinate>> {
        let precision = self.config.precision;
        let snapped = edges
            .iter()
            .map(|edge| {
                let (a, b) = (precision.snap(&edge.a), precision.snap(&edge.b));
                Edge::new(a, b).ok_or_else(|| {
                    NetworkError::chaining(ChainingFailureReason::Collapsed { at: a })
                })
            })
            .collect::<NetworkResult<Vec<Edge>>>()?;
        chain_edges(&snapped)
    }

    /// Every destination reachable from `root`, longest first
    pub fn all_paths_from(&self, root: &Coordinate) -> NetworkResult<Vec<Path>> {
        Ok(self
            .network()?
            .all_paths_from(root, self.config.snap_tolerance))
    }

    /// Region around `start` that does not cross `excluded`
    pub fn reachable_from(
        &self,
        start: &Coordinate,
        excluded: &[Edge],
    ) -> NetworkResult<Option<NetworkUnGraph>> {
        Ok(self
            .network()?
            .reachable_from(start, excluded, self.config.snap_tolerance))
    }

    /// Main/branch hierarchy rooted at `root`
    pub fn decompose(&self, root: &Coordinate) -> NetworkResult<Option<Hierarchy>> {
        self.network()?.decompose(
            root,
            self.config.snap_tolerance,
            self.config.orphan_policy,
        )
    }
}
