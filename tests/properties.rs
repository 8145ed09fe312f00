//! Property tests over small jittered grid networks

use cim_pipe_network::{
    AnalysisConfig, Coordinate, Edge, GraphBuilder, HierarchyLevel, OrphanPolicy, PathLookup,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

const SIDE: usize = 3;

/// Every horizontal, vertical and rising-diagonal neighbour pair of the grid
fn candidate_pairs() -> Vec<(usize, usize)> {
    let id = |i: usize, j: usize| j * SIDE + i;
    let mut pairs = Vec::new();
    for j in 0..SIDE {
        for i in 0..SIDE {
            if i + 1 < SIDE {
                pairs.push((id(i, j), id(i + 1, j)));
            }
            if j + 1 < SIDE {
                pairs.push((id(i, j), id(i, j + 1)));
            }
            if i + 1 < SIDE && j + 1 < SIDE {
                pairs.push((id(i, j), id(i + 1, j + 1)));
            }
        }
    }
    pairs
}

#[derive(Clone, Debug)]
struct GridNetwork {
    points: Vec<Coordinate>,
    segments: Vec<(usize, usize)>,
}

impl GridNetwork {
    fn polylines(&self) -> Vec<Vec<Coordinate>> {
        self.segments
            .iter()
            .map(|&(a, b)| vec![self.points[a], self.points[b]])
            .collect()
    }

    fn builder(&self) -> GraphBuilder {
        self.builder_with(AnalysisConfig::default())
    }

    fn builder_with(&self, config: AnalysisConfig) -> GraphBuilder {
        let mut builder = GraphBuilder::new(config).unwrap();
        builder.add(self.polylines()).unwrap();
        builder.initialize().unwrap();
        builder
    }
}

fn grid_network() -> impl Strategy<Value = GridNetwork> {
    let pairs = candidate_pairs();
    let count = pairs.len();
    (
        prop::collection::vec((0.0..3.0f64, 0.0..3.0f64), SIDE * SIDE),
        prop::collection::vec(any::<bool>(), count),
    )
        .prop_filter_map("needs at least one segment", move |(jitter, mask)| {
            let points = jitter
                .iter()
                .enumerate()
                .map(|(k, (dx, dy))| {
                    Coordinate::new((k % SIDE) as f64 * 10.0 + dx, (k / SIDE) as f64 * 10.0 + dy)
                })
                .collect();
            let segments: Vec<(usize, usize)> = pairs
                .iter()
                .zip(mask)
                .filter(|(_, keep)| *keep)
                .map(|(pair, _)| *pair)
                .collect();
            (!segments.is_empty()).then_some(GridNetwork { points, segments })
        })
}

/// All-pairs distances by Floyd-Warshall over the segment list
fn all_pairs(network: &GridNetwork) -> Vec<Vec<f64>> {
    let n = network.points.len();
    let mut dist = vec![vec![f64::INFINITY; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for &(a, b) in &network.segments {
        let w = network.points[a].distance_to(&network.points[b]);
        dist[a][b] = dist[a][b].min(w);
        dist[b][a] = dist[b][a].min(w);
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                let via = dist[i][k] + dist[k][j];
                if via < dist[i][j] {
                    dist[i][j] = via;
                }
            }
        }
    }
    dist
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn shortest_path_matches_exhaustive_distances(network in grid_network()) {
        let builder = network.builder();
        let dist = all_pairs(&network);
        let used: HashSet<usize> = network.segments.iter().flat_map(|&(a, b)| [a, b]).collect();
        let root = network.segments[0].0;

        for target in used.iter().copied().filter(|&t| t != root) {
            let lookup = builder
                .perform(&network.points[root], &network.points[target])
                .unwrap();
            match lookup {
                PathLookup::Found(path) => {
                    prop_assert!((path.length() - dist[root][target]).abs() < 1e-9);
                    prop_assert_eq!(path.source(), Some(&network.points[root]));
                    prop_assert_eq!(path.target(), Some(&network.points[target]));
                }
                PathLookup::Unreachable => prop_assert!(dist[root][target].is_infinite()),
                PathLookup::NotFound { coordinate } => {
                    prop_assert!(false, "vertex {} missing", coordinate);
                }
            }
        }
    }

    #[test]
    fn found_paths_rechain_unchanged(network in grid_network()) {
        let builder = network.builder();
        let root = network.points[network.segments[0].0];

        for path in builder.all_paths_from(&root).unwrap() {
            let chained = builder.build_string(&path.edges()).unwrap();
            prop_assert_eq!(chained.as_slice(), path.coordinates());
        }
    }

    #[test]
    fn decomposition_is_deterministic(network in grid_network()) {
        let root = network.points[network.segments[0].0];

        let first = network.builder().decompose(&root).unwrap();
        let second = network.builder().decompose(&root).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_edge_lands_in_exactly_one_place(network in grid_network()) {
        let builder = network.builder();
        let root = network.points[network.segments[0].0];
        let hierarchy = builder.decompose(&root).unwrap().unwrap();

        let mut seen: HashMap<Edge, usize> = HashMap::new();
        for (edges, _) in hierarchy.level_edge_sets() {
            for edge in edges {
                *seen.entry(edge).or_default() += 1;
            }
        }
        for orphan in &hierarchy.orphans {
            for &edge in &orphan.edges {
                *seen.entry(edge).or_default() += 1;
            }
        }

        let all: HashSet<Edge> = builder.network().unwrap().edges().into_iter().collect();
        prop_assert_eq!(seen.keys().copied().collect::<HashSet<_>>(), all);
        prop_assert!(seen.values().all(|&count| count == 1));
        if !hierarchy.has_orphans() {
            prop_assert_eq!(hierarchy.edge_count(), builder.network().unwrap().edge_count());
        }
    }

    #[test]
    fn levels_never_reuse_a_non_root_vertex(network in grid_network()) {
        let builder = network.builder();
        let root = network.points[network.segments[0].0];
        let hierarchy = builder.decompose(&root).unwrap().unwrap();

        for level in (0..hierarchy.level_count() as u32).map(HierarchyLevel) {
            let mut used = HashSet::new();
            for route in hierarchy.routes_at(level) {
                prop_assert_eq!(route.path.source(), Some(&route.root));
                for vertex in &route.path.coordinates()[1..] {
                    prop_assert!(used.insert(*vertex), "{} reused on {}", vertex, level);
                }
            }
        }
    }

    #[test]
    fn policies_only_differ_on_orphans(network in grid_network(), tolerance in 0.0..15.0f64) {
        let root = network.points[network.segments[0].0];
        let with = |policy| {
            let config = AnalysisConfig::default()
                .with_snap_tolerance(tolerance)
                .with_orphan_policy(policy);
            network.builder_with(config).decompose(&root).unwrap().unwrap()
        };
        let dropped = with(OrphanPolicy::Drop);
        let snapped = with(OrphanPolicy::SnapToNearest);

        prop_assert_eq!(&with(OrphanPolicy::Warn), &dropped);
        if !dropped.has_orphans() {
            prop_assert_eq!(&snapped, &dropped);
        }
        prop_assert!(snapped.orphans.len() <= dropped.orphans.len());
        prop_assert_eq!(
            snapped.edge_count() + snapped.orphans.iter().map(|o| o.edges.len()).sum::<usize>(),
            network.builder().network().unwrap().edge_count()
        );
        for link in &snapped.snapped {
            prop_assert!(link.distance <= tolerance + 1e-9);
            prop_assert!((link.vertex.distance_to(&link.anchor) - link.distance).abs() < 1e-9);
        }
    }
}
