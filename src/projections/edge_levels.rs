//! Edge level projection
//!
//! Looks up the hierarchy level of any network edge, the edges of a level, and the
//! edges meeting at a vertex. Renderers use it to style a network by level.

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

use crate::algorithms::hierarchy::Hierarchy;
use crate::value_objects::{Coordinate, Edge, HierarchyLevel};

/// Where an edge ended up in a decomposition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAssignment {
    Level(HierarchyLevel),
    /// Part of a component with no connecting vertex; carries the level it missed
    Orphan(HierarchyLevel),
}

/// Projection that maintains edge to level lookups
#[derive(Debug, Clone, Default)]
pub struct EdgeLevelProjection {
    assignments: IndexMap<Edge, EdgeAssignment>,
    edges_by_level: BTreeMap<HierarchyLevel, Vec<Edge>>,
    edges_by_vertex: HashMap<Coordinate, Vec<Edge>>,
}

impl EdgeLevelProjection {
    /// Create a new edge level projection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hierarchy(hierarchy: &Hierarchy) -> Self {
        let mut projection = Self::new();
        super::HierarchyProjection::apply(&mut projection, hierarchy);
        projection
    }

    /// Assignment of an edge, in either orientation
    pub fn assignment(&self, edge: &Edge) -> Option<EdgeAssignment> {
        self.assignments.get(edge).copied()
    }

    /// Level of an edge that belongs to the hierarchy
    pub fn level_of(&self, edge: &Edge) -> Option<HierarchyLevel> {
        match self.assignment(edge)? {
            EdgeAssignment::Level(level) => Some(level),
            EdgeAssignment::Orphan(_) => None,
        }
    }

    /// Edges of one level in route order
    pub fn edges_at(&self, level: HierarchyLevel) -> &[Edge] {
        self.edges_by_level
            .get(&level)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Edges incident to a vertex, assigned or orphaned
    pub fn edges_touching(&self, coordinate: &Coordinate) -> &[Edge] {
        self.edges_by_vertex
            .get(coordinate)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Edges left out of the hierarchy
    pub fn orphaned_edges(&self) -> impl Iterator<Item = &Edge> {
        self.assignments
            .iter()
            .filter(|(_, assignment)| matches!(assignment, EdgeAssignment::Orphan(_)))
            .map(|(edge, _)| edge)
    }

    /// Total number of tracked edges
    pub fn total_edges(&self) -> usize {
        self.assignments.len()
    }

    fn record(&mut self, edge: Edge, assignment: EdgeAssignment) {
        if self.assignments.insert(edge, assignment).is_some() {
            return;
        }
        if let EdgeAssignment::Level(level) = assignment {
            self.edges_by_level.entry(level).or_default().push(edge);
        }
        for vertex in [edge.a, edge.b] {
            self.edges_by_vertex.entry(vertex).or_default().push(edge);
        }
    }
}

impl super::HierarchyProjection for EdgeLevelProjection {
    fn apply(&mut self, hierarchy: &Hierarchy) {
        self.clear();
        for route in &hierarchy.routes {
            for edge in route.path.edges() {
                self.record(edge, EdgeAssignment::Level(route.level));
            }
        }
        for orphan in &hierarchy.orphans {
            for &edge in &orphan.edges {
                self.record(edge, EdgeAssignment::Orphan(orphan.level));
            }
        }
    }

    fn clear(&mut self) {
        self.assignments.clear();
        self.edges_by_level.clear();
        self.edges_by_vertex.clear();
    }
}
