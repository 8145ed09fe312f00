//! Hierarchy summary projection
//!
//! Per-level counts and lengths of a decomposition, for reporting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::HierarchyProjection;
use crate::algorithms::hierarchy::Hierarchy;
use crate::value_objects::{Coordinate, HierarchyLevel};

/// Summary of one hierarchy level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: HierarchyLevel,
    /// Number of accepted paths on this level
    pub route_count: usize,
    pub edge_count: usize,
    pub total_length: f64,
    /// Distinct path roots, ordered by x then y
    pub roots: Vec<Coordinate>,
}

/// Summary of a whole decomposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchySummary {
    pub root: Option<Coordinate>,
    pub levels: Vec<LevelSummary>,
    pub route_count: usize,
    pub edge_count: usize,
    pub total_length: f64,
    pub orphan_count: usize,
    pub orphan_edge_count: usize,
}

impl Default for HierarchySummary {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchySummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self {
            root: None,
            levels: Vec::new(),
            route_count: 0,
            edge_count: 0,
            total_length: 0.0,
            orphan_count: 0,
            orphan_edge_count: 0,
        }
    }

    /// Summarize a decomposition
    pub fn from_hierarchy(hierarchy: &Hierarchy) -> Self {
        let mut summary = Self::new();
        summary.apply(hierarchy);
        summary
    }

    /// Get the summary of one level
    pub fn level(&self, level: HierarchyLevel) -> Option<&LevelSummary> {
        self.levels.iter().find(|summary| summary.level == level)
    }

    /// Number of summarized levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

impl HierarchyProjection for HierarchySummary {
    fn apply(&mut self, hierarchy: &Hierarchy) {
        self.clear();
        self.root = Some(hierarchy.root);

        let mut levels: BTreeMap<HierarchyLevel, LevelSummary> = BTreeMap::new();
        for route in &hierarchy.routes {
            let level = levels.entry(route.level).or_insert_with(|| LevelSummary {
                level: route.level,
                route_count: 0,
                edge_count: 0,
                total_length: 0.0,
                roots: Vec::new(),
            });
            level.route_count += 1;
            level.edge_count += route.path.edge_count();
            level.total_length += route.path.length();
            if !level.roots.contains(&route.root) {
                level.roots.push(route.root);
            }
        }

        for level in levels.values_mut() {
            level.roots.sort_by(Coordinate::cmp_xy);
        }
        self.levels = levels.into_values().collect();
        self.route_count = hierarchy.routes.len();
        self.edge_count = hierarchy.edge_count();
        self.total_length = hierarchy.total_length();
        self.orphan_count = hierarchy.orphans.len();
        self.orphan_edge_count = hierarchy.orphans.iter().map(|o| o.edges.len()).sum();
    }

    fn clear(&mut self) {
        *self = Self::new();
    }
}
