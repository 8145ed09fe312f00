//! Network aggregates

pub mod graph_builder;
pub mod network_graph;
pub mod path;

pub use graph_builder::*;
pub use network_graph::*;
pub use path::*;
