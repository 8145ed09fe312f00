//! Decompose a pipe network into main and branch routes
//!
//! The network file holds `{"polylines": [[{"x": 0.0, "y": 0.0}, ...], ...]}`. The
//! hierarchy and its per-level summary are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use cim_pipe_network::{
    AnalysisConfig, Coordinate, GraphBuilder, Hierarchy, HierarchySummary, OrphanPolicy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

#[derive(Debug, Parser)]
#[command(name = "network-hierarchy")]
#[command(about = "Decompose a pipe network into main and branch routes")]
struct Cli {
    /// Network JSON file
    network: PathBuf,

    /// Root x coordinate
    #[arg(long, allow_negative_numbers = true)]
    x: f64,

    /// Root y coordinate
    #[arg(long, allow_negative_numbers = true)]
    y: f64,

    /// Analysis config JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config's snap tolerance
    #[arg(long)]
    snap_tolerance: Option<f64>,

    /// Overrides the config's orphan policy (drop, warn, snap_to_nearest, fail)
    #[arg(long, value_parser = parse_policy)]
    orphan_policy: Option<OrphanPolicy>,

    /// Print the report on one line
    #[arg(long)]
    compact: bool,
}

#[derive(Debug, Deserialize)]
struct NetworkFile {
    polylines: Vec<Vec<Coordinate>>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    summary: HierarchySummary,
    hierarchy: &'a Hierarchy,
}

fn parse_policy(name: &str) -> Result<OrphanPolicy, String> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| format!("unknown orphan policy `{name}`"))
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

impl Cli {
    fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_str(&read(path)?)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AnalysisConfig::default(),
        };
        if let Some(tolerance) = self.snap_tolerance {
            config = config.with_snap_tolerance(tolerance);
        }
        if let Some(policy) = self.orphan_policy {
            config = config.with_orphan_policy(policy);
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let network: NetworkFile = serde_json::from_str(&read(&cli.network)?)
        .with_context(|| format!("parsing {}", cli.network.display()))?;
    let root = Coordinate::new(cli.x, cli.y);
    let config = cli.analysis_config()?;
    tracing::info!(
        network = %cli.network.display(),
        polylines = network.polylines.len(),
        %root,
        policy = ?config.orphan_policy,
        "decompose"
    );

    let mut builder = GraphBuilder::new(config)?;
    builder.add(&network.polylines)?;
    builder.initialize()?;

    let hierarchy = builder
        .decompose(&root)?
        .with_context(|| format!("no network vertex at {root}"))?;

    let report = Report {
        summary: HierarchySummary::from_hierarchy(&hierarchy),
        hierarchy: &hierarchy,
    };
    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_negative_root_and_overrides() {
        let cli = Cli::try_parse_from([
            "network-hierarchy",
            "net.json",
            "--x",
            "-12.5",
            "--y",
            "3",
            "--snap-tolerance",
            "0.5",
            "--orphan-policy",
            "snap_to_nearest",
        ])
        .unwrap();

        assert_eq!(cli.network, PathBuf::from("net.json"));
        assert_eq!((cli.x, cli.y), (-12.5, 3.0));
        assert!(!cli.compact);

        let config = cli.analysis_config().unwrap();
        assert_eq!(config.snap_tolerance, 0.5);
        assert_eq!(config.orphan_policy, OrphanPolicy::SnapToNearest);
    }

    #[test]
    fn test_rejects_unknown_policy_and_missing_root() {
        let unknown = Cli::try_parse_from([
            "network-hierarchy",
            "net.json",
            "--x",
            "0",
            "--y",
            "0",
            "--orphan-policy",
            "attach",
        ]);
        assert!(unknown.is_err());

        let missing = Cli::try_parse_from(["network-hierarchy", "net.json", "--x", "0"]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_override_is_validated() {
        let cli = Cli::try_parse_from([
            "network-hierarchy",
            "net.json",
            "--x",
            "0",
            "--y",
            "0",
            "--snap-tolerance=-1",
        ])
        .unwrap();

        assert!(cli.analysis_config().is_err());
    }
}
