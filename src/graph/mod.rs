//! Package dependency graph and publish ordering
//!
//! Directed graph where `A → B` means "A depends on B". Publish order is the
//! reverse toposort: dependencies first, because later pipelines consume the
//! version numbers earlier ones produce.

pub mod propagate;

use crate::core::error::{TrainError, TrainResult};
use crate::package::{DependencyKind, Workspace};
use petgraph::algo;
use petgraph::graph::DiGraph;
use std::collections::HashMap;

pub struct PackageGraph {
  graph: DiGraph<String, DependencyKind>,
}

impl PackageGraph {
  /// Build the graph from workspace manifests.
  ///
  /// Only references between workspace packages become edges; external
  /// dependencies are invisible here.
  pub fn build(workspace: &Workspace) -> TrainResult<Self> {
    let mut graph = DiGraph::new();
    let mut name_to_node = HashMap::new();

    for package in &workspace.packages {
      let node = graph.add_node(package.name.clone());
      name_to_node.insert(package.name.clone(), node);
    }

    for package in &workspace.packages {
      let from = name_to_node[&package.name];
      for other in &workspace.packages {
        if other.name == package.name {
          continue;
        }
        for kind in DependencyKind::ALL {
          if package.manifest.dependency_range(kind, &other.name).is_some() {
            graph.add_edge(from, name_to_node[&other.name], kind);
          }
        }
      }
    }

    Ok(Self { graph })
  }

  /// Package names in publish order: dependencies before dependents
  pub fn publish_order(&self) -> TrainResult<Vec<String>> {
    let sorted = algo::toposort(&self.graph, None).map_err(|cycle| {
      let name = &self.graph[cycle.node_id()];
      TrainError::with_help(
        format!("Dependency cycle detected involving '{}'", name),
        "Break the cycle before releasing; cyclic packages cannot be published in a safe order.",
      )
    })?;

    // Toposort puts dependents first for A→B edges; publishing wants the
    // reverse.
    Ok(sorted.into_iter().rev().map(|n| self.graph[n].clone()).collect())
  }
}
