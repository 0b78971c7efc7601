//! Call-graph view over a session's registries, for export and cycle statistics.
//!
//! Nodes are method identities (registered methods, their callees, and
//! interface methods); edges are direct calls and interface -> implementor
//! links. Unregistered callees appear as leaf nodes.

use crate::index::ImplementationIndex;
use common::{FactRegistry, MethodIdentity};
use petgraph::algo::tarjan_scc;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Kind of a call-graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Call,
    Implementation,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Call => f.write_str("call"),
            EdgeKind::Implementation => f.write_str("impl"),
        }
    }
}

/// Statistics about the call graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub node_count: usize,
    pub call_edges: usize,
    pub implementation_edges: usize,
    /// Nodes with neither a record nor an implementation.
    pub unresolved: usize,
}

pub struct CallGraph {
    pub graph: DiGraph<MethodIdentity, EdgeKind>,
    pub stats: GraphStats,
}

impl CallGraph {
    /// Builds the graph. Node insertion order is sorted by identity so the
    /// output is stable across runs.
    pub fn build(registry: &FactRegistry, index: &ImplementationIndex) -> Self {
        let mut nodes: BTreeSet<&MethodIdentity> = BTreeSet::new();
        for record in registry.records() {
            nodes.insert(&record.identity);
            nodes.extend(record.callees.iter());
        }
        for (iface, implementors) in index.iter() {
            nodes.insert(iface);
            nodes.extend(implementors.iter());
        }

        let mut graph = DiGraph::new();
        let mut id_to_node: BTreeMap<&MethodIdentity, NodeIndex> = BTreeMap::new();
        let mut stats = GraphStats::default();
        for id in nodes {
            id_to_node.insert(id, graph.add_node(id.clone()));
            if !registry.contains(id) && !index.has_implementations(id) {
                stats.unresolved += 1;
            }
        }
        stats.node_count = id_to_node.len();

        let mut records: Vec<_> = registry.records().collect();
        records.sort_by(|a, b| a.identity.cmp(&b.identity));
        for record in records {
            let src = id_to_node[&record.identity];
            for callee in &record.callees {
                graph.add_edge(src, id_to_node[callee], EdgeKind::Call);
                stats.call_edges += 1;
            }
        }

        let mut interfaces: Vec<_> = index.iter().collect();
        interfaces.sort_by(|a, b| a.0.cmp(b.0));
        for (iface, implementors) in interfaces {
            let src = id_to_node[iface];
            for implementor in implementors {
                graph.add_edge(src, id_to_node[implementor], EdgeKind::Implementation);
                stats.implementation_edges += 1;
            }
        }

        Self { graph, stats }
    }

    /// Strongly connected components with more than one method, or a
    /// method calling itself. Each cycle is sorted; cycles are sorted by
    /// their first member.
    pub fn cycles(&self) -> Vec<Vec<MethodIdentity>> {
        let mut cycles: Vec<Vec<MethodIdentity>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .map(|scc| {
                let mut members: Vec<MethodIdentity> =
                    scc.into_iter().map(|n| self.graph[n].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Graphviz DOT rendering.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MethodFacts, MethodRecord};

    fn id(owner: &str, method: &str) -> MethodIdentity {
        MethodIdentity::new(owner, method, Vec::<String>::new())
    }

    fn setup(facts: Vec<MethodFacts>) -> (FactRegistry, ImplementationIndex) {
        let mut registry = FactRegistry::new();
        let mut index = ImplementationIndex::new();
        for f in facts {
            if registry.register(MethodRecord::from_facts(&f)).is_some() {
                for iface in &f.implements {
                    index.add(iface.clone(), f.identity.clone());
                }
            }
        }
        (registry, index)
    }

    #[test]
    fn test_empty_graph() {
        let (registry, index) = setup(vec![]);
        let graph = CallGraph::build(&registry, &index);
        assert_eq!(graph.stats, GraphStats::default());
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn test_edges_and_unresolved() {
        let iface = id("a.Notifier", "notify");
        let (registry, index) = setup(vec![
            MethodFacts::new(id("a.Ctrl", "get"))
                .calls(iface.clone())
                .calls(id("lib.Ext", "call")),
            MethodFacts::new(id("a.Mail", "notify")).implementing(iface),
        ]);
        let graph = CallGraph::build(&registry, &index);
        assert_eq!(graph.stats.node_count, 4);
        assert_eq!(graph.stats.call_edges, 2);
        assert_eq!(graph.stats.implementation_edges, 1);
        assert_eq!(graph.stats.unresolved, 1);
    }

    #[test]
    fn test_cycles_found() {
        let (a, b, c) = (id("a.A", "a"), id("a.B", "b"), id("a.C", "c"));
        let (registry, index) = setup(vec![
            MethodFacts::new(a.clone()).calls(b.clone()),
            MethodFacts::new(b.clone()).calls(a.clone()),
            MethodFacts::new(c.clone()).calls(c.clone()),
        ]);
        let graph = CallGraph::build(&registry, &index);
        assert_eq!(graph.cycles(), vec![vec![a, b], vec![c]]);
    }

    #[test]
    fn test_dot_output() {
        let (registry, index) = setup(vec![MethodFacts::new(id("a.A", "a")).calls(id("a.B", "b"))]);
        let dot = CallGraph::build(&registry, &index).to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("a.A#a()"));
        assert!(dot.contains("call"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
