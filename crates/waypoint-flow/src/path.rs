//! Graph-to-path reduction
//!
//! Flattens a scenario graph into the single linear sequence a run plays
//! back. Degenerate graphs degrade instead of erroring: cycles are bounded
//! by the visited set, re-convergent branches collapse into one discovered
//! order, and unreachable nodes are omitted.

use std::collections::{HashMap, HashSet};

use waypoint_core::{Node, Scenario};

/// Compute the playback sequence for a scenario.
///
/// The start node is the first node in authoring order with at least one
/// outgoing edge and no incoming edges; when no node qualifies (for
/// example an all-cyclic graph) the first node overall is used. From the
/// start, a depth-first walk follows outgoing edges in authoring order,
/// visiting each node at most once.
pub fn calculate_flow_path(scenario: &Scenario) -> Vec<Node> {
    if scenario.nodes.is_empty() {
        return Vec::new();
    }

    let mut indegree: HashMap<&str, usize> = scenario
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), 0))
        .collect();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in &scenario.edges {
        // Edges touching unknown nodes are a validation finding, not a
        // traversal concern.
        if !indegree.contains_key(edge.source.as_str())
            || !indegree.contains_key(edge.target.as_str())
        {
            continue;
        }
        if let Some(count) = indegree.get_mut(edge.target.as_str()) {
            *count += 1;
        }
        outgoing
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let start = scenario
        .nodes
        .iter()
        .find(|n| {
            indegree.get(n.id.as_str()).copied().unwrap_or(0) == 0
                && outgoing.get(n.id.as_str()).is_some_and(|t| !t.is_empty())
        })
        .unwrap_or(&scenario.nodes[0]);

    let by_id: HashMap<&str, &Node> = scenario
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut path: Vec<Node> = Vec::new();
    visit(start.id.as_str(), &by_id, &outgoing, &mut visited, &mut path);
    path
}

fn visit<'a>(
    id: &'a str,
    by_id: &HashMap<&'a str, &'a Node>,
    outgoing: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    path: &mut Vec<Node>,
) {
    if !visited.insert(id) {
        return;
    }
    if let Some(node) = by_id.get(id) {
        path.push((*node).clone());
    }
    if let Some(targets) = outgoing.get(id) {
        for target in targets {
            visit(target, by_id, outgoing, visited, path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::Edge;

    fn node(id: &str) -> Node {
        Node::new(id, "message")
    }

    fn ids(path: &[Node]) -> Vec<&str> {
        path.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn empty_scenario_yields_empty_path() {
        let scenario = Scenario::new("s", "Empty");
        assert!(calculate_flow_path(&scenario).is_empty());
    }

    #[test]
    fn chain_follows_edges_from_the_start() {
        let scenario = Scenario::new("s", "Chain")
            .with_node(node("a"))
            .with_node(node("b"))
            .with_node(node("c"))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("b", "c"));

        assert_eq!(ids(&calculate_flow_path(&scenario)), vec!["a", "b", "c"]);
    }

    #[test]
    fn start_is_first_zero_indegree_node_with_outgoing_edges() {
        // "b" comes first in authoring order but has an incoming edge.
        let scenario = Scenario::new("s", "Shuffled")
            .with_node(node("b"))
            .with_node(node("a"))
            .with_edge(Edge::new("a", "b"));

        assert_eq!(ids(&calculate_flow_path(&scenario)), vec!["a", "b"]);
    }

    #[test]
    fn branches_collapse_in_edge_order() {
        let scenario = Scenario::new("s", "Branch")
            .with_node(node("a"))
            .with_node(node("b"))
            .with_node(node("c"))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("a", "c"));

        assert_eq!(ids(&calculate_flow_path(&scenario)), vec!["a", "b", "c"]);
    }

    #[test]
    fn reconvergent_branch_visits_each_node_once() {
        let scenario = Scenario::new("s", "Diamond")
            .with_node(node("a"))
            .with_node(node("b"))
            .with_node(node("c"))
            .with_node(node("d"))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("a", "c"))
            .with_edge(Edge::new("b", "d"))
            .with_edge(Edge::new("c", "d"));

        let path = calculate_flow_path(&scenario);
        assert_eq!(ids(&path), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn cycle_falls_back_to_first_node_and_terminates() {
        let scenario = Scenario::new("s", "Cycle")
            .with_node(node("a"))
            .with_node(node("b"))
            .with_edge(Edge::new("a", "b"))
            .with_edge(Edge::new("b", "a"));

        assert_eq!(ids(&calculate_flow_path(&scenario)), vec!["a", "b"]);
    }

    #[test]
    fn unreachable_nodes_are_omitted() {
        let scenario = Scenario::new("s", "Island")
            .with_node(node("a"))
            .with_node(node("b"))
            .with_node(node("island"))
            .with_edge(Edge::new("a", "b"));

        assert_eq!(ids(&calculate_flow_path(&scenario)), vec!["a", "b"]);
    }

    #[test]
    fn edgeless_scenario_plays_its_first_node() {
        let scenario = Scenario::new("s", "Loose")
            .with_node(node("a"))
            .with_node(node("b"));

        assert_eq!(ids(&calculate_flow_path(&scenario)), vec!["a"]);
    }
}
