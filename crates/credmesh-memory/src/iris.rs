//! IRIS queries (spec §4.13): WHY, WHAT_DRIFTED, WHAT_CHANGED, RECALL,
//! STATUS. Each is a pure read over a [`MemoryGraph`] snapshot; none
//! mutate the graph.

use chrono::{DateTime, Utc};

use credmesh_types::model::{MemoryEdgeKind, MemoryNode, MemoryNodeKind, StatusLight};

use crate::graph::MemoryGraph;

/// `WHY(episodeId)`: walk inbound `CAUSED`/`PRODUCED` edges and surface the
/// chain of nodes that explain how the episode came to be.
#[derive(Debug, Clone, PartialEq)]
pub struct WhyResult {
    pub episode_node: Option<MemoryNode>,
    pub causal_chain: Vec<MemoryNode>,
}

pub fn why(graph: &MemoryGraph, episode_ref_id: &str) -> WhyResult {
    let episode_node = graph.find_by_ref(episode_ref_id).cloned();
    let mut chain = Vec::new();
    if let Some(node) = &episode_node {
        let mut frontier = vec![node.node_id.clone()];
        let mut seen = std::collections::HashSet::new();
        seen.insert(node.node_id.clone());
        while let Some(current) = frontier.pop() {
            for edge in graph.edges_into(&current) {
                if !matches!(edge.kind, MemoryEdgeKind::Caused | MemoryEdgeKind::Produced) {
                    continue;
                }
                if seen.insert(edge.from_node_id.clone()) {
                    if let Some(n) = graph.find_node(&edge.from_node_id) {
                        chain.push(n.clone());
                        frontier.push(n.node_id.clone());
                    }
                }
            }
        }
    }
    WhyResult {
        episode_node,
        causal_chain: chain,
    }
}

/// `WHAT_DRIFTED`: project `DRIFT` nodes, grouped by fingerprint tag, sorted
/// by recurrence (descending).
#[derive(Debug, Clone, PartialEq)]
pub struct DriftGroup {
    pub fingerprint: String,
    pub recurrence: usize,
    pub nodes: Vec<MemoryNode>,
}

pub fn what_drifted(graph: &MemoryGraph) -> Vec<DriftGroup> {
    let mut groups: Vec<DriftGroup> = Vec::new();
    for node in graph.nodes().iter().filter(|n| n.kind == MemoryNodeKind::Drift) {
        let fingerprint = node
            .tags
            .iter()
            .find(|t| t.starts_with("fp:"))
            .cloned()
            .unwrap_or_else(|| format!("fp:{}", node.ref_id));
        if let Some(group) = groups.iter_mut().find(|g| g.fingerprint == fingerprint) {
            group.nodes.push(node.clone());
            group.recurrence += 1;
        } else {
            groups.push(DriftGroup {
                fingerprint,
                recurrence: 1,
                nodes: vec![node.clone()],
            });
        }
    }
    groups.sort_by(|a, b| b.recurrence.cmp(&a.recurrence));
    groups
}

/// `WHAT_CHANGED`: nodes created strictly between `since` and `until`.
pub fn what_changed(graph: &MemoryGraph, since: DateTime<Utc>, until: DateTime<Utc>) -> Vec<MemoryNode> {
    graph
        .nodes()
        .iter()
        .filter(|n| n.created_at > since && n.created_at <= until)
        .cloned()
        .collect()
}

/// `RECALL(entity)`: nodes tagged with `entity`, optionally bounded by a
/// temporal filter.
pub fn recall(graph: &MemoryGraph, entity_tag: &str, since: Option<DateTime<Utc>>) -> Vec<MemoryNode> {
    graph
        .nodes()
        .iter()
        .filter(|n| n.tags.iter().any(|t| t == entity_tag))
        .filter(|n| since.map_or(true, |s| n.created_at >= s))
        .cloned()
        .collect()
}

/// `STATUS`: current lattice headline + credibility band. The band itself
/// comes from the credibility scorer (a separate component); this query
/// only assembles the headline the mesh already tracks in its memory graph.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResult {
    pub headline: String,
    pub active_claims: usize,
    pub open_drift: usize,
}

pub fn status(graph: &MemoryGraph, worst_active_light: Option<StatusLight>) -> StatusResult {
    let active_claims = graph
        .nodes()
        .iter()
        .filter(|n| n.kind == MemoryNodeKind::Claim)
        .count();
    let open_drift = graph
        .nodes()
        .iter()
        .filter(|n| n.kind == MemoryNodeKind::Drift)
        .filter(|n| !graph.edges_of_kind(MemoryEdgeKind::ResolvedBy).any(|e| e.to_node_id == n.node_id))
        .count();
    let headline = match worst_active_light {
        Some(StatusLight::Red) => "red signals active".to_string(),
        Some(StatusLight::Yellow) => "yellow signals active".to_string(),
        Some(StatusLight::Green) | None => "nominal".to_string(),
    };
    StatusResult {
        headline,
        active_claims,
        open_drift,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credmesh_types::model::MemoryEdgeKind as EdgeKind;

    #[test]
    fn why_walks_caused_edges_back_to_drift() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = MemoryGraph::open(dir.path()).unwrap();
        let drift = graph.add_node(MemoryNodeKind::Drift, "DRIFT-1", vec![]).unwrap();
        let episode = graph.add_node(MemoryNodeKind::Episode, "EP-1", vec![]).unwrap();
        graph.add_edge(drift.node_id.clone(), episode.node_id.clone(), EdgeKind::Caused).unwrap();

        let result = why(&graph, "EP-1");
        assert!(result.episode_node.is_some());
        assert_eq!(result.causal_chain.len(), 1);
        assert_eq!(result.causal_chain[0].ref_id, "DRIFT-1");
    }

    #[test]
    fn what_drifted_groups_by_fingerprint_and_sorts_by_recurrence() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = MemoryGraph::open(dir.path()).unwrap();
        graph.add_node(MemoryNodeKind::Drift, "D1", vec!["fp:abc".into()]).unwrap();
        graph.add_node(MemoryNodeKind::Drift, "D2", vec!["fp:abc".into()]).unwrap();
        graph.add_node(MemoryNodeKind::Drift, "D3", vec!["fp:def".into()]).unwrap();

        let groups = what_drifted(&graph);
        assert_eq!(groups[0].fingerprint, "fp:abc");
        assert_eq!(groups[0].recurrence, 2);
    }

    #[test]
    fn recall_filters_by_tag() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = MemoryGraph::open(dir.path()).unwrap();
        graph.add_node(MemoryNodeKind::Claim, "CLAIM-1", vec!["S003".into()]).unwrap();
        graph.add_node(MemoryNodeKind::Claim, "CLAIM-2", vec!["S004".into()]).unwrap();

        let result = recall(&graph, "S003", None);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].ref_id, "CLAIM-1");
    }
}
