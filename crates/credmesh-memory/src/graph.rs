//! Memory Graph (C13, spec §4.13): an in-memory typed graph of nodes/edges
//! backed by a persistent append-only log per side. The in-memory index is
//! rebuilt from the logs on open so a restart never loses history.

use std::path::Path;

use chrono::Utc;

use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{MemoryEdge, MemoryEdgeKind, MemoryNode, MemoryNodeKind};

use crate::error::CmResult;

pub struct MemoryGraph {
    node_log: LogStore,
    edge_log: LogStore,
    nodes: Vec<MemoryNode>,
    edges: Vec<MemoryEdge>,
}

impl MemoryGraph {
    pub fn open(dir: impl AsRef<Path>) -> CmResult<Self> {
        let dir = dir.as_ref();
        let node_log = LogStore::open(dir.join("memory_nodes.ndjson"))?;
        let edge_log = LogStore::open(dir.join("memory_edges.ndjson"))?;
        let nodes = node_log.load_all::<MemoryNode>()?;
        let edges = edge_log.load_all::<MemoryEdge>()?;
        Ok(Self {
            node_log,
            edge_log,
            nodes,
            edges,
        })
    }

    pub fn add_node(&mut self, kind: MemoryNodeKind, ref_id: impl Into<String>, tags: Vec<String>) -> CmResult<MemoryNode> {
        let node = MemoryNode {
            node_id: format!("MN-{}", self.nodes.len() + 1),
            kind,
            created_at: Utc::now(),
            tags,
            ref_id: ref_id.into(),
        };
        self.node_log.append(&node)?;
        self.nodes.push(node.clone());
        Ok(node)
    }

    pub fn add_edge(&mut self, from_node_id: impl Into<String>, to_node_id: impl Into<String>, kind: MemoryEdgeKind) -> CmResult<MemoryEdge> {
        let edge = MemoryEdge {
            from_node_id: from_node_id.into(),
            to_node_id: to_node_id.into(),
            kind,
            created_at: Utc::now(),
        };
        self.edge_log.append(&edge)?;
        self.edges.push(edge.clone());
        Ok(edge)
    }

    pub fn nodes(&self) -> &[MemoryNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[MemoryEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn find_node(&self, node_id: &str) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    pub fn find_by_ref(&self, ref_id: &str) -> Option<&MemoryNode> {
        self.nodes.iter().find(|n| n.ref_id == ref_id)
    }

    pub fn edges_into(&self, node_id: &str) -> impl Iterator<Item = &MemoryEdge> {
        self.edges.iter().filter(move |e| e.to_node_id == node_id)
    }

    pub fn edges_of_kind(&self, kind: MemoryEdgeKind) -> impl Iterator<Item = &MemoryEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }
}
