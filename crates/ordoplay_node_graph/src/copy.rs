// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deep graph copy with connection redirection.
//!
//! Copying runs in two passes:
//! 1. Skeleton: every slot of the source is duplicated into the copy (holes
//!    stay holes) and a source-to-copy [`NodeRemap`] is recorded.
//! 2. Redirect: every port of every copy-side node rewrites its links through
//!    the remap. Links to anything not in the source graph are dropped.
//!
//! The skeleton pass must finish before any redirection starts, otherwise a
//! link to a node later in the list would have no mapping yet.

use crate::graph::{GraphId, NodeGraph};
use crate::node::{Node, NodeId};
use std::collections::HashMap;

/// Mapping from source node IDs to their copy-side counterparts
#[derive(Debug, Clone, Default)]
pub struct NodeRemap {
    map: HashMap<NodeId, NodeId>,
}

impl NodeRemap {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    /// Build a mapping from two positionally corresponding slot lists.
    ///
    /// Index `i` of `old` maps to index `i` of `new`; positions where either
    /// side is a hole are skipped.
    pub fn positional(old: &[Option<NodeId>], new: &[Option<NodeId>]) -> Result<Self, CopyError> {
        if old.len() != new.len() {
            return Err(CopyError::LengthMismatch {
                old: old.len(),
                new: new.len(),
            });
        }

        let mut remap = Self::with_capacity(old.len());
        for (from, to) in old.iter().zip(new) {
            if let (Some(from), Some(to)) = (from, to) {
                remap.insert(*from, *to);
            }
        }
        Ok(remap)
    }

    /// Record that `from` is copied as `to`
    pub fn insert(&mut self, from: NodeId, to: NodeId) {
        self.map.insert(from, to);
    }

    /// Copy-side counterpart of `from`
    pub fn get(&self, from: NodeId) -> Option<NodeId> {
        self.map.get(&from).copied()
    }

    /// Whether `from` has a counterpart
    pub fn contains(&self, from: NodeId) -> bool {
        self.map.contains_key(&from)
    }

    /// Whether `node` is one of the copy-side counterparts
    pub fn is_target(&self, node: NodeId) -> bool {
        self.map.values().any(|n| *n == node)
    }

    /// Number of mapped nodes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Produce an independent copy of `source` identified as `id`.
///
/// The copy shares the source's schema and node factory. Every link in the
/// copy points at a copy-side node; the source is never modified.
pub fn copy_graph(source: &NodeGraph, id: GraphId) -> Result<NodeGraph, CopyError> {
    let slots = source.slots();

    let mut nodes: Vec<Option<Node>> = Vec::new();
    nodes
        .try_reserve_exact(slots.len())
        .map_err(|e| CopyError::CopyFailed(e.to_string()))?;
    let mut remap = NodeRemap::with_capacity(slots.len());

    for slot in slots {
        let copied = slot.as_ref().map(|original| {
            let mut node = original.duplicate();
            node.attach_to(id.clone());
            remap.insert(original.id(), node.id());
            node
        });
        nodes.push(copied);
    }

    let mut dropped = 0;
    for node in nodes.iter_mut().flatten() {
        for port in node.ports_mut() {
            dropped += port.redirect(&remap);
        }
    }

    if dropped > 0 {
        tracing::debug!(
            "Dropped {} dangling links while copying graph {}",
            dropped,
            source.id()
        );
    }
    tracing::info!(
        "Copied graph {} as {} ({} nodes, {} slots)",
        source.id(),
        id,
        remap.len(),
        nodes.len()
    );

    Ok(NodeGraph::from_parts(
        id,
        source.schema().clone(),
        source.node_types().clone(),
        nodes,
    ))
}

/// Error while copying a graph
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// Storage for the copy could not be allocated
    #[error("Graph copy failed: {0}")]
    CopyFailed(String),

    /// Positional node lists differ in length
    #[error("Node lists differ in length: {old} vs {new}")]
    LengthMismatch {
        /// Source list length
        old: usize,
        /// Copy list length
        new: usize,
    },

    /// The copy could not be registered
    #[error(transparent)]
    Registry(#[from] crate::registry::RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphs::gameplay;
    use crate::port::{Port, PortLink};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn test_graph() -> NodeGraph {
        NodeGraph::new(
            GraphId::generate(),
            Arc::new(gameplay::gameplay_schema()),
            Arc::new(gameplay::create_gameplay_registry()),
        )
    }

    fn source_ids(graph: &NodeGraph) -> HashSet<NodeId> {
        graph.nodes().map(Node::id).collect()
    }

    /// Every link in `copy` must target a node owned by `copy`
    fn assert_isolated(source: &NodeGraph, copy: &NodeGraph) {
        let originals = source_ids(source);
        for node in copy.nodes() {
            assert_eq!(node.graph(), Some(copy.id()));
            for link in node.ports().flat_map(Port::links) {
                assert!(!originals.contains(&link.node));
                let target = copy.node(link.node).expect("link target in copy");
                assert_eq!(target.graph(), Some(copy.id()));
            }
        }
    }

    #[test]
    fn test_copy_two_node_chain() {
        let mut source = test_graph();
        let a = source.add_node("event_begin_play").unwrap();
        let b = source.add_node("print_string").unwrap();
        source.connect(a, "Exec", b, "Exec").unwrap();

        let copy = copy_graph(&source, GraphId::generate()).unwrap();
        assert_ne!(copy.id(), source.id());
        assert_eq!(copy.node_count(), 2);

        let a2 = copy.slots()[0].as_ref().unwrap();
        let b2 = copy.slots()[1].as_ref().unwrap();
        assert_ne!(a2.id(), a);
        assert_ne!(b2.id(), b);
        assert_eq!(a2.node_type(), "event_begin_play");
        assert!(a2.port("Exec").unwrap().is_linked_to(b2.id(), "Exec"));
        assert!(b2.port("Exec").unwrap().is_linked_to(a2.id(), "Exec"));
        assert!(!a2.references_node(a) && !a2.references_node(b));
        assert!(!b2.references_node(a) && !b2.references_node(b));
        assert_isolated(&source, &copy);
    }

    #[test]
    fn test_copy_leaves_source_untouched() {
        let mut source = test_graph();
        let a = source.add_node("event_begin_play").unwrap();
        let b = source.add_node("print_string").unwrap();
        source.connect(a, "Exec", b, "Exec").unwrap();
        let before: Vec<_> = source.connections().collect();

        let _copy = copy_graph(&source, GraphId::generate()).unwrap();

        assert_eq!(source.connections().collect::<Vec<_>>(), before);
        assert!(source.nodes().all(|n| n.graph() == Some(source.id())));
    }

    #[test]
    fn test_copy_empty_graph() {
        let source = test_graph();
        let copy = copy_graph(&source, GraphId::generate()).unwrap();
        assert!(copy.slots().is_empty());
        assert_ne!(copy.id(), source.id());
        assert_eq!(copy.schema(), source.schema());
    }

    #[test]
    fn test_copy_preserves_indices_and_forward_links() {
        let mut source = test_graph();
        let ids: Vec<_> = ["event_tick", "branch", "print_string", "print_string"]
            .iter()
            .map(|t| source.add_node(t).unwrap())
            .collect();
        // Forward and backward references across the list
        source.connect(ids[0], "Exec", ids[1], "Exec").unwrap();
        source.connect(ids[1], "True", ids[3], "Exec").unwrap();
        source.connect(ids[3], "Then", ids[2], "Exec").unwrap();
        source.connect(ids[2], "Then", ids[1], "Exec").unwrap();

        let copy = copy_graph(&source, GraphId::generate()).unwrap();
        let index = |graph: &NodeGraph, id: NodeId| graph.index_of(id).unwrap();

        let mut expected: Vec<_> = source
            .connections()
            .map(|c| {
                (
                    index(&source, c.from_node),
                    c.from_port,
                    index(&source, c.to_node),
                    c.to_port,
                )
            })
            .collect();
        let mut actual: Vec<_> = copy
            .connections()
            .map(|c| {
                (
                    index(&copy, c.from_node),
                    c.from_port,
                    index(&copy, c.to_node),
                    c.to_port,
                )
            })
            .collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);

        for (original, copied) in source.slots().iter().zip(copy.slots()) {
            assert_eq!(
                original.as_ref().map(Node::node_type),
                copied.as_ref().map(Node::node_type)
            );
        }
        assert_isolated(&source, &copy);
    }

    #[test]
    fn test_copy_keeps_self_connection() {
        let mut source = test_graph();
        let branch = source.add_node("branch").unwrap();
        source.connect(branch, "True", branch, "Exec").unwrap();

        let copy = copy_graph(&source, GraphId::generate()).unwrap();
        let connection = copy.connections().next().unwrap();
        assert!(connection.is_self_connection());
        assert_eq!(copy.index_of(connection.from_node), Some(0));
        assert_ne!(connection.from_node, branch);
    }

    #[test]
    fn test_copy_preserves_holes() {
        let schema = Arc::new(gameplay::gameplay_schema());
        let types = Arc::new(gameplay::create_gameplay_registry());
        let first = types.create_node("branch").unwrap();
        let last = types.create_node("print_string").unwrap();
        let source = NodeGraph::from_parts(
            GraphId::generate(),
            schema,
            types,
            vec![Some(first), None, Some(last)],
        );

        let copy = copy_graph(&source, GraphId::generate()).unwrap();
        assert_eq!(copy.slots().len(), 3);
        assert!(copy.slots()[0].is_some());
        assert!(copy.slots()[1].is_none());
        assert!(copy.slots()[2].is_some());
    }

    #[test]
    fn test_copy_drops_dangling_links() {
        let mut source = test_graph();
        let a = source.add_node("event_begin_play").unwrap();
        let gone = NodeId::new();
        // Simulate a stale link to a node that is no longer in the graph
        source
            .node_mut(a)
            .unwrap()
            .port_mut("Exec")
            .unwrap()
            .push_link(PortLink::new(gone, "Exec"));

        let copy = copy_graph(&source, GraphId::generate()).unwrap();
        assert_eq!(copy.connection_count(), 0);
        assert_eq!(copy.nodes().next().unwrap().connection_count(), 0);
    }

    #[test]
    fn test_positional_remap() {
        let (a, b, c) = (NodeId::new(), NodeId::new(), NodeId::new());
        let (a2, c2) = (NodeId::new(), NodeId::new());

        let remap =
            NodeRemap::positional(&[Some(a), Some(b), Some(c)], &[Some(a2), None, Some(c2)]).unwrap();
        assert_eq!(remap.len(), 2);
        assert_eq!(remap.get(a), Some(a2));
        assert!(!remap.contains(b));
        assert!(remap.is_target(c2));

        assert!(matches!(
            NodeRemap::positional(&[Some(a)], &[]),
            Err(CopyError::LengthMismatch { old: 1, new: 0 })
        ));
    }

    #[test]
    fn test_error_messages() {
        let failed = CopyError::CopyFailed("memory allocation failed".to_string());
        assert_eq!(failed.to_string(), "Graph copy failed: memory allocation failed");

        let mismatch = CopyError::LengthMismatch { old: 3, new: 2 };
        assert_eq!(mismatch.to_string(), "Node lists differ in length: 3 vs 2");

        let registry = crate::registry::RegistryError::DuplicateIdentifier(GraphId::new("taken"));
        let err = CopyError::from(registry);
        assert!(matches!(
            err,
            CopyError::Registry(crate::registry::RegistryError::DuplicateIdentifier(ref id))
                if id == &GraphId::new("taken")
        ));
        assert_eq!(err.to_string(), "Graph identifier already in use: taken");
    }
}
