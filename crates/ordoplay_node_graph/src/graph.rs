// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph container: an ordered list of nodes and their structural mutation.

use crate::connection::Connection;
use crate::node::{Node, NodeId, NodeRegistry};
use crate::port::{Port, PortDirection, PortLink};
use crate::schema::GraphSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a graph, unique among live graphs of a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphId(String);

impl GraphId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GraphId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GraphId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A node graph.
///
/// Nodes are kept in insertion order. The graph owns every node it holds and
/// is the only place links between nodes are created or severed, so no node
/// left in the graph ever references one that was removed.
#[derive(Debug)]
pub struct NodeGraph {
    id: GraphId,
    schema: Arc<GraphSchema>,
    node_types: Arc<NodeRegistry>,
    /// `None` slots are holes; they never arise from the public mutation API
    nodes: Vec<Option<Node>>,
}

impl NodeGraph {
    pub(crate) fn new(id: GraphId, schema: Arc<GraphSchema>, node_types: Arc<NodeRegistry>) -> Self {
        Self::from_parts(id, schema, node_types, Vec::new())
    }

    pub(crate) fn from_parts(
        id: GraphId,
        schema: Arc<GraphSchema>,
        node_types: Arc<NodeRegistry>,
        nodes: Vec<Option<Node>>,
    ) -> Self {
        Self {
            id,
            schema,
            node_types,
            nodes,
        }
    }

    /// Graph identifier
    pub fn id(&self) -> &GraphId {
        &self.id
    }

    /// Schema this graph was created with
    pub fn schema(&self) -> &Arc<GraphSchema> {
        &self.schema
    }

    /// Node factory used by [`NodeGraph::add_node`]
    pub fn node_types(&self) -> &Arc<NodeRegistry> {
        &self.node_types
    }

    /// Whether the schema declares `node_type` as required
    pub fn requires(&self, node_type: &str) -> bool {
        self.schema.requires(node_type)
    }

    /// Required node types with no live node in the graph
    pub fn missing_required_types(&self) -> Vec<&str> {
        self.schema
            .required()
            .iter()
            .filter(|t| !self.nodes().any(|n| n.node_type() == t.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Live nodes in order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// Raw node slots, holes included
    pub fn slots(&self) -> &[Option<Node>] {
        &self.nodes
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes().find(|n| n.id() == node_id)
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().flatten().find(|n| n.id() == node_id)
    }

    /// Rename a node
    pub fn set_node_name(
        &mut self,
        node_id: NodeId,
        name: impl Into<String>,
    ) -> Result<(), GraphError> {
        let node = self
            .node_mut(node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.name = name.into();
        Ok(())
    }

    /// Move a node on the canvas
    pub fn set_node_position(&mut self, node_id: NodeId, x: f32, y: f32) -> Result<(), GraphError> {
        let node = self
            .node_mut(node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.position = [x, y];
        Ok(())
    }

    /// Slot index of a node
    pub fn index_of(&self, node_id: NodeId) -> Option<usize> {
        self.nodes
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|n| n.id() == node_id))
    }

    /// Whether the graph holds a node
    pub fn contains(&self, node_id: NodeId) -> bool {
        self.index_of(node_id).is_some()
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Whether the graph holds no live nodes
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Instantiate a node of a registered type and append it
    pub fn add_node(&mut self, type_id: &str) -> Result<NodeId, GraphError> {
        let node = self
            .node_types
            .create_node(type_id)
            .ok_or_else(|| GraphError::UnknownNodeType(type_id.to_string()))?;
        let id = self.insert(node);
        tracing::debug!("Added {} node {} to graph {}", type_id, id, self.id);
        Ok(id)
    }

    /// Append a connection-free duplicate of `original`.
    ///
    /// `original` may belong to any graph; only its type, name, position and
    /// port layout are carried over.
    pub fn copy_node(&mut self, original: &Node) -> NodeId {
        let id = self.insert(original.duplicate());
        tracing::debug!(
            "Copied {} node {} as {} in graph {}",
            original.node_type(),
            original.id(),
            id,
            self.id
        );
        id
    }

    /// Duplicate a node of this graph, see [`NodeGraph::copy_node`]
    pub fn duplicate_node(&mut self, node_id: NodeId) -> Result<NodeId, GraphError> {
        let original = self
            .node(node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?
            .duplicate();
        Ok(self.insert(original))
    }

    /// Remove a node and all its connections.
    ///
    /// The returned node is detached and has no links. Remaining nodes keep
    /// their relative order.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<Node, GraphError> {
        let index = self
            .index_of(node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let severed = self.sever(node_id);
        let mut node = self
            .nodes
            .remove(index)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.detach();
        tracing::debug!(
            "Removed node {} from graph {} ({} links severed)",
            node_id,
            self.id,
            severed
        );
        Ok(node)
    }

    /// Remove every node
    pub fn clear(&mut self) {
        let count = self.node_count();
        for node in self.nodes.iter_mut().flatten() {
            node.clear_connections();
            node.detach();
        }
        self.nodes.clear();
        if count > 0 {
            tracing::debug!("Cleared {} nodes from graph {}", count, self.id);
        }
    }

    /// Sever every connection of a node without removing it.
    ///
    /// Returns the number of links removed from the node's own ports.
    pub fn clear_node_connections(&mut self, node_id: NodeId) -> Result<usize, GraphError> {
        if !self.contains(node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        Ok(self.sever(node_id))
    }

    /// Connect an output port to an input port
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<(), ConnectionError> {
        let source_node = self
            .node(from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target_node = self
            .node(to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let source_port = source_node
            .port(from_port)
            .ok_or_else(|| ConnectionError::port_not_found(from_node, from_port))?;
        let target_port = target_node
            .port(to_port)
            .ok_or_else(|| ConnectionError::port_not_found(to_node, to_port))?;

        if source_port.direction != PortDirection::Output {
            return Err(ConnectionError::NotAnOutput(from_port.to_string()));
        }

        if !source_port.can_connect(target_port) {
            return Err(ConnectionError::IncompatiblePorts);
        }

        if source_port.is_linked_to(to_node, to_port) {
            return Err(ConnectionError::AlreadyConnected);
        }

        if !target_port.multi_connect && target_port.is_connected() {
            return Err(ConnectionError::PortAlreadyConnected(to_port.to_string()));
        }
        if !source_port.multi_connect && source_port.is_connected() {
            return Err(ConnectionError::PortAlreadyConnected(from_port.to_string()));
        }

        if let Some(port) = self.port_mut(from_node, from_port) {
            port.push_link(PortLink::new(to_node, to_port));
        }
        if let Some(port) = self.port_mut(to_node, to_port) {
            port.push_link(PortLink::new(from_node, from_port));
        }
        Ok(())
    }

    /// Remove a connection. Returns whether anything was removed.
    pub fn disconnect(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> bool {
        let forward = self
            .port_mut(from_node, from_port)
            .is_some_and(|p| p.remove_link(to_node, to_port));
        let backward = self
            .port_mut(to_node, to_port)
            .is_some_and(|p| p.remove_link(from_node, from_port));
        forward || backward
    }

    /// All connections, one per output-side link
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.nodes().flat_map(|node| {
            node.ports()
                .filter(|p| p.direction == PortDirection::Output)
                .flat_map(move |port| {
                    port.links().iter().map(move |link| {
                        Connection::new(node.id(), port.name.clone(), link.node, link.port.clone())
                    })
                })
        })
    }

    /// Get connections involving a node
    pub fn connections_for_node(&self, node_id: NodeId) -> impl Iterator<Item = Connection> + '_ {
        self.connections().filter(move |c| c.involves_node(node_id))
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections().count()
    }

    pub(crate) fn reassign_id(&mut self, id: GraphId) {
        for node in self.nodes.iter_mut().flatten() {
            node.attach_to(id.clone());
        }
        self.id = id;
    }

    fn port_mut(&mut self, node_id: NodeId, port: &str) -> Option<&mut Port> {
        self.node_mut(node_id).and_then(|n| n.port_mut(port))
    }

    fn insert(&mut self, mut node: Node) -> NodeId {
        // Constructors are untrusted: strip links and never reuse a live ID
        node.clear_connections();
        if self.contains(node.id()) {
            node.set_id(NodeId::new());
        }
        node.attach_to(self.id.clone());
        let id = node.id();
        self.nodes.push(Some(node));
        id
    }

    /// Drop every link to `node_id` from the whole graph, including the
    /// node's own ports.
    fn sever(&mut self, node_id: NodeId) -> usize {
        let mut own = 0;
        for node in self.nodes.iter_mut().flatten() {
            if node.id() == node_id {
                own = node.clear_connections();
            } else {
                for port in node.ports_mut() {
                    port.drop_links_to_node(node_id);
                }
            }
        }
        own
    }
}

/// Error during structural mutation
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No constructor registered for the type
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port '{port}' not found on node {node}")]
    PortNotFound {
        /// Node searched
        node: NodeId,
        /// Missing port name
        port: String,
    },

    /// Source port is not an output
    #[error("Port '{0}' is not an output")]
    NotAnOutput(String),

    /// Incompatible port types
    #[error("Incompatible port types")]
    IncompatiblePorts,

    /// Port does not accept another connection
    #[error("Port already connected: {0}")]
    PortAlreadyConnected(String),

    /// The two ports are already linked
    #[error("Ports are already connected")]
    AlreadyConnected,
}

impl ConnectionError {
    fn port_not_found(node: NodeId, port: &str) -> Self {
        Self::PortNotFound {
            node,
            port: port.to_string(),
        }
    }
}
