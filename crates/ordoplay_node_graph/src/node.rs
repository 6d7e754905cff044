// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and the type-tagged node factory.

use crate::graph::GraphId;
use crate::port::Port;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Entry points (events, parameters)
    Input,
    /// Sinks (results, side effects)
    Output,
    /// Math operations
    Math,
    /// Logic/flow control
    Logic,
    /// Utility nodes
    Utility,
    /// Custom/user-defined
    Custom,
}

/// Node type definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Default input ports
    pub inputs: Vec<Port>,
    /// Default output ports
    pub outputs: Vec<Port>,
}

impl NodeType {
    /// Create a type definition with no ports
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append an input port template
    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    /// Append an output port template
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }
}

/// A node instance in the graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    node_type: String,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the graph canvas
    pub position: [f32; 2],
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    graph: Option<GraphId>,
}

impl Node {
    /// Create a new, unattached node from a type definition
    pub fn new(node_type: &NodeType) -> Self {
        let mut node = Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            name: node_type.name.clone(),
            position: [0.0, 0.0],
            inputs: node_type.inputs.clone(),
            outputs: node_type.outputs.clone(),
            graph: None,
        };
        // Templates are plain data and may have been built with links
        node.clear_connections();
        node
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Instance ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Type ID this node was created from
    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    /// Identifier of the owning graph, if attached
    pub fn graph(&self) -> Option<&GraphId> {
        self.graph.as_ref()
    }

    /// Get an input port by index
    pub fn input(&self, index: usize) -> Option<&Port> {
        self.inputs.get(index)
    }

    /// Get an output port by index
    pub fn output(&self, index: usize) -> Option<&Port> {
        self.outputs.get(index)
    }

    /// Get a port by name
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports().find(|p| p.name == name)
    }

    /// All ports: inputs first, then outputs, in declaration order
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Total number of links across all ports
    pub fn connection_count(&self) -> usize {
        self.ports().map(Port::link_count).sum()
    }

    /// Whether any port of this node links to `node`
    pub fn references_node(&self, node: NodeId) -> bool {
        self.ports().any(|p| p.references_node(node))
    }

    /// Clone this node under a fresh ID.
    ///
    /// The duplicate is detached but still carries the original's links;
    /// callers must clear or redirect them before the node joins a graph.
    pub fn duplicate(&self) -> Self {
        let mut node = self.clone();
        node.id = NodeId::new();
        node.graph = None;
        node
    }

    pub(crate) fn port_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.ports_mut().find(|p| p.name == name)
    }

    pub(crate) fn ports_mut(&mut self) -> impl Iterator<Item = &mut Port> {
        self.inputs.iter_mut().chain(self.outputs.iter_mut())
    }

    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn attach_to(&mut self, graph: GraphId) {
        self.graph = Some(graph);
    }

    pub(crate) fn detach(&mut self) {
        self.graph = None;
    }

    /// Severs this node's own end of every connection. The graph is
    /// responsible for the far ends.
    pub(crate) fn clear_connections(&mut self) -> usize {
        self.ports_mut().map(Port::clear_links).sum()
    }
}

/// Constructor used to instantiate a registered node type
pub type NodeConstructor = Arc<dyn Fn(&NodeType) -> Node + Send + Sync>;

struct RegisteredType {
    definition: NodeType,
    constructor: NodeConstructor,
}

/// Registry of available node types, keyed by type ID
#[derive(Default)]
pub struct NodeRegistry {
    types: IndexMap<String, RegisteredType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type built from its port templates
    pub fn register(&mut self, node_type: NodeType) {
        self.register_with(node_type, Arc::new(Node::new));
    }

    /// Register a node type with a custom constructor.
    ///
    /// Replaces any previous registration under the same ID.
    pub fn register_with(&mut self, node_type: NodeType, constructor: NodeConstructor) {
        let id = node_type.id.clone();
        if self
            .types
            .insert(
                id.clone(),
                RegisteredType {
                    definition: node_type,
                    constructor,
                },
            )
            .is_some()
        {
            tracing::debug!("Replaced node type registration: {}", id);
        }
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id).map(|t| &t.definition)
    }

    /// Whether a type ID is registered
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values().map(|t| &t.definition)
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        self.types
            .get(type_id)
            .map(|t| (t.constructor)(&t.definition))
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{PortLink, PortType};

    fn math_add() -> NodeType {
        NodeType::new("add", "Add", NodeCategory::Math)
            .with_input(Port::input("A", PortType::Float))
            .with_input(Port::input("B", PortType::Float))
            .with_output(Port::output("Result", PortType::Float))
    }

    #[test]
    fn test_node_from_type() {
        let node = Node::new(&math_add()).with_position(10.0, 20.0);
        assert_eq!(node.node_type(), "add");
        assert_eq!(node.position, [10.0, 20.0]);
        assert!(node.graph().is_none());

        let names: Vec<_> = node.ports().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "Result"]);
        assert_eq!(node.input(1).map(|p| p.name.as_str()), Some("B"));
        assert_eq!(node.output(0).map(|p| p.name.as_str()), Some("Result"));
    }

    #[test]
    fn test_duplicate_keeps_links_under_new_id() {
        let mut node = Node::new(&math_add());
        let other = NodeId::new();
        node.port_mut("Result")
            .unwrap()
            .push_link(PortLink::new(other, "In"));
        node.attach_to(GraphId::generate());

        let dup = node.duplicate();
        assert_ne!(dup.id(), node.id());
        assert!(dup.graph().is_none());
        assert!(dup.references_node(other));

        let mut dup = dup;
        assert_eq!(dup.clear_connections(), 1);
        assert_eq!(dup.connection_count(), 0);
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = NodeRegistry::new();
        registry.register(math_add());
        registry.register(NodeType::new("print", "Print", NodeCategory::Output));

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("add"));
        assert_eq!(registry.types_in_category(NodeCategory::Math).count(), 1);
        assert!(registry.create_node("missing").is_none());

        let a = registry.create_node("add").unwrap();
        let b = registry.create_node("add").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_custom_constructor() {
        let mut registry = NodeRegistry::new();
        registry.register_with(
            math_add(),
            Arc::new(|t: &NodeType| Node::new(t).with_position(5.0, 5.0)),
        );

        let node = registry.create_node("add").unwrap();
        assert_eq!(node.position, [5.0, 5.0]);
    }
}
