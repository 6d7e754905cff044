// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) view over port links.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// A connection between an output port and an input port.
///
/// Connections are not stored separately; they are derived from the
/// output-side links of each node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Source node ID
    pub from_node: NodeId,
    /// Source (output) port name
    pub from_port: String,
    /// Target node ID
    pub to_node: NodeId,
    /// Target (input) port name
    pub to_port: String,
}

impl Connection {
    /// Create a new connection
    pub fn new(
        from_node: NodeId,
        from_port: impl Into<String>,
        to_node: NodeId,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            from_node,
            from_port: from_port.into(),
            to_node,
            to_port: to_port.into(),
        }
    }

    /// Check if this connection involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Whether both ends sit on the same node
    pub fn is_self_connection(&self) -> bool {
        self.from_node == self.to_node
    }
}
