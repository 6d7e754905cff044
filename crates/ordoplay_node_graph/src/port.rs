// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.
//!
//! A port stores its own end of every connection it takes part in. The graph
//! keeps both ends in sync, so link mutation is crate-internal.

use crate::copy::NodeRemap;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Data type that can flow through ports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortType {
    /// Execution flow
    Exec,
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// Color (RGBA)
    Color,
    /// Entity reference
    Entity,
    /// String value
    String,
    /// Any type (for generic nodes)
    Any,
    /// Custom type
    Custom(String),
}

impl PortType {
    /// Check if this type can connect to another type
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        // Any type can connect to anything
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        // Same types can always connect
        if self == other {
            return true;
        }

        // Implicit conversions
        match (self, other) {
            // Numeric conversions
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => true,
            // Vector conversions
            (Self::Float, Self::Vector2 | Self::Vector3 | Self::Vector4) => true,
            (Self::Vector2, Self::Vector3 | Self::Vector4) => true,
            (Self::Vector3, Self::Vector4) => true,
            // Color conversions
            (Self::Color, Self::Vector4) | (Self::Vector4, Self::Color) => true,
            // No other implicit conversions
            _ => false,
        }
    }
}

/// One end of a connection, as seen from the port holding it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortLink {
    /// Node on the far end
    pub node: NodeId,
    /// Port name on the far end
    pub port: String,
}

impl PortLink {
    /// Create a new link
    pub fn new(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

/// A port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Port name, unique within its node
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Whether multiple connections are allowed
    pub multi_connect: bool,
    links: Vec<PortLink>,
}

impl Port {
    /// Create a new port
    pub fn new(name: impl Into<String>, port_type: PortType, direction: PortDirection) -> Self {
        Self {
            name: name.into(),
            direction,
            port_type,
            // Outputs fan out by default
            multi_connect: direction == PortDirection::Output,
            links: Vec::new(),
        }
    }

    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name, port_type, PortDirection::Input)
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name, port_type, PortDirection::Output)
    }

    /// Override whether the port accepts more than one connection
    pub fn with_multi_connect(mut self, multi_connect: bool) -> Self {
        self.multi_connect = multi_connect;
        self
    }

    /// Check if a connection to another port is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        // Must be opposite directions
        if self.direction == other.direction {
            return false;
        }

        // Check type compatibility
        self.port_type.can_connect_to(&other.port_type)
    }

    /// Links held by this port, in connection order
    pub fn links(&self) -> &[PortLink] {
        &self.links
    }

    /// Whether the port has at least one connection
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// Number of connections on this port
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Whether this port is linked to `port` on `node`
    pub fn is_linked_to(&self, node: NodeId, port: &str) -> bool {
        self.links.iter().any(|l| l.node == node && l.port == port)
    }

    /// Whether any link on this port targets `node`
    pub fn references_node(&self, node: NodeId) -> bool {
        self.links.iter().any(|l| l.node == node)
    }

    /// Rewrite every link through `remap`.
    ///
    /// Links whose node has no entry in the mapping are dropped; the number
    /// of dropped links is returned.
    pub fn redirect(&mut self, remap: &NodeRemap) -> usize {
        let before = self.links.len();
        self.links = std::mem::take(&mut self.links)
            .into_iter()
            .filter_map(|link| {
                remap.get(link.node).map(|node| PortLink {
                    node,
                    port: link.port,
                })
            })
            .collect();
        before - self.links.len()
    }

    pub(crate) fn push_link(&mut self, link: PortLink) {
        self.links.push(link);
    }

    pub(crate) fn remove_link(&mut self, node: NodeId, port: &str) -> bool {
        let before = self.links.len();
        self.links.retain(|l| !(l.node == node && l.port == port));
        self.links.len() != before
    }

    pub(crate) fn drop_links_to_node(&mut self, node: NodeId) -> usize {
        let before = self.links.len();
        self.links.retain(|l| l.node != node);
        before - self.links.len()
    }

    pub(crate) fn clear_links(&mut self) -> usize {
        let count = self.links.len();
        self.links.clear();
        count
    }
}
