// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph data model for `OrdoPlay` tools.
//!
//! This crate provides:
//! - Typed nodes connected through typed, named ports
//! - Structural mutation (add, copy, remove, clear) that never leaves
//!   dangling links behind
//! - Deep graph copy with connection redirection
//! - An identity registry resolving graphs by identifier
//!
//! ## Architecture
//!
//! A [`GraphRegistry`] owns the identifier-to-graph mapping and hands out
//! [`GraphHandle`]s. Each handle wraps one [`NodeGraph`], an ordered list of
//! [`Node`]s whose [`Port`]s store both ends of every connection. Copying
//! ([`copy::copy_graph`], [`GraphHandle::duplicate`]) duplicates all nodes
//! first and then rewrites every link through a [`NodeRemap`].

pub mod node;
pub mod port;
pub mod connection;
pub mod schema;
pub mod graph;
pub mod copy;
pub mod registry;
pub mod settings;
pub mod graphs;

pub use node::{Node, NodeCategory, NodeConstructor, NodeId, NodeRegistry, NodeType};
pub use port::{Port, PortDirection, PortLink, PortType};
pub use connection::Connection;
pub use schema::{GraphSchema, SchemaError, MAX_REQUIRED_NODE_TYPES};
pub use graph::{ConnectionError, GraphError, GraphId, NodeGraph};
pub use copy::{CopyError, NodeRemap};
pub use registry::{GraphHandle, GraphRegistry, RegistryError};
pub use settings::GraphSettings;
