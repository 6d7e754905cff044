// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph kinds and their required node types.
//!
//! A schema may name up to [`MAX_REQUIRED_NODE_TYPES`] node types that a
//! graph of that kind is expected to always contain. This is metadata only:
//! creating missing nodes or blocking their removal is up to the caller.

use serde::{Deserialize, Serialize};

/// Maximum number of required node types per schema
pub const MAX_REQUIRED_NODE_TYPES: usize = 3;

/// Describes a kind of graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Schema name
    pub name: String,
    pub(crate) required: Vec<String>,
}

impl GraphSchema {
    /// Create a schema with no required node types
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
        }
    }

    /// Declare a node type as required
    pub fn with_required(mut self, node_type: impl Into<String>) -> Result<Self, SchemaError> {
        let node_type = node_type.into();
        if self.required.contains(&node_type) {
            return Ok(self);
        }
        if self.required.len() >= MAX_REQUIRED_NODE_TYPES {
            return Err(SchemaError::TooManyRequiredTypes {
                schema: self.name,
                node_type,
            });
        }
        self.required.push(node_type);
        Ok(self)
    }

    /// Whether the schema requires `node_type`
    pub fn requires(&self, node_type: &str) -> bool {
        self.required.iter().any(|t| t == node_type)
    }

    /// Required node types in declaration order
    pub fn required(&self) -> &[String] {
        &self.required
    }
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when declaring a schema
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Too many required node types
    #[error("Schema '{schema}' cannot require '{node_type}': at most {max} required node types", max = MAX_REQUIRED_NODE_TYPES)]
    TooManyRequiredTypes {
        /// Schema name
        schema: String,
        /// Rejected type
        node_type: String,
    },
}
