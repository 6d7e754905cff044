// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph identity registry and shared graph handles.
//!
//! A [`GraphRegistry`] maps identifiers to live graphs. It is an ordinary
//! value owned by the application and shared through `Arc`, so independent
//! registries can coexist (one per test, one per editor session, ...).
//!
//! Entries hold weak references: a graph whose last [`GraphHandle`] is
//! dropped stops resolving even if nobody tore it down explicitly, and its
//! entry is pruned on the next registration.

use crate::copy::{self, CopyError};
use crate::graph::{GraphId, NodeGraph};
use crate::node::NodeRegistry;
use crate::schema::GraphSchema;
use crate::settings::GraphSettings;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

type SharedGraph = Arc<RwLock<NodeGraph>>;

/// Process-wide mapping from graph identifier to graph instance
#[derive(Debug, Default)]
pub struct GraphRegistry {
    settings: GraphSettings,
    graphs: RwLock<HashMap<GraphId, Weak<RwLock<NodeGraph>>>>,
}

impl GraphRegistry {
    /// Create a registry with default settings
    pub fn new() -> Arc<Self> {
        Self::with_settings(GraphSettings::default())
    }

    /// Create a registry with the given settings
    pub fn with_settings(settings: GraphSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            graphs: RwLock::new(HashMap::new()),
        })
    }

    /// Registry settings
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Create and register an empty graph.
    ///
    /// An absent or empty `identifier` is replaced by a generated one. If the
    /// identifier is already taken by another live graph, fresh identifiers
    /// are generated until one registers.
    pub fn create(
        self: &Arc<Self>,
        schema: Arc<GraphSchema>,
        node_types: Arc<NodeRegistry>,
        identifier: Option<GraphId>,
    ) -> Result<GraphHandle, RegistryError> {
        let id = identifier
            .filter(|id| !id.is_empty())
            .unwrap_or_else(GraphId::generate);
        self.adopt(NodeGraph::new(id, schema, node_types))
    }

    /// Take ownership of a detached graph and register it
    pub(crate) fn adopt(self: &Arc<Self>, graph: NodeGraph) -> Result<GraphHandle, RegistryError> {
        let handle = GraphHandle {
            graph: Arc::new(RwLock::new(graph)),
            registry: Arc::clone(self),
        };
        self.register_with_retry(&handle)?;
        Ok(handle)
    }

    /// Register a handle under its graph's identifier.
    ///
    /// Returns `false` if the identifier maps to a different live graph.
    /// Registering the same graph again is a no-op that returns `true`.
    pub fn register(&self, handle: &GraphHandle) -> bool {
        let id = handle.id();
        self.try_insert(&id, &handle.graph)
    }

    /// Remove a handle's entry. Entries pointing at other graphs are left
    /// alone. Returns whether an entry was removed.
    pub fn unregister(&self, handle: &GraphHandle) -> bool {
        let id = handle.id();
        let mut graphs = self.graphs.write();
        let owned = graphs
            .get(&id)
            .is_some_and(|weak| points_to(weak, &handle.graph));
        if owned {
            graphs.remove(&id);
            tracing::info!("Unregistered graph {}", id);
        }
        owned
    }

    /// Look up a live graph by identifier
    pub fn resolve(self: &Arc<Self>, id: &GraphId) -> Result<GraphHandle, RegistryError> {
        let graph = self
            .graphs
            .read()
            .get(id)
            .and_then(Weak::upgrade)
            .ok_or_else(|| RegistryError::UnresolvedIdentifier(id.clone()))?;
        Ok(GraphHandle {
            graph,
            registry: Arc::clone(self),
        })
    }

    /// Whether `id` maps to a live graph
    pub fn contains(&self, id: &GraphId) -> bool {
        self.graphs
            .read()
            .get(id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Number of live graphs
    pub fn len(&self) -> usize {
        self.graphs
            .read()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether no live graph is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifiers of all live graphs, sorted
    pub fn ids(&self) -> Vec<GraphId> {
        let mut ids: Vec<_> = self
            .graphs
            .read()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Drop entries of graphs that no longer exist. Returns how many were
    /// removed.
    pub fn prune(&self) -> usize {
        let mut graphs = self.graphs.write();
        let before = graphs.len();
        graphs.retain(|_, weak| weak.strong_count() > 0);
        before - graphs.len()
    }

    fn register_with_retry(&self, handle: &GraphHandle) -> Result<(), RegistryError> {
        if self.settings.prune_on_register {
            let pruned = self.prune();
            if pruned > 0 {
                tracing::debug!("Pruned {} dead graph entries", pruned);
            }
        }

        let attempts = self.settings.registration_attempts();
        let mut id = handle.id();
        for attempt in 1..=attempts {
            if self.try_insert(&id, &handle.graph) {
                tracing::info!("Registered graph {}", id);
                return Ok(());
            }
            if attempt == attempts {
                break;
            }
            let fresh = GraphId::generate();
            tracing::warn!(
                "Graph identifier {} already in use, retrying as {}",
                id,
                fresh
            );
            handle.graph.write().reassign_id(fresh.clone());
            id = fresh;
        }
        Err(RegistryError::DuplicateIdentifier(id))
    }

    /// Atomic check-and-insert
    fn try_insert(&self, id: &GraphId, graph: &SharedGraph) -> bool {
        let mut graphs = self.graphs.write();
        if let Some(existing) = graphs.get(id) {
            if existing.strong_count() > 0 {
                return points_to(existing, graph);
            }
        }
        graphs.insert(id.clone(), Arc::downgrade(graph));
        true
    }
}

fn points_to(weak: &Weak<RwLock<NodeGraph>>, graph: &SharedGraph) -> bool {
    std::ptr::eq(weak.as_ptr(), Arc::as_ptr(graph))
}

/// Shared handle to a registered graph.
///
/// Clones refer to the same graph. Graph operations are not internally
/// synchronized; [`GraphHandle::write`] provides the exclusive access they
/// need.
#[derive(Debug, Clone)]
pub struct GraphHandle {
    graph: SharedGraph,
    registry: Arc<GraphRegistry>,
}

impl GraphHandle {
    /// Current graph identifier
    pub fn id(&self) -> GraphId {
        self.graph.read().id().clone()
    }

    /// Lock the graph for reading
    pub fn read(&self) -> RwLockReadGuard<'_, NodeGraph> {
        self.graph.read()
    }

    /// Lock the graph for mutation
    pub fn write(&self) -> RwLockWriteGuard<'_, NodeGraph> {
        self.graph.write()
    }

    /// Registry this graph belongs to
    pub fn registry(&self) -> &Arc<GraphRegistry> {
        &self.registry
    }

    /// Whether two handles refer to the same graph
    pub fn ptr_eq(&self, other: &GraphHandle) -> bool {
        Arc::ptr_eq(&self.graph, &other.graph)
    }

    /// Host activation hook: (re)register the graph under its identifier.
    ///
    /// Idempotent while the mapping still points at this graph.
    pub fn on_activate(&self) -> Result<(), RegistryError> {
        self.registry.register_with_retry(self)
    }

    /// Host teardown hook: remove every node, then unregister
    pub fn on_teardown(&self) {
        let id = {
            let mut graph = self.graph.write();
            graph.clear();
            graph.id().clone()
        };
        if !self.registry.unregister(self) {
            tracing::debug!("Graph {} was not registered at teardown", id);
        }
        tracing::debug!("Tore down graph {}", id);
    }

    /// Deep-copy the graph into a new registered graph with a fresh
    /// identifier
    pub fn duplicate(&self) -> Result<GraphHandle, CopyError> {
        let copy = {
            let source = self.graph.read();
            copy::copy_graph(&source, GraphId::generate())?
        };
        Ok(self.registry.adopt(copy)?)
    }
}

/// Error from the identity registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No free identifier could be registered
    #[error("Graph identifier already in use: {0}")]
    DuplicateIdentifier(GraphId),

    /// No live graph has the identifier
    #[error("No graph registered as {0}")]
    UnresolvedIdentifier(GraphId),
}
