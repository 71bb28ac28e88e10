//! Container registry
//!
//! One record per scroll container that has at least one registered element.
//! Records are created lazily on first use and released (listener removed)
//! as soon as their last element leaves.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::config::ContainerSpec;
use crate::error::RevealError;
use crate::host::{Host, Viewport};
use crate::id::{ContainerId, ElementId, ListenerHandle, NodeId};

#[derive(Clone, Debug)]
pub struct ContainerRecord {
    pub node: NodeId,
    /// Every element observed in this container, in registration order
    pub elements: IndexSet<ElementId>,
    /// Elements still eligible for evaluation (not frozen), in registration order
    pub watching: IndexSet<ElementId>,
    pub listener: ListenerHandle,
    /// Last measured viewport
    pub viewport: Option<Viewport>,
    /// A signal arrived since the last tick
    pub pending: bool,
    /// Element geometry must be re-measured
    pub stale: bool,
}

impl ContainerRecord {
    pub fn new(node: NodeId, listener: ListenerHandle) -> Self {
        Self {
            node,
            elements: IndexSet::new(),
            watching: IndexSet::new(),
            listener,
            viewport: None,
            pending: true,
            stale: true,
        }
    }
}

/// Container records in registration order
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    records: SlotMap<ContainerId, ContainerRecord>,
    order: Vec<ContainerId>,
    by_node: FxHashMap<NodeId, ContainerId>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing record for `node`, or a new one subscribed to its signals
    pub fn ensure(&mut self, node: NodeId, host: &dyn Host) -> ContainerId {
        if let Some(&id) = self.by_node.get(&node) {
            return id;
        }
        let listener = host.listen(node);
        tracing::debug!("ContainerRegistry: listening on {:?}", node);
        self.insert_record(ContainerRecord::new(node, listener))
    }

    /// Insert a prepared record (listener already attached)
    pub fn insert_record(&mut self, record: ContainerRecord) -> ContainerId {
        let node = record.node;
        let id = self.records.insert(record);
        self.order.push(id);
        self.by_node.insert(node, id);
        id
    }

    /// Unsubscribe and remove the record if it has no elements left
    ///
    /// Returns true if the record was removed.
    pub fn release(&mut self, id: ContainerId, host: &dyn Host) -> bool {
        match self.records.get(id) {
            Some(record) if record.elements.is_empty() => {}
            _ => return false,
        }
        if let Some(record) = self.records.remove(id) {
            host.unlisten(record.listener);
            self.by_node.remove(&record.node);
            self.order.retain(|&c| c != id);
            tracing::debug!("ContainerRegistry: released {:?}", record.node);
        }
        true
    }

    pub fn get(&self, id: ContainerId) -> Option<&ContainerRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut ContainerRecord> {
        self.records.get_mut(id)
    }

    pub fn find(&self, node: NodeId) -> Option<ContainerId> {
        self.by_node.get(&node).copied()
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Container ids in registration order
    pub fn ordered(&self) -> &[ContainerId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (ContainerId, &ContainerRecord)> {
        self.order
            .iter()
            .filter_map(|&id| self.records.get(id).map(|r| (id, r)))
    }

    /// Flag a container for evaluation on the next tick
    pub fn mark_pending(&mut self, id: ContainerId, stale: bool) {
        if let Some(record) = self.records.get_mut(id) {
            record.pending = true;
            record.stale |= stale;
        }
    }

    /// Flag every container for evaluation on the next tick
    pub fn mark_all(&mut self, stale: bool) {
        for record in self.records.values_mut() {
            record.pending = true;
            record.stale |= stale;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.records.values().any(|r| r.pending)
    }

    /// Remove every record in registration order, leaving listeners attached
    pub fn drain(&mut self) -> Vec<(ContainerId, ContainerRecord)> {
        self.by_node.clear();
        let order = std::mem::take(&mut self.order);
        order
            .into_iter()
            .filter_map(|id| self.records.remove(id).map(|r| (id, r)))
            .collect()
    }

    /// Unsubscribe and remove every record
    pub fn clear(&mut self, host: &dyn Host) {
        for (_, record) in self.drain() {
            host.unlisten(record.listener);
        }
        self.records.clear();
    }
}

/// Resolve a container option to a node
///
/// A selector that matches nothing falls back to the root container and
/// reports [`RevealError::MissingContainer`].
pub fn resolve_container(spec: &ContainerSpec, host: &dyn Host) -> (NodeId, Option<RevealError>) {
    match spec {
        ContainerSpec::Root => (host.root(), None),
        ContainerSpec::Node(node) if host.is_attached(*node) => (*node, None),
        ContainerSpec::Node(node) => {
            let error = RevealError::MissingContainer(format!("{node:?} is not attached"));
            tracing::warn!("{}; falling back to the root container", error);
            (host.root(), Some(error))
        }
        ContainerSpec::Selector(selector) => match host.query(selector).first() {
            Some(&node) => (node, None),
            None => {
                let error = RevealError::MissingContainer(format!("`{selector}` matched nothing"));
                tracing::warn!("{}; falling back to the root container", error);
                (host.root(), Some(error))
            }
        },
    }
}
