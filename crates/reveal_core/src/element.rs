//! Element registry

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::config::RevealOptions;
use crate::host::ElementGeometry;
use crate::id::{ContainerId, ElementId, NodeId, SequenceId};
use crate::time::Timestamp;

/// Reveal status of an element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    #[default]
    Unrevealed,
    Revealed,
}

/// Inline styles generated for each state of an element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementStyles {
    /// Hidden, without a transition (applied at registration)
    pub initial: String,
    /// Revealed, transition without delay
    pub reveal_instant: String,
    /// Revealed, transition with the configured delay
    pub reveal_delayed: String,
    /// Hidden again, with a transition
    pub reset: String,
}

impl ElementStyles {
    pub fn revealed(&self, delayed: bool) -> &str {
        if delayed {
            &self.reveal_delayed
        } else {
            &self.reveal_instant
        }
    }
}

/// Registered state of one element
#[derive(Clone, Debug)]
pub struct ElementRecord {
    pub node: NodeId,
    pub options: RevealOptions,
    pub container: ContainerId,
    pub sequence: Option<SequenceId>,
    pub status: Status,
    pub last_transition: Option<Timestamp>,
    /// Cached geometry; `None` until measured or after invalidation
    pub geometry: Option<ElementGeometry>,
    /// Result of the most recent visibility evaluation
    pub visible: bool,
    pub styles: ElementStyles,
    /// Inline style the node had before registration
    pub original_style: String,
}

impl ElementRecord {
    pub fn new(
        node: NodeId,
        options: RevealOptions,
        container: ContainerId,
        original_style: String,
    ) -> Self {
        Self {
            node,
            options,
            container,
            sequence: None,
            status: Status::Unrevealed,
            last_transition: None,
            geometry: None,
            visible: false,
            styles: ElementStyles::default(),
            original_style,
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.status == Status::Revealed
    }

    /// One-shot elements stop being evaluated once revealed
    pub fn is_frozen(&self) -> bool {
        self.is_revealed() && !self.options.reset
    }
}

/// Element records keyed by [`ElementId`], indexed by node
#[derive(Debug, Default)]
pub struct ElementRegistry {
    records: SlotMap<ElementId, ElementRecord>,
    by_node: FxHashMap<NodeId, ElementId>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: ElementRecord) -> ElementId {
        let node = record.node;
        let id = self.records.insert(record);
        self.by_node.insert(node, id);
        id
    }

    pub fn remove(&mut self, id: ElementId) -> Option<ElementRecord> {
        let record = self.records.remove(id)?;
        self.by_node.remove(&record.node);
        Some(record)
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementRecord> {
        self.records.get_mut(id)
    }

    /// Element registered for a node
    pub fn find(&self, node: NodeId) -> Option<ElementId> {
        self.by_node.get(&node).copied()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &ElementRecord)> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<ElementId> {
        self.records.keys().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.by_node.clear();
    }
}
