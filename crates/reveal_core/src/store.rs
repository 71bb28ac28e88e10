//! The reveal store
//!
//! Owns every registry of one engine instance plus its history and the log
//! of registration calls replayed by `sync`. All structural changes go
//! through [`Store::register`], [`Store::unregister`] and [`Store::absorb`],
//! which keep the cross-references between registries consistent:
//!
//! - every element belongs to exactly one existing container
//! - every element belongs to at most one existing sequence
//! - every container and sequence has at least one member

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use crate::config::{RevealOptions, RevealOverrides};
use crate::container::{resolve_container, ContainerRecord, ContainerRegistry};
use crate::element::{ElementRecord, ElementRegistry};
use crate::error::{Result, RevealError};
use crate::history::History;
use crate::host::Host;
use crate::id::{ContainerId, ElementId, NodeId, SequenceId};
use crate::sequence::{SequenceRecord, SequenceRegistry};
use crate::target::Target;

/// A recorded `reveal` call, replayed by `sync`
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationRecord {
    pub target: Target,
    /// Instance defaults in effect when the call was made
    pub defaults: RevealOptions,
    pub overrides: RevealOverrides,
    pub sequence: Option<SequenceId>,
    /// Stagger interval, kept to recreate a dropped sequence
    pub interval: Option<u32>,
}

/// Outcome of registering one node
#[derive(Debug)]
pub struct Registered {
    pub id: ElementId,
    /// The node was not registered before
    pub created: bool,
    /// Non-fatal problems (container fallback)
    pub warnings: Vec<RevealError>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub elements: ElementRegistry,
    pub containers: ContainerRegistry,
    pub sequences: SequenceRegistry,
    pub history: History,
    registrations: Vec<RegistrationRecord>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`, or update its registration
    ///
    /// Options resolve as `defaults <- overrides` for new nodes and
    /// `existing options <- overrides` for registered ones. Invalid
    /// overrides leave the store untouched. Joining `sequence` moves the
    /// element out of any previous sequence; `None` keeps the current one.
    pub fn register(
        &mut self,
        node: NodeId,
        overrides: &RevealOverrides,
        defaults: &RevealOptions,
        sequence: Option<SequenceId>,
        host: &dyn Host,
    ) -> Result<Registered> {
        let existing = self.elements.find(node);
        let base = existing
            .and_then(|id| self.elements.get(id))
            .map(|record| &record.options)
            .unwrap_or(defaults);
        let options = base.merged(overrides)?;

        if let Some(sequence) = sequence {
            if !self.sequences.contains(sequence) {
                return Err(RevealError::invalid("sequence no longer exists"));
            }
        }

        let mut warnings = Vec::new();
        let (container_node, warning) = resolve_container(&options.container, host);
        warnings.extend(warning);
        let container = self.containers.ensure(container_node, host);

        let (id, created) = match existing {
            Some(id) => {
                self.update(id, options, container, sequence, host);
                (id, false)
            }
            None => {
                let original_style = host.inline_style(node);
                let mut record = ElementRecord::new(node, options, container, original_style);
                record.sequence = sequence;
                let id = self.elements.insert(record);
                if let Some(c) = self.containers.get_mut(container) {
                    c.elements.insert(id);
                    c.watching.insert(id);
                }
                if let Some(seq) = sequence.and_then(|s| self.sequences.get_mut(s)) {
                    seq.push(id);
                }
                (id, true)
            }
        };

        self.containers.mark_pending(container, false);
        Ok(Registered {
            id,
            created,
            warnings,
        })
    }

    fn update(
        &mut self,
        id: ElementId,
        options: RevealOptions,
        container: ContainerId,
        sequence: Option<SequenceId>,
        host: &dyn Host,
    ) {
        let Some(record) = self.elements.get_mut(id) else {
            return;
        };
        let old_container = record.container;
        let old_sequence = record.sequence;
        record.options = options;
        record.container = container;
        record.geometry = None;
        if sequence.is_some() {
            record.sequence = sequence;
        }
        let frozen = record.is_frozen();

        if old_container != container {
            if let Some(c) = self.containers.get_mut(old_container) {
                c.elements.shift_remove(&id);
                c.watching.shift_remove(&id);
            }
            self.containers.release(old_container, host);
        }
        if let Some(c) = self.containers.get_mut(container) {
            c.elements.insert(id);
            if frozen {
                c.watching.shift_remove(&id);
            } else {
                c.watching.insert(id);
            }
        }

        if let (Some(old), Some(new)) = (old_sequence, sequence) {
            if old != new {
                self.leave_sequence(old, id);
            }
        }
        if let Some(seq) = sequence.and_then(|s| self.sequences.get_mut(s)) {
            seq.push(id);
        }
    }

    fn leave_sequence(&mut self, sequence: SequenceId, id: ElementId) {
        let empty = match self.sequences.get_mut(sequence) {
            Some(seq) => {
                seq.remove(id);
                seq.members.is_empty()
            }
            None => false,
        };
        if empty {
            self.sequences.remove(sequence);
            tracing::debug!("Store: sequence {:?} emptied", sequence);
        }
    }

    /// Remove an element from every registry
    ///
    /// Empty containers are released and empty sequences dropped. History
    /// entries are kept; see [`History::forget`].
    pub fn unregister(&mut self, id: ElementId, host: &dyn Host) -> Option<ElementRecord> {
        let record = self.elements.remove(id)?;
        if let Some(c) = self.containers.get_mut(record.container) {
            c.elements.shift_remove(&id);
            c.watching.shift_remove(&id);
        }
        self.containers.release(record.container, host);
        if let Some(sequence) = record.sequence {
            self.leave_sequence(sequence, id);
        }
        Some(record)
    }

    /// Stop evaluating an element (one-shot, revealed)
    pub fn freeze(&mut self, id: ElementId) {
        if let Some(container) = self.elements.get(id).map(|r| r.container) {
            if let Some(c) = self.containers.get_mut(container) {
                c.watching.shift_remove(&id);
            }
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&ElementRecord> {
        self.elements.find(node).and_then(|id| self.elements.get(id))
    }

    /// Create a sequence with an already validated interval
    pub fn create_sequence(&mut self, interval: u32) -> SequenceId {
        self.sequences.create(interval)
    }

    /// Log a call; an identical earlier call moves to the end instead
    pub fn record_registration(&mut self, record: RegistrationRecord) {
        self.registrations.retain(|logged| *logged != record);
        self.registrations.push(record);
    }

    pub fn registrations(&self) -> &[RegistrationRecord] {
        &self.registrations
    }

    /// Point logged calls at a new sequence after the old one was dropped
    pub fn replace_logged_sequence(&mut self, old: SequenceId, new: SequenceId) {
        for record in &mut self.registrations {
            if record.sequence == Some(old) {
                record.sequence = Some(new);
            }
        }
    }

    /// Drop every record, unsubscribing all container listeners
    pub fn clear(&mut self, host: &dyn Host) {
        self.containers.clear(host);
        self.elements.clear();
        self.sequences.clear();
        self.history.clear();
        self.registrations.clear();
    }

    /// Move another store's records into this one
    ///
    /// Nodes registered in both keep this store's record. Containers
    /// observed by both keep this store's listener; the other listener is
    /// removed. Returns the mapping from the other store's element ids to
    /// their new ids.
    pub fn absorb(&mut self, other: Store, host: &dyn Host) -> FxHashMap<ElementId, ElementId> {
        let Store {
            elements: mut their_elements,
            containers: mut their_containers,
            sequences: mut their_sequences,
            history: their_history,
            registrations: their_registrations,
        } = other;

        let mut sequence_map: FxHashMap<SequenceId, SequenceId> = FxHashMap::default();
        let mut old_sequences = Vec::new();
        for (old_id, record) in their_sequences.drain() {
            let new_id = self.sequences.insert(SequenceRecord {
                members: Vec::new(),
                held: IndexSet::new(),
                timer: None,
                cursor: 0,
                ..record.clone()
            });
            sequence_map.insert(old_id, new_id);
            old_sequences.push((new_id, record));
        }

        let mut element_map: FxHashMap<ElementId, ElementId> = FxHashMap::default();
        for (_, container) in their_containers.drain() {
            let target = match self.containers.find(container.node) {
                Some(existing) => {
                    host.unlisten(container.listener);
                    existing
                }
                None => self.containers.insert_record(ContainerRecord {
                    elements: IndexSet::new(),
                    watching: IndexSet::new(),
                    ..container.clone()
                }),
            };

            for old_id in &container.elements {
                let Some(record) = their_elements.remove(*old_id) else {
                    continue;
                };
                if self.elements.find(record.node).is_some() {
                    tracing::debug!("Store: {:?} already registered, keeping ours", record.node);
                    continue;
                }
                let frozen = record.is_frozen();
                let sequence = record.sequence.and_then(|s| sequence_map.get(&s).copied());
                let new_id = self.elements.insert(ElementRecord {
                    container: target,
                    sequence,
                    ..record
                });
                if let Some(c) = self.containers.get_mut(target) {
                    c.elements.insert(new_id);
                    if !frozen {
                        c.watching.insert(new_id);
                    }
                }
                element_map.insert(*old_id, new_id);
            }

            if self
                .containers
                .get(target)
                .is_some_and(|c| c.elements.is_empty())
            {
                self.containers.release(target, host);
            } else {
                self.containers.mark_pending(target, true);
            }
        }

        for (new_id, old) in old_sequences {
            let mut members = Vec::with_capacity(old.members.len());
            let mut cursor = 0;
            for (index, member) in old.members.iter().enumerate() {
                if let Some(&mapped) = element_map.get(member) {
                    if index < old.cursor {
                        cursor += 1;
                    }
                    members.push(mapped);
                }
            }
            if members.is_empty() {
                self.sequences.remove(new_id);
                continue;
            }
            if let Some(seq) = self.sequences.get_mut(new_id) {
                seq.held = old
                    .held
                    .iter()
                    .filter_map(|m| element_map.get(m).copied())
                    .collect();
                seq.members = members;
                seq.cursor = cursor;
            }
        }

        self.history.absorb(their_history, &element_map);

        for mut record in their_registrations {
            record.sequence = record.sequence.and_then(|s| sequence_map.get(&s).copied());
            self.registrations.push(record);
        }

        element_map
    }

    /// Check cross-registry consistency, describing the first violation
    pub fn check_consistency(&self) -> std::result::Result<(), String> {
        for (id, record) in self.elements.iter() {
            let container = self
                .containers
                .get(record.container)
                .ok_or_else(|| format!("{id:?} points at a missing container"))?;
            if !container.elements.contains(&id) {
                return Err(format!("{id:?} missing from its container"));
            }
            if record.is_frozen() && container.watching.contains(&id) {
                return Err(format!("{id:?} is frozen but still watched"));
            }
            let memberships = self
                .sequences
                .iter()
                .filter(|(_, seq)| seq.contains(id))
                .count();
            match record.sequence {
                Some(seq) if !self.sequences.get(seq).is_some_and(|s| s.contains(id)) => {
                    return Err(format!("{id:?} missing from its sequence"));
                }
                None if memberships > 0 => {
                    return Err(format!("{id:?} is an unrecorded sequence member"));
                }
                _ if memberships > 1 => {
                    return Err(format!("{id:?} belongs to {memberships} sequences"));
                }
                _ => {}
            }
        }
        for (id, container) in self.containers.iter() {
            if container.elements.is_empty() {
                return Err(format!("{id:?} has no elements"));
            }
            if let Some(missing) = container.elements.iter().find(|e| !self.elements.contains(**e)) {
                return Err(format!("{id:?} lists missing element {missing:?}"));
            }
        }
        for (id, seq) in self.sequences.iter() {
            if seq.members.is_empty() {
                return Err(format!("{id:?} has no members"));
            }
            if seq.cursor > seq.members.len() {
                return Err(format!("{id:?} cursor out of range"));
            }
        }
        Ok(())
    }
}
