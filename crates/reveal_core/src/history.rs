//! Transition history
//!
//! An append-only, timestamp-ordered log of every reveal and reset. Entries
//! are never edited; the only removals are [`History::forget`] when an
//! element is cleaned and [`History::clear`] on destroy.

use rustc_hash::FxHashMap;

use crate::id::ElementId;
use crate::time::Timestamp;

/// Direction of a recorded transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Revealed,
    Reset,
}

/// One recorded transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub element: ElementId,
    pub direction: Direction,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping the log ordered
    ///
    /// A timestamp earlier than the last entry (a host clock that went
    /// backwards) is raised to the last entry's timestamp.
    pub fn append(&mut self, mut entry: HistoryEntry) -> HistoryEntry {
        if let Some(last) = self.entries.last() {
            if entry.timestamp < last.timestamp {
                tracing::warn!(
                    "History: clock went backwards ({} < {}), clamping",
                    entry.timestamp,
                    last.timestamp
                );
                entry.timestamp = last.timestamp;
            }
        }
        self.entries.push(entry);
        entry
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry for an element
    pub fn last_for(&self, element: ElementId) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.element == element)
    }

    /// Whether the element has ever been revealed
    pub fn has_revealed(&self, element: ElementId) -> bool {
        self.entries
            .iter()
            .any(|e| e.element == element && e.direction == Direction::Revealed)
    }

    /// Number of transitions of one direction recorded for an element
    pub fn count(&self, element: ElementId, direction: Direction) -> usize {
        self.entries
            .iter()
            .filter(|e| e.element == element && e.direction == direction)
            .count()
    }

    /// All entries for one element, oldest first
    pub fn for_element(&self, element: ElementId) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter().filter(move |e| e.element == element)
    }

    /// Drop every entry of a cleaned element
    pub fn forget(&mut self, element: ElementId) {
        self.entries.retain(|e| e.element != element);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Merge another log into this one, renaming its elements
    ///
    /// Entries whose element has no mapping are discarded. The result stays
    /// ordered by timestamp; ties keep this log's entries first.
    pub fn absorb(&mut self, other: History, remap: &FxHashMap<ElementId, ElementId>) {
        let incoming: Vec<HistoryEntry> = other
            .entries
            .into_iter()
            .filter_map(|e| {
                remap.get(&e.element).map(|&element| HistoryEntry { element, ..e })
            })
            .collect();
        if incoming.is_empty() {
            return;
        }

        let ours = std::mem::take(&mut self.entries);
        let mut merged = Vec::with_capacity(ours.len() + incoming.len());
        let mut a = ours.into_iter().peekable();
        let mut b = incoming.into_iter().peekable();
        loop {
            let take_ours = match (a.peek(), b.peek()) {
                (Some(x), Some(y)) => x.timestamp <= y.timestamp,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_ours { a.next() } else { b.next() };
            merged.extend(next);
        }
        self.entries = merged;
    }
}
