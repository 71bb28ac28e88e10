//! Sequence tracker
//!
//! A sequence reveals its members one at a time, in registration order, with
//! a fixed stagger interval between consecutive reveals. The cursor only
//! moves forward while revealing and is rewound to zero by a full reset.

use indexmap::IndexSet;
use slotmap::SlotMap;

use crate::id::{ElementId, SequenceId, TimerId};
use crate::time::Timestamp;

#[derive(Clone, Debug)]
pub struct SequenceRecord {
    /// Members in registration order
    pub members: Vec<ElementId>,
    /// Index of the next member eligible to reveal
    pub cursor: usize,
    /// Stagger interval (ms)
    pub interval: u32,
    /// In-view members waiting for the cursor to reach them
    pub held: IndexSet<ElementId>,
    /// Pending timer for the next staggered step
    pub timer: Option<TimerId>,
    /// When the most recent cursor reveal happened
    pub last_reveal: Option<Timestamp>,
}

impl SequenceRecord {
    pub fn new(interval: u32) -> Self {
        Self {
            members: Vec::new(),
            cursor: 0,
            interval,
            held: IndexSet::new(),
            timer: None,
            last_reveal: None,
        }
    }

    pub fn cursor_member(&self) -> Option<ElementId> {
        self.members.get(self.cursor).copied()
    }

    pub fn position(&self, element: ElementId) -> Option<usize> {
        self.members.iter().position(|&m| m == element)
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.members.contains(&element)
    }

    /// Move past the current cursor member
    pub fn advance(&mut self) {
        if self.cursor < self.members.len() {
            let passed = self.members[self.cursor];
            self.held.shift_remove(&passed);
            self.cursor += 1;
        }
    }

    /// Full reset: start over from the first member
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.held.clear();
        self.last_reveal = None;
    }

    /// Every member has been passed by the cursor
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.members.len()
    }

    pub fn push(&mut self, element: ElementId) {
        if !self.contains(element) {
            self.members.push(element);
        }
    }

    /// Drop a member, keeping the cursor on the same logical member
    pub fn remove(&mut self, element: ElementId) -> bool {
        let Some(index) = self.position(element) else {
            return false;
        };
        self.members.remove(index);
        self.held.shift_remove(&element);
        if index < self.cursor {
            self.cursor -= 1;
        }
        true
    }

    /// Earliest time the next cursor member may reveal
    pub fn next_allowed(&self) -> Option<Timestamp> {
        self.last_reveal.map(|t| t.after(self.interval))
    }
}

#[derive(Debug, Default)]
pub struct SequenceRegistry {
    records: SlotMap<SequenceId, SequenceRecord>,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, interval: u32) -> SequenceId {
        self.records.insert(SequenceRecord::new(interval))
    }

    pub fn insert(&mut self, record: SequenceRecord) -> SequenceId {
        self.records.insert(record)
    }

    pub fn remove(&mut self, id: SequenceId) -> Option<SequenceRecord> {
        self.records.remove(id)
    }

    pub fn get(&self, id: SequenceId) -> Option<&SequenceRecord> {
        self.records.get(id)
    }

    pub fn get_mut(&mut self, id: SequenceId) -> Option<&mut SequenceRecord> {
        self.records.get_mut(id)
    }

    pub fn contains(&self, id: SequenceId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SequenceId, &SequenceRecord)> {
        self.records.iter()
    }

    pub fn drain(&mut self) -> Vec<(SequenceId, SequenceRecord)> {
        self.records.drain().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<ElementId> {
        let mut map: SlotMap<ElementId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_cursor_walks_in_registration_order() {
        let ids = ids(3);
        let mut seq = SequenceRecord::new(200);
        for &id in &ids {
            seq.push(id);
        }

        assert_eq!(seq.cursor_member(), Some(ids[0]));
        seq.advance();
        assert_eq!(seq.cursor_member(), Some(ids[1]));
        seq.advance();
        seq.advance();
        assert!(seq.is_exhausted());
        assert_eq!(seq.cursor_member(), None);

        // Advancing past the end is a no-op
        seq.advance();
        assert_eq!(seq.cursor, 3);

        seq.rewind();
        assert_eq!(seq.cursor_member(), Some(ids[0]));
    }

    #[test]
    fn test_push_ignores_duplicates() {
        let ids = ids(1);
        let mut seq = SequenceRecord::new(100);
        seq.push(ids[0]);
        seq.push(ids[0]);
        assert_eq!(seq.members.len(), 1);
    }

    #[test]
    fn test_remove_before_cursor_keeps_cursor_member() {
        let ids = ids(3);
        let mut seq = SequenceRecord::new(100);
        for &id in &ids {
            seq.push(id);
        }
        seq.advance();
        seq.advance();
        assert_eq!(seq.cursor_member(), Some(ids[2]));

        assert!(seq.remove(ids[0]));
        assert_eq!(seq.cursor_member(), Some(ids[2]));
        assert!(!seq.remove(ids[0]));
    }

    #[test]
    fn test_next_allowed_respects_interval() {
        let mut seq = SequenceRecord::new(250);
        assert_eq!(seq.next_allowed(), None);
        seq.last_reveal = Some(Timestamp::from_millis(1000));
        assert_eq!(seq.next_allowed(), Some(Timestamp::from_millis(1250)));
    }
}
