//! Sequence cursor maintenance shared by the scheduler and lifecycle

use reveal_core::element::ElementRegistry;
use reveal_core::id::SequenceId;
use reveal_core::sequence::SequenceRecord;
use reveal_core::store::Store;
use reveal_core::time::Timestamp;

use crate::timer::{TimerQueue, TimerTask};

/// Move the cursor past members that are already revealed
pub fn skip_revealed(sequence: &mut SequenceRecord, elements: &ElementRegistry) {
    while let Some(member) = sequence.cursor_member() {
        if elements.get(member).is_some_and(|r| r.is_revealed()) {
            sequence.advance();
        } else {
            break;
        }
    }
}

/// Advance after the cursor member revealed at `now`
///
/// If the new cursor member is already waiting in view, its step is
/// scheduled one interval later.
pub fn step(store: &mut Store, timers: &mut TimerQueue, id: SequenceId, now: Timestamp) {
    let elements = &store.elements;
    let Some(sequence) = store.sequences.get_mut(id) else {
        return;
    };
    sequence.advance();
    sequence.last_reveal = Some(now);
    skip_revealed(sequence, elements);
    schedule_held(sequence, timers, id, now);
}

/// Re-arm the sequence after its cursor member went away
pub fn resume(store: &mut Store, timers: &mut TimerQueue, id: SequenceId, now: Timestamp) {
    let elements = &store.elements;
    let Some(sequence) = store.sequences.get_mut(id) else {
        return;
    };
    if let Some(timer) = sequence.timer.take() {
        timers.cancel(timer);
    }
    skip_revealed(sequence, elements);
    schedule_held(sequence, timers, id, now);
}

/// Rewind the sequence if every reversible member is hidden again
///
/// One-shot members stay revealed and are skipped by the rewound cursor.
/// Returns true if the sequence was rewound.
pub fn rewind_if_settled(store: &mut Store, timers: &mut TimerQueue, id: SequenceId) -> bool {
    let elements = &store.elements;
    let Some(sequence) = store.sequences.get_mut(id) else {
        return false;
    };
    let settled = sequence
        .members
        .iter()
        .filter_map(|m| elements.get(*m))
        .filter(|r| r.options.reset)
        .all(|r| !r.is_revealed());
    if !settled {
        return false;
    }
    if let Some(timer) = sequence.timer.take() {
        timers.cancel(timer);
    }
    sequence.rewind();
    skip_revealed(sequence, elements);
    tracing::debug!("Sequence {:?} fully reset", id);
    true
}

fn schedule_held(
    sequence: &mut SequenceRecord,
    timers: &mut TimerQueue,
    id: SequenceId,
    now: Timestamp,
) {
    if sequence.timer.is_some() {
        return;
    }
    let Some(next) = sequence.cursor_member() else {
        return;
    };
    if !sequence.held.contains(&next) {
        return;
    }
    let at = sequence.next_allowed().map_or(now, |t| t.max(now));
    sequence.timer = Some(timers.schedule(at, TimerTask::SequenceStep(id)));
}
