//! Cancelable timers on the host clock
//!
//! The engine has no thread of its own: timers are only fired from a tick,
//! and the instance asks the host to wake it at [`TimerQueue::next_deadline`].

use reveal_core::id::{ElementId, SequenceId, TimerId};
use reveal_core::time::Timestamp;
use slotmap::SlotMap;
use smallvec::SmallVec;

/// Work attached to a timer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTask {
    /// Reveal the next cursor member of a sequence
    SequenceStep(SequenceId),
    /// Clean a one-shot element after its reveal transition finished
    Cleanup(ElementId),
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    deadline: Timestamp,
    /// Insertion order, breaks deadline ties
    order: u64,
    task: TimerTask,
}

/// Due timers returned by one poll
pub type DueTimers = SmallVec<[(TimerId, TimerTask); 4]>;

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: SlotMap<TimerId, Timer>,
    next_order: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Timestamp, task: TimerTask) -> TimerId {
        let order = self.next_order;
        self.next_order += 1;
        tracing::debug!("TimerQueue: {:?} at {}", task, deadline);
        self.timers.insert(Timer {
            deadline,
            order,
            task,
        })
    }

    /// Cancel a timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Cancel every timer whose task matches
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&TimerTask) -> bool) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| !predicate(&timer.task));
        before - self.timers.len()
    }

    pub fn deadline(&self, id: TimerId) -> Option<Timestamp> {
        self.timers.get(id).map(|t| t.deadline)
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Remove and return every timer due at `now`, in deadline order
    pub fn take_due(&mut self, now: Timestamp) -> DueTimers {
        let mut due: SmallVec<[(TimerId, Timer); 4]> = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .map(|(id, t)| (id, *t))
            .collect();
        due.sort_by_key(|(_, t)| (t.deadline, t.order));
        for (id, _) in &due {
            self.timers.remove(*id);
        }
        due.into_iter().map(|(id, t)| (id, t.task)).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequences(n: usize) -> Vec<SequenceId> {
        let mut map: SlotMap<SequenceId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_due_timers_come_out_in_deadline_order() {
        let seqs = sequences(3);
        let mut queue = TimerQueue::new();
        queue.schedule(Timestamp::from_millis(300), TimerTask::SequenceStep(seqs[0]));
        queue.schedule(Timestamp::from_millis(100), TimerTask::SequenceStep(seqs[1]));
        queue.schedule(Timestamp::from_millis(900), TimerTask::SequenceStep(seqs[2]));

        assert_eq!(queue.next_deadline(), Some(Timestamp::from_millis(100)));

        let due = queue.take_due(Timestamp::from_millis(300));
        let tasks: Vec<TimerTask> = due.iter().map(|(_, task)| *task).collect();
        assert_eq!(
            tasks,
            vec![
                TimerTask::SequenceStep(seqs[1]),
                TimerTask::SequenceStep(seqs[0])
            ]
        );
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_deadline(), Some(Timestamp::from_millis(900)));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let seqs = sequences(2);
        let mut queue = TimerQueue::new();
        let at = Timestamp::from_millis(50);
        queue.schedule(at, TimerTask::SequenceStep(seqs[1]));
        queue.schedule(at, TimerTask::SequenceStep(seqs[0]));

        let due = queue.take_due(at);
        assert_eq!(due[0].1, TimerTask::SequenceStep(seqs[1]));
        assert_eq!(due[1].1, TimerTask::SequenceStep(seqs[0]));
    }

    #[test]
    fn test_cancel() {
        let seqs = sequences(2);
        let mut queue = TimerQueue::new();
        let id = queue.schedule(Timestamp::from_millis(10), TimerTask::SequenceStep(seqs[0]));
        queue.schedule(Timestamp::from_millis(20), TimerTask::SequenceStep(seqs[1]));

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(
            queue.cancel_where(|task| *task == TimerTask::SequenceStep(seqs[1])),
            1
        );
        assert!(queue.is_empty());
        assert!(queue.take_due(Timestamp::from_millis(100)).is_empty());
    }
}
