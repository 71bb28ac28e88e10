//! Reveal scheduler
//!
//! Runs one tick per animation frame. A tick has two phases:
//!
//! 1. **Plan** (state borrowed): rinse detached nodes if a mutation was
//!    signalled, evaluate every pending container in registration order,
//!    then collect due timers in deadline order. Planning only decides
//!    which transitions to attempt; it never writes styles or history.
//! 2. **Commit** (one step at a time): run the `before*` hook with no borrow
//!    held, re-validate the step against current state, apply the style and
//!    append history, then run the `after*` hook.
//!
//! Hooks may call back into the instance. A frame requested from inside a
//! hook is delivered by the host after the tick; nested ticks are refused.

use std::rc::Rc;

use reveal_core::container::ContainerRecord;
use reveal_core::element::Status;
use reveal_core::error::{HookKind, RevealError};
use reveal_core::history::{Direction, HistoryEntry};
use reveal_core::hooks::{Flow, Hook};
use reveal_core::host::{Host, Viewport};
use reveal_core::id::{ContainerId, ElementId, NodeId, SequenceId, TimerId};
use reveal_core::store::Store;
use reveal_core::time::Timestamp;
use reveal_core::visibility::{is_in_view, Trigger};

use crate::hooks::invoke;
use crate::lifecycle;
use crate::sequencing;
use crate::state::{RevealState, SharedState};
use crate::timer::{TimerQueue, TimerTask};

/// What one tick did
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub revealed: Vec<NodeId>,
    pub reset: Vec<NodeId>,
    /// Transitions aborted by a `before*` hook
    pub cancelled: Vec<NodeId>,
    /// Elements removed by cleanup timers or rinsing
    pub cleaned: Vec<NodeId>,
    pub errors: Vec<RevealError>,
    /// Elements whose visibility was evaluated
    pub evaluated: usize,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
            && self.reset.is_empty()
            && self.cancelled.is_empty()
            && self.cleaned.is_empty()
            && self.errors.is_empty()
    }
}

/// A transition decided during planning
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    /// `advance` is set when the reveal moves a sequence cursor
    Reveal {
        element: ElementId,
        advance: Option<SequenceId>,
    },
    Reset {
        element: ElementId,
    },
    Cleanup {
        element: ElementId,
    },
}

#[derive(Clone)]
pub struct RevealScheduler {
    host: Rc<dyn Host>,
}

impl RevealScheduler {
    pub fn new(host: Rc<dyn Host>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    /// Run one tick against `state`
    pub fn tick(&self, state: &SharedState) -> TickReport {
        let mut report = TickReport::default();
        let now = self.host.now();

        let steps = {
            let Ok(mut guard) = state.try_borrow_mut() else {
                tracing::warn!("RevealScheduler: state busy, tick skipped");
                return report;
            };
            let s = &mut *guard;
            if s.destroyed || s.in_tick {
                return report;
            }
            s.in_tick = true;
            s.frame_requested = false;

            if s.needs_rinse {
                report.cleaned.extend(lifecycle::rinse(s, self.host()));
            }
            self.plan(s, now, &mut report)
        };

        for step in steps {
            match step {
                Step::Reveal { element, advance } => {
                    self.commit_reveal(state, element, advance, now, &mut report)
                }
                Step::Reset { element } => self.commit_reset(state, element, now, &mut report),
                Step::Cleanup { element } => self.commit_cleanup(state, element, &mut report),
            }
        }

        let mut s = state.borrow_mut();
        s.in_tick = false;
        if !s.destroyed {
            s.pristine = false;
            if let Some(at) = s.timers.next_deadline() {
                self.host.request_wake(at);
            }
        }
        tracing::trace!(
            "RevealScheduler: evaluated {}, revealed {}, reset {}",
            report.evaluated,
            report.revealed.len(),
            report.reset.len()
        );
        report
    }

    fn plan(&self, s: &mut RevealState, now: Timestamp, report: &mut TickReport) -> Vec<Step> {
        let mut steps = Vec::new();
        let RevealState { store, timers, .. } = s;

        let containers: Vec<ContainerId> = store.containers.ordered().to_vec();
        for id in containers {
            let Some(container) = store.containers.get_mut(id) else {
                continue;
            };
            if !container.pending {
                continue;
            }
            container.pending = false;
            let Some(viewport) = self.host.viewport(container.node) else {
                tracing::debug!("RevealScheduler: no viewport for {:?}", container.node);
                continue;
            };
            container.viewport = Some(viewport);
            let stale = std::mem::take(&mut container.stale);
            let (node, watching) = snapshot(container);

            for element in watching {
                report.evaluated += 1;
                self.evaluate(store, timers, element, node, &viewport, stale, now, &mut steps);
            }
        }

        for (timer, task) in timers.take_due(now) {
            match task {
                TimerTask::SequenceStep(sequence) => {
                    self.fire_step(store, sequence, timer, &mut steps)
                }
                TimerTask::Cleanup(element) => steps.push(Step::Cleanup { element }),
            }
        }
        steps
    }

    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        store: &mut Store,
        timers: &mut TimerQueue,
        id: ElementId,
        container: NodeId,
        viewport: &Viewport,
        stale: bool,
        now: Timestamp,
        steps: &mut Vec<Step>,
    ) {
        let Some(record) = store.elements.get_mut(id) else {
            return;
        };
        if stale || record.geometry.is_none() {
            record.geometry = self.host.geometry(record.node, container);
        }
        let visible = record
            .geometry
            .is_some_and(|g| is_in_view(&g, viewport, &Trigger::from(&record.options)));
        record.visible = visible;
        let reversible = record.options.reset;

        match (record.status, visible, record.sequence) {
            (Status::Unrevealed, true, None) => steps.push(Step::Reveal {
                element: id,
                advance: None,
            }),
            (Status::Unrevealed, true, Some(sequence)) => {
                gate(store, timers, sequence, id, now, steps)
            }
            (Status::Unrevealed, false, Some(sequence)) => {
                if let Some(seq) = store.sequences.get_mut(sequence) {
                    seq.held.shift_remove(&id);
                }
            }
            (Status::Revealed, false, _) if reversible => {
                steps.push(Step::Reset { element: id })
            }
            _ => {}
        }
    }

    fn fire_step(&self, store: &mut Store, id: SequenceId, timer: TimerId, steps: &mut Vec<Step>) {
        let Some(sequence) = store.sequences.get_mut(id) else {
            return;
        };
        if sequence.timer != Some(timer) {
            return;
        }
        sequence.timer = None;
        let Some(member) = sequence.cursor_member() else {
            return;
        };
        let Some(record) = store.elements.get(member) else {
            return;
        };
        if record.is_revealed() {
            return;
        }

        if record.options.recheck_sequence {
            let viewport = store
                .containers
                .get(record.container)
                .and_then(|c| self.host.viewport(c.node));
            let visible = match (record.geometry, viewport) {
                (Some(g), Some(v)) => is_in_view(&g, &v, &Trigger::from(&record.options)),
                _ => false,
            };
            if !visible {
                sequence.held.shift_remove(&member);
                tracing::debug!("Sequence {:?}: {:?} left view before its step", id, member);
                return;
            }
        }

        steps.push(Step::Reveal {
            element: member,
            advance: Some(id),
        });
    }

    fn commit_reveal(
        &self,
        state: &SharedState,
        element: ElementId,
        advance: Option<SequenceId>,
        now: Timestamp,
        report: &mut TickReport,
    ) {
        let Some((node, before)) = prepare(state, element, HookKind::BeforeReveal) else {
            return;
        };
        if !self.run_before(before, HookKind::BeforeReveal, node, report) {
            return;
        }

        let after = {
            let mut guard = state.borrow_mut();
            match apply_reveal(&mut guard, self.host(), element, advance, now) {
                Some(after) => after,
                None => return,
            }
        };
        report.revealed.push(node);

        if let Err(e) = invoke(after.as_ref(), HookKind::AfterReveal, node) {
            report.errors.push(e);
        }
    }

    fn commit_reset(
        &self,
        state: &SharedState,
        element: ElementId,
        now: Timestamp,
        report: &mut TickReport,
    ) {
        let Some((node, before)) = prepare(state, element, HookKind::BeforeReset) else {
            return;
        };
        if !self.run_before(before, HookKind::BeforeReset, node, report) {
            return;
        }

        let after = {
            let mut guard = state.borrow_mut();
            match apply_reset(&mut guard, self.host(), element, now) {
                Some(after) => after,
                None => return,
            }
        };
        report.reset.push(node);

        if let Err(e) = invoke(after.as_ref(), HookKind::AfterReset, node) {
            report.errors.push(e);
        }
    }

    fn commit_cleanup(&self, state: &SharedState, element: ElementId, report: &mut TickReport) {
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        if s.destroyed {
            return;
        }
        let eligible = s
            .store
            .elements
            .get(element)
            .is_some_and(|r| r.is_frozen() && r.options.cleanup);
        if !eligible {
            return;
        }
        if let Some(node) = lifecycle::clean_element(s, element, self.host(), true) {
            report.cleaned.push(node);
        }
    }

    /// Run a `before*` hook; false means the transition was cancelled
    fn run_before(
        &self,
        hook: Option<Hook>,
        kind: HookKind,
        node: NodeId,
        report: &mut TickReport,
    ) -> bool {
        match invoke(hook.as_ref(), kind, node) {
            Ok(Flow::Continue) => true,
            Ok(Flow::Cancel) => {
                tracing::debug!("RevealScheduler: {} cancelled {:?}", kind, node);
                report.cancelled.push(node);
                false
            }
            Err(e) => {
                report.errors.push(e);
                true
            }
        }
    }
}

fn snapshot(container: &ContainerRecord) -> (NodeId, Vec<ElementId>) {
    (container.node, container.watching.iter().copied().collect())
}

/// Decide whether an in-view sequence member may reveal now
fn gate(
    store: &mut Store,
    timers: &mut TimerQueue,
    id: SequenceId,
    element: ElementId,
    now: Timestamp,
    steps: &mut Vec<Step>,
) {
    let Some(sequence) = store.sequences.get_mut(id) else {
        steps.push(Step::Reveal {
            element,
            advance: None,
        });
        return;
    };
    let Some(position) = sequence.position(element) else {
        return;
    };

    // Behind the cursor: a reset member coming back, not a new step
    if position < sequence.cursor {
        steps.push(Step::Reveal {
            element,
            advance: None,
        });
        return;
    }

    sequence.held.insert(element);
    if position > sequence.cursor || sequence.timer.is_some() {
        return;
    }
    match sequence.next_allowed() {
        Some(at) if at > now => {
            sequence.timer = Some(timers.schedule(at, TimerTask::SequenceStep(id)));
        }
        _ => steps.push(Step::Reveal {
            element,
            advance: Some(id),
        }),
    }
}

/// Node and hook for a step, if the element still exists
fn prepare(state: &SharedState, element: ElementId, kind: HookKind) -> Option<(NodeId, Option<Hook>)> {
    let s = state.borrow();
    if s.destroyed {
        return None;
    }
    let record = s.store.elements.get(element)?;
    Some((record.node, record.options.hooks.get(kind).cloned()))
}

/// Apply a planned reveal; returns the `afterReveal` hook on success
fn apply_reveal(
    s: &mut RevealState,
    host: &dyn Host,
    element: ElementId,
    advance: Option<SequenceId>,
    now: Timestamp,
) -> Option<Option<Hook>> {
    if s.destroyed {
        return None;
    }
    let pristine = s.pristine;
    let RevealState { store, timers, .. } = s;

    let record = store.elements.get(element)?;
    if record.is_revealed() {
        return None;
    }
    let member_of = record.sequence;
    match (advance, member_of) {
        (Some(sequence), _) => {
            let cursor = store.sequences.get(sequence).and_then(|q| q.cursor_member());
            if cursor != Some(element) {
                return None;
            }
        }
        // Planned behind the cursor; a reset earlier in this tick may have
        // rewound the sequence since
        (None, Some(sequence)) => {
            if let Some(seq) = store.sequences.get_mut(sequence) {
                let behind = seq.position(element).is_some_and(|p| p < seq.cursor);
                if !behind {
                    seq.held.insert(element);
                    sequencing::resume(store, timers, sequence, now);
                    tracing::debug!("RevealScheduler: {:?} waits for the rewound cursor", element);
                    return None;
                }
            }
        }
        (None, None) => {}
    }

    let record = store.elements.get(element)?;
    let first_reveal = !store.history.has_revealed(element);
    let delayed = record.options.delay > 0
        && record.options.use_delay.applies(first_reveal, pristine);
    host.set_style(record.node, record.styles.revealed(delayed));

    let record = store.elements.get_mut(element)?;
    record.status = Status::Revealed;
    record.last_transition = Some(now);
    let node = record.node;
    let frozen = record.is_frozen();
    let cleanup_after =
        (frozen && record.options.cleanup).then(|| record.options.transition_time(delayed));
    let after = record.options.hooks.after_reveal.clone();

    store.history.append(HistoryEntry {
        element,
        direction: Direction::Revealed,
        timestamp: now,
    });
    if frozen {
        store.freeze(element);
    }
    if let Some(sequence) = advance {
        sequencing::step(store, timers, sequence, now);
    }
    if let Some(ms) = cleanup_after {
        timers.schedule(now.after(ms), TimerTask::Cleanup(element));
    }

    tracing::debug!("RevealScheduler: revealed {:?} (delayed: {})", node, delayed);
    Some(after)
}

/// Apply a planned reset; returns the `afterReset` hook on success
fn apply_reset(
    s: &mut RevealState,
    host: &dyn Host,
    element: ElementId,
    now: Timestamp,
) -> Option<Option<Hook>> {
    if s.destroyed {
        return None;
    }
    let RevealState { store, timers, .. } = s;

    let record = store.elements.get_mut(element)?;
    if !record.is_revealed() || !record.options.reset {
        return None;
    }
    host.set_style(record.node, &record.styles.reset);
    record.status = Status::Unrevealed;
    record.last_transition = Some(now);
    let node = record.node;
    let sequence = record.sequence;
    let after = record.options.hooks.after_reset.clone();

    store.history.append(HistoryEntry {
        element,
        direction: Direction::Reset,
        timestamp: now,
    });
    if let Some(sequence) = sequence {
        sequencing::rewind_if_settled(store, timers, sequence);
    }

    tracing::debug!("RevealScheduler: reset {:?}", node);
    Some(after)
}
