//! An active engine instance

use std::cell::RefCell;
use std::rc::Rc;

use reveal_animation::lifecycle;
use reveal_animation::state::resolve;
use reveal_animation::{Presenter, RevealScheduler, RevealState, SharedState, TickReport};
use reveal_core::config::{validate_interval, RevealOptions, RevealOverrides};
use reveal_core::element::Status;
use reveal_core::error::RevealError;
use reveal_core::history::Direction;
use reveal_core::host::{Host, Signal};
use reveal_core::id::NodeId;
use reveal_core::store::RegistrationRecord;
use reveal_core::target::Target;
use reveal_core::time::Timestamp;

use crate::registration::{self, Mode, Registration, Request};

/// A recorded transition, keyed by host node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub node: NodeId,
    pub direction: Direction,
    pub timestamp: Timestamp,
}

/// Registry sizes of an instance's store
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub elements: usize,
    pub containers: usize,
    pub sequences: usize,
    pub history: usize,
    pub timers: usize,
}

/// The engine behind an active [`crate::ScrollReveal`]
pub struct Instance {
    host: Rc<dyn Host>,
    /// May be replaced when this instance delegates to another
    state: RefCell<SharedState>,
    defaults: RevealOptions,
    presenter: Rc<dyn Presenter>,
    scheduler: RevealScheduler,
}

impl Instance {
    pub(crate) fn new(
        host: Rc<dyn Host>,
        defaults: RevealOptions,
        presenter: Rc<dyn Presenter>,
        state: SharedState,
    ) -> Self {
        let scheduler = RevealScheduler::new(host.clone());
        Self {
            host,
            state: RefCell::new(state),
            defaults,
            presenter,
            scheduler,
        }
    }

    pub(crate) fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub(crate) fn presenter(&self) -> Rc<dyn Presenter> {
        self.presenter.clone()
    }

    pub(crate) fn defaults(&self) -> &RevealOptions {
        &self.defaults
    }

    /// The state that currently owns this instance's registries
    pub(crate) fn state(&self) -> SharedState {
        let current = self.state.borrow().clone();
        let resolved = resolve(&current);
        if !Rc::ptr_eq(&current, &resolved) {
            *self.state.borrow_mut() = resolved.clone();
        }
        resolved
    }

    pub(crate) fn replace_state(&self, state: SharedState) {
        *self.state.borrow_mut() = state;
    }

    pub(crate) fn reveal(
        &self,
        target: Target,
        overrides: &RevealOverrides,
        interval: Option<u32>,
    ) -> Registration {
        let state = self.state();
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        if s.destroyed {
            return Registration::failed(RevealError::Destroyed);
        }

        let interval = match interval.map(validate_interval).transpose() {
            Ok(interval) => interval,
            Err(error) => {
                tracing::warn!("Sequence for {} rejected: {}", target.describe(), error);
                return Registration::failed(error);
            }
        };
        let sequence = interval.map(|ms| s.store.create_sequence(ms));

        let mut registration = registration::register(
            s,
            self.host(),
            self.presenter.as_ref(),
            Request {
                target: &target,
                defaults: &self.defaults,
                overrides,
                sequence,
                mode: Mode::Call,
            },
        );
        registration.sequence = sequence.filter(|id| s.store.sequences.contains(*id));

        let matched = !matches!(registration.errors.first(), Some(RevealError::MissingTarget(_)));
        if matched {
            s.store.record_registration(RegistrationRecord {
                target,
                defaults: self.defaults.clone(),
                overrides: overrides.clone(),
                sequence,
                interval,
            });
        }

        if !registration.elements.is_empty() {
            s.request_frame(self.host());
        }
        self.wake(s);
        registration
    }

    /// Replay every recorded registration against the current document
    pub(crate) fn sync(&self) -> Registration {
        let state = self.state();
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        if s.destroyed {
            return Registration::failed(RevealError::Destroyed);
        }

        lifecycle::rinse(s, self.host());
        let log: Vec<RegistrationRecord> = s.store.registrations().to_vec();
        let mut out = Registration::default();
        for record in log {
            let sequence = match (record.sequence, record.interval) {
                (Some(id), _) if s.store.sequences.contains(id) => Some(id),
                (Some(old), Some(interval)) => {
                    let new = s.store.create_sequence(interval);
                    s.store.replace_logged_sequence(old, new);
                    Some(new)
                }
                _ => None,
            };
            let replayed = registration::register(
                s,
                self.host(),
                self.presenter.as_ref(),
                Request {
                    target: &record.target,
                    defaults: &record.defaults,
                    overrides: &record.overrides,
                    sequence,
                    mode: Mode::Replay,
                },
            );
            out.merge(replayed);
        }

        tracing::debug!("Synced {} registration(s)", s.store.registrations().len());
        s.signal(Signal::Init, self.host());
        self.wake(s);
        out
    }

    pub(crate) fn clean(&self, target: Target) -> Vec<NodeId> {
        let state = self.state();
        let mut guard = state.borrow_mut();
        let s = &mut *guard;
        let nodes = target.resolve(self.host());
        let cleaned = lifecycle::clean(s, &nodes, self.host());
        self.wake(s);
        cleaned
    }

    pub(crate) fn destroy(&self) {
        let state = self.state();
        let mut guard = state.borrow_mut();
        lifecycle::destroy(&mut guard, self.host());
    }

    pub(crate) fn signal(&self, signal: Signal) {
        let state = self.state();
        let mut guard = state.borrow_mut();
        guard.signal(signal, self.host());
    }

    /// Run one tick: the host calls this on the requested frame or wake
    pub(crate) fn on_frame(&self) -> TickReport {
        let state = self.state();
        if state.borrow().destroyed {
            return TickReport {
                errors: vec![RevealError::Destroyed],
                ..TickReport::default()
            };
        }
        self.scheduler.tick(&state)
    }

    pub(crate) fn status(&self, node: NodeId) -> Option<Status> {
        let state = self.state();
        let s = state.borrow();
        s.store.get(node).map(|record| record.status)
    }

    pub(crate) fn history(&self) -> Vec<Transition> {
        let state = self.state();
        let s = state.borrow();
        s.store
            .history
            .entries()
            .iter()
            .filter_map(|entry| {
                let record = s.store.elements.get(entry.element)?;
                Some(Transition {
                    node: record.node,
                    direction: entry.direction,
                    timestamp: entry.timestamp,
                })
            })
            .collect()
    }

    pub(crate) fn next_wake(&self) -> Option<Timestamp> {
        let state = self.state();
        let s = state.borrow();
        lifecycle::next_wake(&s)
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.state().borrow().destroyed
    }

    pub(crate) fn shares_store_with(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.state(), &other.state())
    }

    pub(crate) fn stats(&self) -> StoreStats {
        let state = self.state();
        let s = state.borrow();
        StoreStats {
            elements: s.store.elements.len(),
            containers: s.store.containers.len(),
            sequences: s.store.sequences.len(),
            history: s.store.history.len(),
            timers: s.timers.len(),
        }
    }

    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        self.state().borrow().store.check_consistency()
    }

    /// Ask the host to wake us for the earliest pending timer
    fn wake(&self, s: &RevealState) {
        if s.destroyed {
            return;
        }
        if let Some(at) = s.timers.next_deadline() {
            self.host.request_wake(at);
        }
    }
}
