//! Shared engine state
//!
//! One [`RevealState`] drives one scheduling loop. Delegated instances hold
//! the same [`SharedState`]; an instance whose state was absorbed by another
//! follows [`RevealState::redirect`] to the surviving state.

use std::cell::RefCell;
use std::rc::Rc;

use reveal_core::host::{Host, Signal};
use reveal_core::store::Store;

use crate::timer::TimerQueue;

pub type SharedState = Rc<RefCell<RevealState>>;

#[derive(Debug)]
pub struct RevealState {
    pub store: Store,
    pub timers: TimerQueue,
    /// True until the first tick has completed
    pub pristine: bool,
    /// A frame was requested and has not run yet
    pub frame_requested: bool,
    /// A tick is running; nested ticks are refused
    pub in_tick: bool,
    /// Detached nodes must be rinsed on the next tick
    pub needs_rinse: bool,
    pub destroyed: bool,
    /// Set once this state was merged into another
    pub redirect: Option<SharedState>,
}

impl Default for RevealState {
    fn default() -> Self {
        Self {
            store: Store::new(),
            timers: TimerQueue::new(),
            pristine: true,
            frame_requested: false,
            in_tick: false,
            needs_rinse: false,
            destroyed: false,
            redirect: None,
        }
    }
}

impl RevealState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedState {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Record an inbound signal and request a frame to evaluate it
    ///
    /// Scroll only refreshes the container viewport; the other signals also
    /// invalidate cached element geometry.
    pub fn signal(&mut self, signal: Signal, host: &dyn Host) {
        if self.destroyed {
            return;
        }
        let containers = &mut self.store.containers;
        match signal {
            Signal::Init => containers.mark_all(true),
            Signal::Scroll(node) => match containers.find(node) {
                Some(id) => containers.mark_pending(id, false),
                None => {
                    tracing::trace!("RevealState: scroll on unobserved {:?}", node);
                    return;
                }
            },
            Signal::Resize(node) if node == host.root() => containers.mark_all(true),
            Signal::Resize(node) => match containers.find(node) {
                Some(id) => containers.mark_pending(id, true),
                None => return,
            },
            Signal::Mutation => {
                containers.mark_all(true);
                self.needs_rinse = true;
            }
        }
        self.request_frame(host);
    }

    /// Ask the host for a frame unless one is already outstanding
    pub fn request_frame(&mut self, host: &dyn Host) {
        if self.destroyed || self.frame_requested {
            return;
        }
        self.frame_requested = true;
        host.request_frame();
    }
}

/// Follow redirects to the state that currently owns the registries
pub fn resolve(state: &SharedState) -> SharedState {
    let mut current = state.clone();
    loop {
        let next = current.borrow().redirect.clone();
        match next {
            Some(next) => current = next,
            None => return current,
        }
    }
}
