//! The public `ScrollReveal` handle

use std::fmt;
use std::rc::Rc;

use reveal_animation::{CssPresenter, Presenter, RevealState, SharedState, TickReport};
use reveal_core::config::{ContainerSpec, RevealOptions, RevealOverrides};
use reveal_core::container::resolve_container;
use reveal_core::element::Status;
use reveal_core::error::RevealError;
use reveal_core::host::{Host, Signal};
use reveal_core::id::NodeId;
use reveal_core::target::Target;
use reveal_core::time::Timestamp;

use crate::instance::{Instance, StoreStats, Transition};
use crate::registration::Registration;

/// A scroll reveal engine
///
/// An `Active` instance owns (or shares) a store and drives reveals through
/// its host. An `Inert` instance is what construction yields when the host
/// lacks the required capabilities or the instance options are invalid:
/// every operation on it is a no-op, so callers never need to check.
pub enum ScrollReveal {
    Active(Instance),
    Inert,
}

impl ScrollReveal {
    /// Create an instance with the default CSS presenter
    pub fn new(host: Rc<dyn Host>, overrides: &RevealOverrides) -> Self {
        Self::with_presenter(host, overrides, Rc::new(CssPresenter))
    }

    /// Create an instance with a custom presenter
    pub fn with_presenter(
        host: Rc<dyn Host>,
        overrides: &RevealOverrides,
        presenter: Rc<dyn Presenter>,
    ) -> Self {
        Self::build(host, overrides, presenter, RevealState::shared())
    }

    /// Create an instance that shares `other`'s store
    ///
    /// Falls back to a fresh store when `other` is inert.
    pub fn with_shared_store(
        host: Rc<dyn Host>,
        overrides: &RevealOverrides,
        other: &ScrollReveal,
    ) -> Self {
        let (state, presenter) = match other {
            ScrollReveal::Active(instance) => (instance.state(), instance.presenter()),
            ScrollReveal::Inert => (RevealState::shared(), Rc::new(CssPresenter) as Rc<dyn Presenter>),
        };
        if state.borrow().destroyed {
            tracing::warn!("Cannot share a destroyed store, using a fresh one");
            return Self::build(host, overrides, presenter, RevealState::shared());
        }
        Self::build(host, overrides, presenter, state)
    }

    pub fn inert() -> Self {
        ScrollReveal::Inert
    }

    fn build(
        host: Rc<dyn Host>,
        overrides: &RevealOverrides,
        presenter: Rc<dyn Presenter>,
        state: SharedState,
    ) -> Self {
        if !host.is_supported() {
            let error = RevealError::UnsupportedEnvironment("host capability probe failed".into());
            tracing::warn!("ScrollReveal inert: {}", error);
            return ScrollReveal::Inert;
        }
        let mut defaults = match RevealOptions::default().merged(overrides) {
            Ok(defaults) => defaults,
            Err(error) => {
                tracing::warn!("ScrollReveal inert: {}", error);
                return ScrollReveal::Inert;
            }
        };
        if let (_, Some(error)) = resolve_container(&defaults.container, host.as_ref()) {
            tracing::warn!("{}; defaulting to the root container", error);
            defaults.container = ContainerSpec::Root;
        }
        if defaults.enabled_for(host.is_mobile()) {
            host.mark_root_enabled();
        }

        state.borrow_mut().signal(Signal::Init, host.as_ref());
        ScrollReveal::Active(Instance::new(host, defaults, presenter, state))
    }

    pub fn is_inert(&self) -> bool {
        matches!(self, ScrollReveal::Inert)
    }

    /// Register `target` for reveal
    pub fn reveal(&self, target: impl Into<Target>, overrides: &RevealOverrides) -> Registration {
        match self {
            ScrollReveal::Active(instance) => instance.reveal(target.into(), overrides, None),
            ScrollReveal::Inert => Registration::default(),
        }
    }

    /// Register `target` as a sequence revealing one member every `interval_ms`
    pub fn reveal_sequence(
        &self,
        target: impl Into<Target>,
        overrides: &RevealOverrides,
        interval_ms: u32,
    ) -> Registration {
        match self {
            ScrollReveal::Active(instance) => {
                instance.reveal(target.into(), overrides, Some(interval_ms))
            }
            ScrollReveal::Inert => Registration::default(),
        }
    }

    /// Re-register every recorded target against the current document
    pub fn sync(&self) -> Registration {
        match self {
            ScrollReveal::Active(instance) => instance.sync(),
            ScrollReveal::Inert => Registration::default(),
        }
    }

    /// Restore and forget the registered nodes among `target`
    pub fn clean(&self, target: impl Into<Target>) -> Vec<NodeId> {
        match self {
            ScrollReveal::Active(instance) => instance.clean(target.into()),
            ScrollReveal::Inert => Vec::new(),
        }
    }

    /// Restore every node and stop listening; terminal
    ///
    /// Instances sharing this store are destroyed with it.
    pub fn destroy(&self) {
        if let ScrollReveal::Active(instance) = self {
            instance.destroy();
        }
    }

    /// Merge this instance's registrations into `other`'s scheduling loop
    pub fn delegate(&self, other: &ScrollReveal) -> bool {
        match (self, other) {
            (ScrollReveal::Active(ours), ScrollReveal::Active(theirs)) => ours.delegate_to(theirs),
            _ => false,
        }
    }

    pub fn signal(&self, signal: Signal) {
        if let ScrollReveal::Active(instance) = self {
            instance.signal(signal);
        }
    }

    pub fn on_scroll(&self, container: NodeId) {
        self.signal(Signal::Scroll(container));
    }

    pub fn on_resize(&self, container: NodeId) {
        self.signal(Signal::Resize(container));
    }

    pub fn on_mutation(&self) {
        self.signal(Signal::Mutation);
    }

    /// Evaluate pending work; call on every requested frame or wake
    pub fn on_frame(&self) -> TickReport {
        match self {
            ScrollReveal::Active(instance) => instance.on_frame(),
            ScrollReveal::Inert => TickReport::default(),
        }
    }

    pub fn status(&self, node: NodeId) -> Option<Status> {
        match self {
            ScrollReveal::Active(instance) => instance.status(node),
            ScrollReveal::Inert => None,
        }
    }

    /// Every recorded transition, oldest first
    pub fn history(&self) -> Vec<Transition> {
        match self {
            ScrollReveal::Active(instance) => instance.history(),
            ScrollReveal::Inert => Vec::new(),
        }
    }

    /// When the next timer is due, if any
    pub fn next_wake(&self) -> Option<Timestamp> {
        match self {
            ScrollReveal::Active(instance) => instance.next_wake(),
            ScrollReveal::Inert => None,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        match self {
            ScrollReveal::Active(instance) => instance.is_destroyed(),
            ScrollReveal::Inert => false,
        }
    }

    pub fn shares_store_with(&self, other: &ScrollReveal) -> bool {
        match (self, other) {
            (ScrollReveal::Active(a), ScrollReveal::Active(b)) => a.shares_store_with(b),
            _ => false,
        }
    }

    /// Resolved instance defaults, `None` when inert
    pub fn defaults(&self) -> Option<&RevealOptions> {
        match self {
            ScrollReveal::Active(instance) => Some(instance.defaults()),
            ScrollReveal::Inert => None,
        }
    }

    pub fn stats(&self) -> StoreStats {
        match self {
            ScrollReveal::Active(instance) => instance.stats(),
            ScrollReveal::Inert => StoreStats::default(),
        }
    }

    /// Verify the store's cross-registry references
    pub fn check_consistency(&self) -> Result<(), String> {
        match self {
            ScrollReveal::Active(instance) => instance.check_consistency(),
            ScrollReveal::Inert => Ok(()),
        }
    }
}

impl fmt::Debug for ScrollReveal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollReveal::Active(instance) => f
                .debug_struct("ScrollReveal::Active")
                .field("stats", &instance.stats())
                .field("destroyed", &instance.is_destroyed())
                .finish(),
            ScrollReveal::Inert => f.write_str("ScrollReveal::Inert"),
        }
    }
}
