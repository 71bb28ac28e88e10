//! User lifecycle hooks
//!
//! Hooks run synchronously around a transition's side effect. A
//! `before*` hook may return [`Flow::Cancel`] to abort that one transition.

use std::fmt;
use std::rc::Rc;

use crate::error::HookKind;
use crate::id::NodeId;

/// What a hook asks the scheduler to do next
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Let the transition proceed
    #[default]
    Continue,
    /// Abort the transition for this element only
    Cancel,
}

/// Hook signature: receives the node being transitioned
pub type HookFn = dyn Fn(NodeId) -> anyhow::Result<Flow>;

/// A shareable user hook
#[derive(Clone)]
pub struct Hook(Rc<HookFn>);

impl Hook {
    /// Hook that can cancel the transition or fail
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(NodeId) -> anyhow::Result<Flow> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Hook that only observes the transition
    pub fn observe<F>(f: F) -> Self
    where
        F: Fn(NodeId) + 'static,
    {
        Self(Rc::new(move |node| {
            f(node);
            Ok(Flow::Continue)
        }))
    }

    pub fn call(&self, node: NodeId) -> anyhow::Result<Flow> {
        (self.0)(node)
    }

    pub fn ptr_eq(&self, other: &Hook) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Hooks are equal when they share one closure
impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

/// The four hook slots of an element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hooks {
    pub before_reveal: Option<Hook>,
    pub after_reveal: Option<Hook>,
    pub before_reset: Option<Hook>,
    pub after_reset: Option<Hook>,
}

impl Hooks {
    pub fn get(&self, kind: HookKind) -> Option<&Hook> {
        match kind {
            HookKind::BeforeReveal => self.before_reveal.as_ref(),
            HookKind::AfterReveal => self.after_reveal.as_ref(),
            HookKind::BeforeReset => self.before_reset.as_ref(),
            HookKind::AfterReset => self.after_reset.as_ref(),
        }
    }

    pub fn set(&mut self, kind: HookKind, hook: Hook) {
        let slot = match kind {
            HookKind::BeforeReveal => &mut self.before_reveal,
            HookKind::AfterReveal => &mut self.after_reveal,
            HookKind::BeforeReset => &mut self.before_reset,
            HookKind::AfterReset => &mut self.after_reset,
        };
        *slot = Some(hook);
    }

    /// Slots set in `overrides` replace ours
    pub fn merged(&self, overrides: &Hooks) -> Hooks {
        Hooks {
            before_reveal: overrides
                .before_reveal
                .clone()
                .or_else(|| self.before_reveal.clone()),
            after_reveal: overrides
                .after_reveal
                .clone()
                .or_else(|| self.after_reveal.clone()),
            before_reset: overrides
                .before_reset
                .clone()
                .or_else(|| self.before_reset.clone()),
            after_reset: overrides
                .after_reset
                .clone()
                .or_else(|| self.after_reset.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.before_reveal.is_none()
            && self.after_reveal.is_none()
            && self.before_reset.is_none()
            && self.after_reset.is_none()
    }
}
