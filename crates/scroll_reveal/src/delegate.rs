//! Delegation: merging one instance's registries into another's
//!
//! Delegating A to B moves A's store into B's state, leaves a redirect behind
//! so every handle that still points at A's old state follows it to B, and
//! schedules a full re-evaluation of the merged store.
//!
//! Delegation is idempotent: once two instances share a state, delegating
//! either way again changes nothing. Nodes registered with both keep B's
//! record, so every node is evaluated exactly once.

use std::rc::Rc;

use reveal_animation::timer::TimerTask;
use reveal_core::host::Signal;

use crate::instance::Instance;

impl Instance {
    /// Merge this instance's store into `target`'s and share it from now on
    ///
    /// Both instances must run on the same host. Returns false if either
    /// instance is destroyed or a tick is running on either state.
    pub(crate) fn delegate_to(&self, target: &Instance) -> bool {
        let ours = self.state();
        let theirs = target.state();
        if Rc::ptr_eq(&ours, &theirs) {
            tracing::debug!("Delegation: stores already shared");
            return true;
        }

        {
            let mut from = ours.borrow_mut();
            let mut into = theirs.borrow_mut();
            if from.destroyed || into.destroyed {
                tracing::warn!("Delegation refused: instance destroyed");
                return false;
            }
            if from.in_tick || into.in_tick {
                tracing::warn!("Delegation refused: tick in progress");
                return false;
            }

            let store = std::mem::take(&mut from.store);
            from.timers.clear();
            from.frame_requested = false;
            let now = self.host().now();

            let remap = into.store.absorb(store, self.host());

            // Cleanup timers were dropped with our queue; re-arm them
            let rearm: Vec<_> = remap
                .values()
                .filter_map(|id| {
                    let record = into.store.elements.get(*id)?;
                    (record.is_frozen() && record.options.cleanup).then(|| {
                        let at = record
                            .last_transition
                            .unwrap_or(now)
                            .after(record.options.transition_time(false));
                        (*id, at.max(now))
                    })
                })
                .collect();
            for (id, at) in rearm {
                into.timers.schedule(at, TimerTask::Cleanup(id));
            }

            from.redirect = Some(theirs.clone());
            tracing::debug!(
                "Delegation: merged {} element(s), store now holds {}",
                remap.len(),
                into.store.elements.len()
            );
        }

        self.replace_state(theirs.clone());
        theirs.borrow_mut().signal(Signal::Init, self.host());
        true
    }
}
