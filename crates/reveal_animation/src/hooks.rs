//! Fault-isolated hook invocation

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use reveal_core::error::{HookKind, RevealError};
use reveal_core::hooks::{Flow, Hook};
use reveal_core::id::NodeId;

/// Run a hook, converting errors and panics into [`RevealError::CallbackError`]
///
/// A missing hook continues. The caller must not hold a borrow of engine
/// state while this runs: hooks are free to call back into the instance.
pub fn invoke(hook: Option<&Hook>, kind: HookKind, node: NodeId) -> Result<Flow, RevealError> {
    let Some(hook) = hook else {
        return Ok(Flow::Continue);
    };

    let message = match panic::catch_unwind(AssertUnwindSafe(|| hook.call(node))) {
        Ok(Ok(flow)) => return Ok(flow),
        Ok(Err(err)) => format!("{err:#}"),
        Err(payload) => panic_message(payload.as_ref()),
    };

    let error = RevealError::CallbackError { hook: kind, message };
    tracing::warn!("{} (node {:?})", error, node);
    Err(error)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_hook_continues() {
        assert_eq!(
            invoke(None, HookKind::BeforeReveal, NodeId::new(1)),
            Ok(Flow::Continue)
        );
    }

    #[test]
    fn test_cancel_is_passed_through() {
        let hook = Hook::new(|_| Ok(Flow::Cancel));
        assert_eq!(
            invoke(Some(&hook), HookKind::BeforeReset, NodeId::new(1)),
            Ok(Flow::Cancel)
        );
    }

    #[test]
    fn test_error_becomes_callback_error() {
        let hook = Hook::new(|_| Err(anyhow::anyhow!("boom")));
        let result = invoke(Some(&hook), HookKind::AfterReveal, NodeId::new(1));
        assert_eq!(
            result,
            Err(RevealError::CallbackError {
                hook: HookKind::AfterReveal,
                message: "boom".to_string(),
            })
        );
    }

    #[test]
    fn test_panic_is_caught() {
        let hook = Hook::observe(|_| panic!("hook exploded"));
        let result = invoke(Some(&hook), HookKind::BeforeReveal, NodeId::new(1));
        match result {
            Err(RevealError::CallbackError { hook, message }) => {
                assert_eq!(hook, HookKind::BeforeReveal);
                assert!(message.contains("hook exploded"));
            }
            other => panic!("expected callback error, got {other:?}"),
        }
    }
}
