//! Lifecycle controller: clean, rinse and destroy

use reveal_core::host::Host;
use reveal_core::id::{ElementId, NodeId};
use reveal_core::time::Timestamp;

use crate::sequencing;
use crate::state::RevealState;
use crate::timer::TimerTask;

/// Remove one element and its history
///
/// With `restore`, the node's original inline style is written back. If the
/// element was its sequence's cursor member, the pending step is cancelled
/// and the sequence re-armed for the next member.
pub fn clean_element(
    state: &mut RevealState,
    id: ElementId,
    host: &dyn Host,
    restore: bool,
) -> Option<NodeId> {
    let RevealState { store, timers, .. } = state;

    let record = store.elements.get(id)?;
    let node = record.node;
    if restore {
        host.set_style(node, &record.original_style);
    }
    let sequence = record.sequence;
    let was_cursor = sequence
        .and_then(|s| store.sequences.get(s))
        .is_some_and(|s| s.cursor_member() == Some(id));

    timers.cancel_where(|task| *task == TimerTask::Cleanup(id));
    store.history.forget(id);
    store.unregister(id, host);

    if let (Some(sequence), true) = (sequence, was_cursor) {
        sequencing::resume(store, timers, sequence, host.now());
    }

    tracing::debug!("Lifecycle: cleaned {:?}", node);
    Some(node)
}

/// Clean every registered element among `nodes`
pub fn clean(state: &mut RevealState, nodes: &[NodeId], host: &dyn Host) -> Vec<NodeId> {
    if state.destroyed {
        return Vec::new();
    }
    nodes
        .iter()
        .filter_map(|node| state.store.elements.find(*node))
        .collect::<Vec<ElementId>>()
        .into_iter()
        .filter_map(|id| clean_element(state, id, host, true))
        .collect()
}

/// Remove records whose node is no longer attached to the document
pub fn rinse(state: &mut RevealState, host: &dyn Host) -> Vec<NodeId> {
    state.needs_rinse = false;
    let detached: Vec<ElementId> = state
        .store
        .elements
        .iter()
        .filter(|(_, record)| !host.is_attached(record.node))
        .map(|(id, _)| id)
        .collect();
    if detached.is_empty() {
        return Vec::new();
    }
    tracing::debug!("Lifecycle: rinsing {} detached element(s)", detached.len());
    detached
        .into_iter()
        .filter_map(|id| clean_element(state, id, host, false))
        .collect()
}

/// Tear down everything; the state stays terminal afterwards
pub fn destroy(state: &mut RevealState, host: &dyn Host) {
    if state.destroyed {
        return;
    }
    for (_, record) in state.store.elements.iter() {
        if host.is_attached(record.node) {
            host.set_style(record.node, &record.original_style);
        }
    }
    let elements = state.store.elements.len();
    state.store.clear(host);
    state.timers.clear();
    state.frame_requested = false;
    state.needs_rinse = false;
    state.destroyed = true;
    tracing::debug!("Lifecycle: destroyed ({} element(s) restored)", elements);
}

/// Earliest pending timer, if any
pub fn next_wake(state: &RevealState) -> Option<Timestamp> {
    state.timers.next_deadline()
}
