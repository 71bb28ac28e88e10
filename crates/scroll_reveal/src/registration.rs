//! Registration of reveal targets

use reveal_animation::lifecycle;
use reveal_animation::sequencing;
use reveal_animation::{Presenter, RevealState};
use reveal_core::config::{RevealOptions, RevealOverrides};
use reveal_core::error::RevealError;
use reveal_core::host::Host;
use reveal_core::id::{ElementId, NodeId, SequenceId};
use reveal_core::target::Target;

/// Outcome of a `reveal`, `reveal_sequence` or `sync` call
///
/// Registration never fails as a whole: each node either lands in
/// `elements` or contributes an entry to `errors`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Registration {
    /// Nodes registered or refreshed by the call
    pub elements: Vec<NodeId>,
    /// Sequence created for the call, if any members joined it
    pub sequence: Option<SequenceId>,
    pub errors: Vec<RevealError>,
}

impl Registration {
    pub(crate) fn failed(error: RevealError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn merge(&mut self, other: Registration) {
        for node in other.elements {
            if !self.elements.contains(&node) {
                self.elements.push(node);
            }
        }
        self.errors.extend(other.errors);
    }
}

/// How already registered nodes treat the call's sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    /// A user call: registered nodes move into the call's sequence
    Call,
    /// A `sync` replay: registered nodes keep their sequence membership
    Replay,
}

pub(crate) struct Request<'a> {
    pub target: &'a Target,
    pub defaults: &'a RevealOptions,
    pub overrides: &'a RevealOverrides,
    pub sequence: Option<SequenceId>,
    pub mode: Mode,
}

/// Register every node matched by the request's target
pub(crate) fn register(
    state: &mut RevealState,
    host: &dyn Host,
    presenter: &dyn Presenter,
    request: Request<'_>,
) -> Registration {
    let mut registration = Registration::default();

    let nodes = request.target.resolve(host);
    if nodes.is_empty() {
        let error = RevealError::MissingTarget(request.target.describe());
        tracing::warn!("Reveal failed: {}", error);
        registration.errors.push(error);
        if let Some(sequence) = request.sequence {
            settle_sequence(state, sequence, host);
        }
        return registration;
    }

    let mobile = host.is_mobile();
    for node in nodes {
        let existing = state.store.elements.find(node);

        let enabled = {
            let base = existing
                .and_then(|id| state.store.elements.get(id))
                .map_or(request.defaults, |record| &record.options);
            match base.merged(request.overrides) {
                Ok(options) => options.enabled_for(mobile),
                Err(error) => {
                    tracing::warn!("Skipping {:?}: {}", node, error);
                    registration.errors.push(error);
                    continue;
                }
            }
        };
        if !enabled {
            if let Some(id) = existing {
                lifecycle::clean_element(state, id, host, true);
            }
            tracing::debug!("Skipping {:?}: disabled on this device class", node);
            continue;
        }

        let sequence = match (request.mode, existing) {
            (Mode::Replay, Some(_)) => None,
            _ => request.sequence,
        };
        match state
            .store
            .register(node, request.overrides, request.defaults, sequence, host)
        {
            Ok(registered) => {
                registration.errors.extend(registered.warnings);
                apply_styles(state, registered.id, host, presenter);
                registration.elements.push(node);
            }
            Err(error) => {
                tracing::warn!("Skipping {:?}: {}", node, error);
                registration.errors.push(error);
            }
        }
    }

    if let Some(sequence) = request.sequence {
        settle_sequence(state, sequence, host);
    }
    registration
}

/// Generate an element's styles and write the one matching its status
fn apply_styles(state: &mut RevealState, id: ElementId, host: &dyn Host, presenter: &dyn Presenter) {
    let Some(record) = state.store.elements.get_mut(id) else {
        return;
    };
    record.styles = presenter.styles(record.node, &record.options, &record.original_style, host);
    let style = if record.is_revealed() {
        record.styles.revealed(false)
    } else {
        record.styles.initial.as_str()
    };
    host.set_style(record.node, style);
}

/// Drop a sequence nobody joined, or move its cursor past revealed members
fn settle_sequence(state: &mut RevealState, sequence: SequenceId, host: &dyn Host) {
    let empty = state
        .store
        .sequences
        .get(sequence)
        .is_some_and(|s| s.members.is_empty());
    if empty {
        state.store.sequences.remove(sequence);
        return;
    }
    let RevealState { store, timers, .. } = state;
    sequencing::resume(store, timers, sequence, host.now());
}
