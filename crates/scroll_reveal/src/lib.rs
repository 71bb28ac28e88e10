//! Scroll Reveal
//!
//! Reveal elements with an animation as they scroll into view.
//!
//! The engine is host-agnostic: a [`Host`] implementation supplies geometry,
//! styles, listeners and the clock, and forwards scroll, resize and mutation
//! notifications back as [`Signal`]s. Work is batched to at most one tick per
//! requested frame.
//!
//! # Example
//!
//! ```ignore
//! use scroll_reveal::prelude::*;
//!
//! let sr = ScrollReveal::new(host.clone(), &RevealOverrides::new().distance("60px"));
//! sr.reveal(".headline", &RevealOverrides::new());
//! sr.reveal_sequence(".card", &RevealOverrides::new().origin(Origin::Left), 200);
//!
//! // On every frame the host requested:
//! let report = sr.on_frame();
//! ```

mod delegate;
mod instance;
mod registration;
mod reveal;

pub use instance::{Instance, StoreStats, Transition};
pub use registration::Registration;
pub use reveal::ScrollReveal;

// Re-export the building blocks a host needs
pub use reveal_animation::{CssPresenter, Presenter, TickReport};
pub use reveal_core::{
    ContainerSpec, Direction, ElementGeometry, ElementStyles, Flow, Hook, HookKind, Host, Insets,
    ListenerHandle, NodeId, Origin, SequenceId, Point, Rect, RevealError, RevealOptions, RevealOverrides,
    Signal, Size, Status, Target, Timestamp, UseDelay, Viewport,
};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::registration::Registration;
    pub use crate::reveal::ScrollReveal;

    pub use reveal_animation::TickReport;
    pub use reveal_core::{
        ElementGeometry, Flow, Hook, Host, NodeId, Origin, Point, Rect, RevealOverrides, Signal,
        Size, Status, Target, Timestamp, UseDelay, Viewport,
    };
}
