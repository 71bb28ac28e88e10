//! Scroll Reveal Core
//!
//! Host-independent building blocks of the scroll reveal engine:
//!
//! - **Configuration**: option resolution and validation from code, JSON or TOML
//! - **Registries**: elements, scroll containers and reveal sequences
//! - **Visibility**: pure in-view evaluation against a container viewport
//! - **History**: the ordered log of every reveal and reset
//! - **Host**: the trait through which the engine reads and writes the page
//!
//! Timing, styles and the tick loop live in `reveal_animation`; the public
//! facade lives in `scroll_reveal`.

pub mod config;
pub mod container;
pub mod element;
pub mod error;
pub mod geometry;
pub mod history;
pub mod hooks;
pub mod host;
pub mod id;
pub mod sequence;
pub mod store;
pub mod target;
pub mod time;
pub mod visibility;

pub use config::{
    ContainerSpec, Distance, LengthUnit, Origin, RevealOptions, RevealOverrides, Rotate, UseDelay,
    MIN_SEQUENCE_INTERVAL_MS,
};
pub use container::{ContainerRecord, ContainerRegistry};
pub use element::{ElementRecord, ElementRegistry, ElementStyles, Status};
pub use error::{HookKind, Result, RevealError};
pub use geometry::{Edges, Insets, Point, Rect, Size};
pub use history::{Direction, History, HistoryEntry};
pub use hooks::{Flow, Hook, Hooks};
pub use host::{ElementGeometry, Host, Signal, Viewport};
pub use id::{ContainerId, ElementId, ListenerHandle, NodeId, SequenceId, TimerId};
pub use sequence::{SequenceRecord, SequenceRegistry};
pub use store::{Registered, RegistrationRecord, Store};
pub use target::Target;
pub use time::Timestamp;
pub use visibility::{is_in_view, Trigger};
