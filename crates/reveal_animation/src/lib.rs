//! Scroll Reveal Animation
//!
//! Everything time-dependent in the reveal engine.
//!
//! # Features
//!
//! - **Presenter**: maps resolved options to inline styles (`CssPresenter`)
//! - **Scheduler**: two-phase ticks with per-element hook isolation
//! - **Sequences**: staggered, registration-ordered reveals on cancelable timers
//! - **Lifecycle**: clean, rinse and destroy

pub mod hooks;
pub mod lifecycle;
pub mod scheduler;
pub mod sequencing;
pub mod state;
pub mod style;
pub mod timer;

pub use scheduler::{RevealScheduler, TickReport};
pub use state::{RevealState, SharedState};
pub use style::{CssPresenter, Presenter};
pub use timer::{TimerQueue, TimerTask};
