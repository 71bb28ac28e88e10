//! Identity types
//!
//! Engine-side records are keyed by slotmap handles. Host-side nodes are
//! identified by an opaque [`NodeId`] that the host hands out and keeps
//! stable for the lifetime of the node.

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a registered element record
    pub struct ElementId;
    /// Handle to a registered scroll container
    pub struct ContainerId;
    /// Handle to a reveal sequence
    pub struct SequenceId;
    /// Handle to a pending timer
    pub struct TimerId;
}

/// Opaque identity of a host document node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Handle to a scroll/resize subscription held by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}
