//! Host environment abstraction
//!
//! The engine never touches a document directly. Everything it needs from the
//! page (selector matching, geometry, style writes, listeners, the clock)
//! goes through [`Host`], and everything the page tells the engine arrives
//! as a [`Signal`].

use crate::geometry::{Point, Rect, Size};
use crate::id::{ListenerHandle, NodeId};
use crate::time::Timestamp;

/// Measured geometry of an element
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementGeometry {
    /// Bounds in the container's content coordinates
    pub bounds: Rect,
    /// Fixed-position elements are always considered in view
    pub fixed: bool,
}

impl ElementGeometry {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            fixed: false,
        }
    }

    pub fn fixed(bounds: Rect) -> Self {
        Self {
            bounds,
            fixed: true,
        }
    }
}

/// Visible region of a scroll container
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Size of the visible region
    pub size: Size,
    /// Current scroll offset of the content
    pub scroll: Point,
}

impl Viewport {
    pub fn new(size: Size, scroll: Point) -> Self {
        Self { size, scroll }
    }

    /// The visible region in content coordinates
    pub fn visible_rect(&self) -> Rect {
        Rect {
            origin: self.scroll,
            size: self.size,
        }
    }
}

/// Inbound notifications from the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    /// Initial evaluation or forced re-evaluation of everything
    Init,
    /// A container scrolled
    Scroll(NodeId),
    /// A container (or the root viewport) changed size
    Resize(NodeId),
    /// The document changed shape; nodes may have been added or removed
    Mutation,
}

/// Host environment the engine runs inside
///
/// All methods take `&self`: the engine is single-threaded and hosts keep
/// their own interior mutability. Implementations must not call back into
/// the engine synchronously from any of these methods.
pub trait Host {
    /// Capability probe, consulted once at construction
    fn is_supported(&self) -> bool;

    /// Device class used for `desktop`/`mobile` gating
    fn is_mobile(&self) -> bool {
        false
    }

    /// Current time on the host clock
    fn now(&self) -> Timestamp;

    /// The default (document viewport) container
    fn root(&self) -> NodeId;

    /// Nodes matching `selector`, in document order
    fn query(&self, selector: &str) -> Vec<NodeId>;

    /// Whether `node` is still part of the document
    fn is_attached(&self, node: NodeId) -> bool;

    /// Geometry of `node` relative to `container`'s content origin
    fn geometry(&self, node: NodeId, container: NodeId) -> Option<ElementGeometry>;

    /// Visible region of `container`
    fn viewport(&self, container: NodeId) -> Option<Viewport>;

    /// The node's current inline style attribute
    fn inline_style(&self, node: NodeId) -> String;

    /// The node's computed opacity before any reveal styles
    fn computed_opacity(&self, _node: NodeId) -> f32 {
        1.0
    }

    /// Replace the node's inline style attribute
    fn set_style(&self, node: NodeId, style: &str);

    /// Flag the document root as driven by an enabled instance, so page
    /// styles can pre-hide content (`html.sr .load-hidden` on the web)
    fn mark_root_enabled(&self) {}

    /// Start delivering scroll/resize signals for `container`
    fn listen(&self, container: NodeId) -> ListenerHandle;

    /// Stop delivering signals for a subscription
    fn unlisten(&self, handle: ListenerHandle);

    /// Ask for `on_frame` to be called on the next animation frame
    fn request_frame(&self);

    /// Ask for `on_frame` to be called no earlier than `at`
    fn request_wake(&self, _at: Timestamp) {}
}
