//! Scripted host for integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use scroll_reveal::{
    ElementGeometry, Host, ListenerHandle, NodeId, Point, Rect, ScrollReveal, Size, TickReport,
    Timestamp, Viewport,
};

pub const ROOT: NodeId = NodeId::new(0);

pub struct MockHost {
    pub supported: Cell<bool>,
    pub mobile: Cell<bool>,
    now: Cell<u64>,
    viewport: Cell<Size>,
    scroll: RefCell<FxHashMap<NodeId, Point>>,
    rects: RefCell<FxHashMap<NodeId, Rect>>,
    fixed: RefCell<FxHashSet<NodeId>>,
    containers: RefCell<FxHashSet<NodeId>>,
    selectors: RefCell<FxHashMap<String, Vec<NodeId>>>,
    styles: RefCell<FxHashMap<NodeId, String>>,
    writes: Cell<usize>,
    listeners: RefCell<FxHashMap<ListenerHandle, NodeId>>,
    next_listener: Cell<u64>,
    frames: Cell<usize>,
    wakes: RefCell<Vec<Timestamp>>,
    root_marked: Cell<bool>,
}

impl MockHost {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            supported: Cell::new(true),
            mobile: Cell::new(false),
            now: Cell::new(0),
            viewport: Cell::new(Size::new(800.0, 600.0)),
            scroll: RefCell::default(),
            rects: RefCell::default(),
            fixed: RefCell::default(),
            containers: RefCell::default(),
            selectors: RefCell::default(),
            styles: RefCell::default(),
            writes: Cell::new(0),
            listeners: RefCell::default(),
            next_listener: Cell::new(1),
            frames: Cell::new(0),
            wakes: RefCell::default(),
            root_marked: Cell::new(false),
        })
    }

    pub fn unsupported() -> Rc<Self> {
        let host = Self::new();
        host.supported.set(false);
        host
    }

    /// Attach `node` at vertical offset `y` (200x100) and match it by `selector`
    pub fn add(&self, selector: &str, node: u64, y: f32) -> NodeId {
        let node = NodeId::new(node);
        self.rects
            .borrow_mut()
            .insert(node, Rect::new(0.0, y, 200.0, 100.0));
        self.selectors
            .borrow_mut()
            .entry(selector.to_string())
            .or_default()
            .push(node);
        node
    }

    pub fn add_fixed(&self, selector: &str, node: u64, y: f32) -> NodeId {
        let node = self.add(selector, node, y);
        self.fixed.borrow_mut().insert(node);
        node
    }

    /// A scroll container matched by `selector`
    pub fn add_container(&self, selector: &str, node: u64) -> NodeId {
        let node = NodeId::new(node);
        self.containers.borrow_mut().insert(node);
        self.selectors
            .borrow_mut()
            .entry(selector.to_string())
            .or_default()
            .push(node);
        node
    }

    pub fn set_inline_style(&self, node: NodeId, style: &str) {
        self.styles.borrow_mut().insert(node, style.to_string());
    }

    /// Detach a node from the document
    pub fn remove(&self, node: NodeId) {
        self.rects.borrow_mut().remove(&node);
        for nodes in self.selectors.borrow_mut().values_mut() {
            nodes.retain(|n| *n != node);
        }
    }

    pub fn move_to(&self, node: NodeId, y: f32) {
        if let Some(rect) = self.rects.borrow_mut().get_mut(&node) {
            rect.origin.y = y;
        }
    }

    pub fn scroll_to(&self, container: NodeId, y: f32) {
        self.scroll.borrow_mut().insert(container, Point::new(0.0, y));
    }

    pub fn set_time(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn style(&self, node: NodeId) -> String {
        self.styles.borrow().get(&node).cloned().unwrap_or_default()
    }

    pub fn style_writes(&self) -> usize {
        self.writes.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn frames(&self) -> usize {
        self.frames.get()
    }

    pub fn wakes(&self) -> Vec<Timestamp> {
        self.wakes.borrow().clone()
    }

    pub fn root_marked(&self) -> bool {
        self.root_marked.get()
    }
}

impl Host for MockHost {
    fn is_supported(&self) -> bool {
        self.supported.get()
    }

    fn is_mobile(&self) -> bool {
        self.mobile.get()
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now.get())
    }

    fn root(&self) -> NodeId {
        ROOT
    }

    fn query(&self, selector: &str) -> Vec<NodeId> {
        self.selectors
            .borrow()
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    fn is_attached(&self, node: NodeId) -> bool {
        node == ROOT
            || self.rects.borrow().contains_key(&node)
            || self.containers.borrow().contains(&node)
    }

    fn geometry(&self, node: NodeId, _container: NodeId) -> Option<ElementGeometry> {
        let bounds = self.rects.borrow().get(&node).copied()?;
        if self.fixed.borrow().contains(&node) {
            Some(ElementGeometry::fixed(bounds))
        } else {
            Some(ElementGeometry::new(bounds))
        }
    }

    fn viewport(&self, container: NodeId) -> Option<Viewport> {
        if container != ROOT && !self.containers.borrow().contains(&container) {
            return None;
        }
        let scroll = self
            .scroll
            .borrow()
            .get(&container)
            .copied()
            .unwrap_or_default();
        Some(Viewport::new(self.viewport.get(), scroll))
    }

    fn inline_style(&self, node: NodeId) -> String {
        self.style(node)
    }

    fn set_style(&self, node: NodeId, style: &str) {
        self.writes.set(self.writes.get() + 1);
        self.styles.borrow_mut().insert(node, style.to_string());
    }

    fn mark_root_enabled(&self) {
        self.root_marked.set(true);
    }

    fn listen(&self, container: NodeId) -> ListenerHandle {
        let handle = ListenerHandle::new(self.next_listener.get());
        self.next_listener.set(self.next_listener.get() + 1);
        self.listeners.borrow_mut().insert(handle, container);
        handle
    }

    fn unlisten(&self, handle: ListenerHandle) {
        self.listeners.borrow_mut().remove(&handle);
    }

    fn request_frame(&self) {
        self.frames.set(self.frames.get() + 1);
    }

    fn request_wake(&self, at: Timestamp) {
        self.wakes.borrow_mut().push(at);
    }
}

/// Scroll the root viewport and run the resulting tick
pub fn scroll(host: &MockHost, sr: &ScrollReveal, y: f32) -> TickReport {
    host.scroll_to(ROOT, y);
    sr.on_scroll(ROOT);
    sr.on_frame()
}

/// Jump the clock to the next pending timer and run a tick
pub fn wake(host: &MockHost, sr: &ScrollReveal) -> Option<TickReport> {
    let at = sr.next_wake()?;
    host.set_time(at.as_millis());
    Some(sr.on_frame())
}
