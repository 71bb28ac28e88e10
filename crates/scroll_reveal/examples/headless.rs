//! Headless Reveal Example
//!
//! Simulates a page with a hero, a column of cards revealed as a staggered
//! sequence and a reversible footer, then scrolls through it frame by frame
//! and prints every transition.
//!
//! Run with: RUST_LOG=debug cargo run -p scroll_reveal --example headless

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use scroll_reveal::prelude::*;
use scroll_reveal::{Direction, ListenerHandle};

const FRAME_MS: u64 = 16;

/// A document of fixed-size blocks stacked vertically
struct Page {
    now: Cell<u64>,
    scroll: Cell<f32>,
    blocks: Vec<(String, Rect)>,
    styles: RefCell<HashMap<NodeId, String>>,
    frame_requested: Cell<bool>,
    wake_at: Cell<Option<Timestamp>>,
}

impl Page {
    fn new() -> Self {
        let mut blocks = vec![("hero".to_string(), Rect::new(0.0, 80.0, 800.0, 300.0))];
        for i in 0..6 {
            let y = 900.0 + i as f32 * 140.0;
            blocks.push(("card".to_string(), Rect::new(40.0, y, 720.0, 120.0)));
        }
        blocks.push(("footer".to_string(), Rect::new(0.0, 2_000.0, 800.0, 200.0)));
        Self {
            now: Cell::new(0),
            scroll: Cell::new(0.0),
            blocks,
            styles: RefCell::default(),
            frame_requested: Cell::new(false),
            wake_at: Cell::new(None),
        }
    }

    fn node(index: usize) -> NodeId {
        NodeId::new(index as u64 + 1)
    }

    fn name(&self, node: NodeId) -> String {
        let index = node.raw() as usize - 1;
        format!("{}#{}", self.blocks[index].0, index)
    }

    /// Whether the engine wants a tick now
    fn due(&self) -> bool {
        let woken = self.wake_at.get().is_some_and(|at| at <= self.now());
        if woken {
            self.wake_at.set(None);
        }
        self.frame_requested.replace(false) | woken
    }
}

impl Host for Page {
    fn is_supported(&self) -> bool {
        true
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.now.get())
    }

    fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    fn query(&self, selector: &str) -> Vec<NodeId> {
        let class = selector.trim_start_matches('.');
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| name == class)
            .map(|(i, _)| Self::node(i))
            .collect()
    }

    fn is_attached(&self, node: NodeId) -> bool {
        node.raw() as usize <= self.blocks.len()
    }

    fn geometry(&self, node: NodeId, _container: NodeId) -> Option<ElementGeometry> {
        let index = (node.raw() as usize).checked_sub(1)?;
        self.blocks
            .get(index)
            .map(|(_, rect)| ElementGeometry::new(*rect))
    }

    fn viewport(&self, _container: NodeId) -> Option<Viewport> {
        Some(Viewport::new(
            Size::new(800.0, 600.0),
            Point::new(0.0, self.scroll.get()),
        ))
    }

    fn inline_style(&self, node: NodeId) -> String {
        self.styles.borrow().get(&node).cloned().unwrap_or_default()
    }

    fn set_style(&self, node: NodeId, style: &str) {
        self.styles.borrow_mut().insert(node, style.to_string());
    }

    fn listen(&self, _container: NodeId) -> ListenerHandle {
        ListenerHandle::new(1)
    }

    fn unlisten(&self, _handle: ListenerHandle) {}

    fn request_frame(&self) {
        self.frame_requested.set(true);
    }

    fn request_wake(&self, at: Timestamp) {
        self.wake_at.set(Some(at));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let page = Rc::new(Page::new());
    let defaults = RevealOverrides::from_toml(
        r#"
        distance = "40px"
        duration = 500
        "#,
    )?;
    let sr = ScrollReveal::new(page.clone(), &defaults);

    sr.reveal(".hero", &RevealOverrides::new().origin(Origin::Top).scale(0.9));
    sr.reveal_sequence(
        ".card",
        &RevealOverrides::new().origin(Origin::Left),
        120,
    );
    let footer = sr.reveal(
        ".footer",
        &RevealOverrides::new()
            .reset(true)
            .after_reveal(Hook::observe(|node| {
                tracing::info!("footer {:?} is on screen", node);
            })),
    );
    if !footer.is_ok() {
        tracing::warn!("footer registration: {:?}", footer.errors);
    }

    // Scroll down at 12px per frame, then back up
    let path: Vec<f32> = (0..=150)
        .map(|i| i as f32 * 12.0)
        .chain((0..=150).rev().map(|i| i as f32 * 12.0))
        .collect();

    for y in path {
        page.now.set(page.now.get() + FRAME_MS);
        if page.scroll.get() != y {
            page.scroll.set(y);
            sr.on_scroll(page.root());
        }
        if !page.due() {
            continue;
        }
        let report = sr.on_frame();
        for node in &report.revealed {
            println!("{:>6}ms  reveal  {}", page.now.get(), page.name(*node));
        }
        for node in &report.reset {
            println!("{:>6}ms  reset   {}", page.now.get(), page.name(*node));
        }
        for error in &report.errors {
            println!("{:>6}ms  error   {}", page.now.get(), error);
        }
    }

    let revealed = sr
        .history()
        .iter()
        .filter(|t| t.direction == Direction::Revealed)
        .count();
    println!("{} reveal(s), {:?}", revealed, sr.stats());

    sr.destroy();
    Ok(())
}
