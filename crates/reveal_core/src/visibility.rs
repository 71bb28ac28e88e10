//! Visibility evaluation
//!
//! Pure geometry: given where an element sits, what part of its container is
//! visible, and how strict the trigger is, decide whether the element is in
//! its reveal region.
//!
//! - `view_factor` shrinks the element's own box from every side by that
//!   fraction of its size, so `0.0` triggers on the first visible pixel and
//!   `1.0` only once the element is fully visible.
//! - `view_offset` trims the container's visible region by fixed pixels.
//!
//! Boundaries are inclusive: an element whose edge lies exactly on the
//! trigger boundary is in view, so repeated evaluation at that exact offset
//! cannot oscillate.

use crate::config::RevealOptions;
use crate::geometry::{Edges, Insets};
use crate::host::{ElementGeometry, Viewport};

/// Trigger thresholds for one element
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Trigger {
    pub view_factor: f32,
    pub view_offset: Insets,
}

impl Trigger {
    pub fn new(view_factor: f32, view_offset: Insets) -> Self {
        Self {
            view_factor: view_factor.clamp(0.0, 1.0),
            view_offset,
        }
    }
}

impl From<&RevealOptions> for Trigger {
    fn from(options: &RevealOptions) -> Self {
        Trigger::new(options.view_factor, options.view_offset)
    }
}

/// The element's box after applying `view_factor`
pub fn element_region(geometry: &ElementGeometry, trigger: &Trigger) -> Edges {
    let bounds = geometry.bounds;
    let dy = bounds.height() * trigger.view_factor;
    let dx = bounds.width() * trigger.view_factor;
    Edges {
        top: bounds.top() + dy,
        right: bounds.right() - dx,
        bottom: bounds.bottom() - dy,
        left: bounds.left() + dx,
    }
}

/// The container's visible region after applying `view_offset`
pub fn trigger_region(viewport: &Viewport, trigger: &Trigger) -> Edges {
    let visible = viewport.visible_rect();
    let offset = trigger.view_offset;
    Edges {
        top: visible.top() + offset.top,
        right: visible.right() - offset.right,
        bottom: visible.bottom() - offset.bottom,
        left: visible.left() + offset.left,
    }
}

/// Whether the element is inside its reveal region
pub fn is_in_view(geometry: &ElementGeometry, viewport: &Viewport, trigger: &Trigger) -> bool {
    if geometry.fixed {
        return true;
    }
    element_region(geometry, trigger).overlaps(&trigger_region(viewport, trigger))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect, Size};

    fn viewport(scroll_y: f32) -> Viewport {
        Viewport::new(Size::new(800.0, 600.0), Point::new(0.0, scroll_y))
    }

    fn element(y: f32, height: f32) -> ElementGeometry {
        ElementGeometry::new(Rect::new(100.0, y, 200.0, height))
    }

    #[test]
    fn test_below_the_fold_is_out() {
        let trigger = Trigger::default();
        assert!(!is_in_view(&element(900.0, 100.0), &viewport(0.0), &trigger));
    }

    #[test]
    fn test_scrolled_into_view() {
        let trigger = Trigger::default();
        assert!(is_in_view(&element(900.0, 100.0), &viewport(400.0), &trigger));
    }

    #[test]
    fn test_exact_boundary_is_in() {
        let trigger = Trigger::default();
        // Element top touches the viewport bottom
        assert!(is_in_view(&element(600.0, 100.0), &viewport(0.0), &trigger));
        // One pixel further is out
        assert!(!is_in_view(&element(601.0, 100.0), &viewport(0.0), &trigger));
    }

    #[test]
    fn test_view_factor_requires_partial_visibility() {
        let trigger = Trigger::new(0.5, Insets::ZERO);
        // 40% of the element is visible
        assert!(!is_in_view(&element(560.0, 100.0), &viewport(0.0), &trigger));
        // Exactly half is visible
        assert!(is_in_view(&element(550.0, 100.0), &viewport(0.0), &trigger));
    }

    #[test]
    fn test_full_view_factor_requires_full_visibility() {
        let trigger = Trigger::new(1.0, Insets::ZERO);
        assert!(is_in_view(&element(500.0, 100.0), &viewport(0.0), &trigger));
        assert!(!is_in_view(&element(501.0, 100.0), &viewport(0.0), &trigger));
    }

    #[test]
    fn test_view_offset_trims_container() {
        let trigger = Trigger::new(0.0, Insets::new(0.0, 0.0, 100.0, 0.0));
        assert!(!is_in_view(&element(550.0, 100.0), &viewport(0.0), &trigger));
        assert!(is_in_view(&element(500.0, 100.0), &viewport(0.0), &trigger));
    }

    #[test]
    fn test_horizontal_offscreen_is_out() {
        let trigger = Trigger::default();
        let geometry = ElementGeometry::new(Rect::new(1200.0, 100.0, 100.0, 100.0));
        assert!(!is_in_view(&geometry, &viewport(0.0), &trigger));
    }

    #[test]
    fn test_fixed_is_always_in() {
        let trigger = Trigger::default();
        let geometry = ElementGeometry::fixed(Rect::new(0.0, 5000.0, 10.0, 10.0));
        assert!(is_in_view(&geometry, &viewport(0.0), &trigger));
    }
}
