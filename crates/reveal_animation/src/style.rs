//! Presentational mapping
//!
//! Turns resolved options into the inline style strings written for each
//! state of an element. The scheduler never builds styles itself; it only
//! writes the strings generated here at registration time.

use reveal_core::config::{Origin, RevealOptions};
use reveal_core::element::ElementStyles;
use reveal_core::host::Host;
use reveal_core::id::NodeId;

/// Maps options to element styles
pub trait Presenter {
    fn styles(
        &self,
        node: NodeId,
        options: &RevealOptions,
        original_style: &str,
        host: &dyn Host,
    ) -> ElementStyles;
}

/// Inline CSS presenter
///
/// Produces `opacity`, `transform` and `transition` declarations appended
/// to the element's original inline style.
#[derive(Clone, Copy, Debug, Default)]
pub struct CssPresenter;

impl CssPresenter {
    pub fn new() -> Self {
        Self
    }
}

/// Hidden/shown declaration pair for one animated property
struct Animated {
    property: &'static str,
    hidden: String,
    shown: String,
}

impl Presenter for CssPresenter {
    fn styles(
        &self,
        node: NodeId,
        options: &RevealOptions,
        original_style: &str,
        host: &dyn Host,
    ) -> ElementStyles {
        let base = base_style(original_style);

        let mut animated: Vec<Animated> = Vec::with_capacity(2);
        if let Some(opacity) = options.opacity {
            let computed = host.computed_opacity(node);
            if opacity != computed {
                animated.push(Animated {
                    property: "opacity",
                    hidden: format!("opacity: {opacity};"),
                    shown: format!("opacity: {computed};"),
                });
            }
        }
        if let Some(transform) = transform(options) {
            animated.push(Animated {
                property: "transform",
                hidden: format!("transform: {transform};"),
                shown: "transform: none;".to_string(),
            });
        }

        let hidden: Vec<&str> = animated.iter().map(|a| a.hidden.as_str()).collect();
        let shown: Vec<&str> = animated.iter().map(|a| a.shown.as_str()).collect();
        let instant = transition(&animated, options, 0);
        let delayed = transition(&animated, options, options.delay);

        ElementStyles {
            initial: compose(&base, &hidden, None),
            reveal_instant: compose(&base, &shown, instant.as_deref()),
            reveal_delayed: compose(&base, &shown, delayed.as_deref()),
            reset: compose(&base, &hidden, instant.as_deref()),
        }
    }
}

/// Original inline style, terminated, with visibility forced on
fn base_style(original: &str) -> String {
    let trimmed = original.trim();
    if trimmed.is_empty() {
        "visibility: visible;".to_string()
    } else if trimmed.ends_with(';') {
        format!("{trimmed} visibility: visible;")
    } else {
        format!("{trimmed}; visibility: visible;")
    }
}

/// Hidden-state transform, or `None` if nothing moves
fn transform(options: &RevealOptions) -> Option<String> {
    let mut parts = Vec::new();

    if !options.distance.is_zero() {
        let distance = match options.origin {
            Origin::Top | Origin::Left => options.distance.negated(),
            Origin::Bottom | Origin::Right => options.distance,
        };
        let axis = if options.origin.is_vertical() { 'Y' } else { 'X' };
        parts.push(format!("translate{axis}({distance})"));
    }

    let rotate = options.rotate;
    for (axis, degrees) in [('X', rotate.x), ('Y', rotate.y), ('Z', rotate.z)] {
        if degrees != 0.0 {
            parts.push(format!("rotate{axis}({degrees}deg)"));
        }
    }

    if options.scale != 1.0 {
        parts.push(format!("scale({})", options.scale));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn transition(animated: &[Animated], options: &RevealOptions, delay: u32) -> Option<String> {
    if animated.is_empty() {
        return None;
    }
    let clauses: Vec<String> = animated
        .iter()
        .map(|a| {
            format!(
                "{} {}ms {} {}ms",
                a.property, options.duration, options.easing, delay
            )
        })
        .collect();
    Some(format!("transition: {};", clauses.join(", ")))
}

fn compose(base: &str, declarations: &[&str], transition: Option<&str>) -> String {
    let mut out = String::from(base);
    for declaration in declarations.iter().copied().chain(transition) {
        out.push(' ');
        out.push_str(declaration);
    }
    out
}
