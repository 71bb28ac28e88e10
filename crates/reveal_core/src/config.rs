//! Reveal options and the config resolver
//!
//! [`RevealOptions`] is a fully resolved option set. [`RevealOverrides`] is a
//! partial set coming from code, JSON or TOML; [`RevealOptions::merged`]
//! validates an override set and applies it on top of a resolved base.
//!
//! Resolution chain per element:
//!
//! ```text
//! RevealOptions::default()
//!   <- instance overrides
//!   <- existing element options (re-registration only)
//!   <- per-call overrides
//! ```
//!
//! # Example
//!
//! ```
//! use reveal_core::config::{RevealOptions, RevealOverrides, UseDelay};
//!
//! let overrides = RevealOverrides::from_json(r#"{ "distance": "20px", "useDelay": "once" }"#)
//!     .unwrap()
//!     .delay(150);
//!
//! let options = RevealOptions::default().merged(&overrides).unwrap();
//! assert_eq!(options.delay, 150);
//! assert_eq!(options.use_delay, UseDelay::Once);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::error::{HookKind, Result, RevealError};
use crate::geometry::Insets;
use crate::hooks::{Hook, Hooks};
use crate::id::NodeId;

/// Shortest accepted stagger interval for sequences (one frame at 60fps)
pub const MIN_SEQUENCE_INTERVAL_MS: u32 = 16;

/// Side of the element the reveal animates in from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
}

impl Origin {
    /// Top and bottom origins translate along Y
    pub fn is_vertical(self) -> bool {
        matches!(self, Origin::Top | Origin::Bottom)
    }
}

/// CSS length units accepted for `distance`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Percent,
    Vh,
    Vw,
}

impl LengthUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::Em => "em",
            LengthUnit::Rem => "rem",
            LengthUnit::Percent => "%",
            LengthUnit::Vh => "vh",
            LengthUnit::Vw => "vw",
        }
    }

    fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "px" => Some(LengthUnit::Px),
            "em" => Some(LengthUnit::Em),
            "rem" => Some(LengthUnit::Rem),
            "%" => Some(LengthUnit::Percent),
            "vh" => Some(LengthUnit::Vh),
            "vw" => Some(LengthUnit::Vw),
            _ => None,
        }
    }
}

/// Translation distance with unit, e.g. `20px`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Distance {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Distance {
    pub const ZERO: Distance = Distance {
        value: 0.0,
        unit: LengthUnit::Px,
    };

    pub const fn px(value: f32) -> Self {
        Self {
            value,
            unit: LengthUnit::Px,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    pub fn negated(self) -> Self {
        Self {
            value: -self.value,
            unit: self.unit,
        }
    }
}

impl Default for Distance {
    fn default() -> Self {
        Distance::ZERO
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

impl FromStr for Distance {
    type Err = RevealError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
            .unwrap_or(s.len());
        let (number, unit) = s.split_at(split);

        let value: f32 = number
            .parse()
            .map_err(|_| RevealError::invalid(format!("malformed distance `{s}`")))?;
        if !value.is_finite() {
            return Err(RevealError::invalid(format!("malformed distance `{s}`")));
        }

        if unit.is_empty() {
            // Unitless lengths are only valid for zero
            return if value == 0.0 {
                Ok(Distance::ZERO)
            } else {
                Err(RevealError::invalid(format!(
                    "distance `{s}` is missing a unit"
                )))
            };
        }

        let unit = LengthUnit::parse(unit)
            .ok_or_else(|| RevealError::invalid(format!("unknown distance unit in `{s}`")))?;
        Ok(Distance { value, unit })
    }
}

/// Initial rotation in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Rotate {
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

/// When the configured `delay` applies to a reveal
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseDelay {
    /// Every reveal is delayed
    #[default]
    Always,
    /// Only the first reveal of an element is delayed
    Once,
    /// Only reveals during the first tick after construction are delayed
    #[serde(rename = "onload")]
    OnLoad,
}

impl UseDelay {
    /// Whether the delay applies to the next reveal
    ///
    /// `first_reveal` is true when the element has no recorded reveal;
    /// `pristine` is true until the instance's first tick has completed.
    pub fn applies(self, first_reveal: bool, pristine: bool) -> bool {
        match self {
            UseDelay::Always => true,
            UseDelay::Once => first_reveal,
            UseDelay::OnLoad => pristine,
        }
    }
}

/// Scroll container an element is observed in
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContainerSpec {
    /// The document viewport
    #[default]
    Root,
    /// First node matching a selector
    Selector(String),
    /// A specific node
    Node(NodeId),
}

impl From<&str> for ContainerSpec {
    fn from(selector: &str) -> Self {
        match selector.trim() {
            "" | "root" | ":root" => ContainerSpec::Root,
            other => ContainerSpec::Selector(other.to_string()),
        }
    }
}

impl From<NodeId> for ContainerSpec {
    fn from(node: NodeId) -> Self {
        ContainerSpec::Node(node)
    }
}

impl<'de> Deserialize<'de> for ContainerSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let selector = String::deserialize(deserializer)?;
        Ok(ContainerSpec::from(selector.as_str()))
    }
}

/// Fully resolved options for one element
#[derive(Clone, Debug, PartialEq)]
pub struct RevealOptions {
    pub origin: Origin,
    pub distance: Distance,
    /// Transition duration (ms)
    pub duration: u32,
    /// Transition delay (ms), see [`UseDelay`]
    pub delay: u32,
    /// Opaque CSS timing function
    pub easing: String,
    /// Starting opacity; `None` leaves opacity untouched
    pub opacity: Option<f32>,
    pub rotate: Rotate,
    pub scale: f32,
    pub container: ContainerSpec,
    pub desktop: bool,
    pub mobile: bool,
    /// Reversible: reset when the element leaves its trigger region
    pub reset: bool,
    pub use_delay: UseDelay,
    /// Fraction (0..=1) of the element that must be inside the trigger region
    pub view_factor: f32,
    /// Pixels trimmed from each side of the container viewport
    pub view_offset: Insets,
    /// Restore the original style and forget the element once a one-shot
    /// reveal has finished
    pub cleanup: bool,
    /// Re-check visibility before a staggered sequence step fires
    pub recheck_sequence: bool,
    pub hooks: Hooks,
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            origin: Origin::Bottom,
            distance: Distance::ZERO,
            duration: 600,
            delay: 0,
            easing: "cubic-bezier(0.5, 0, 0, 1)".to_string(),
            opacity: Some(0.0),
            rotate: Rotate::default(),
            scale: 1.0,
            container: ContainerSpec::Root,
            desktop: true,
            mobile: true,
            reset: false,
            use_delay: UseDelay::Always,
            view_factor: 0.0,
            view_offset: Insets::ZERO,
            cleanup: false,
            recheck_sequence: false,
            hooks: Hooks::default(),
        }
    }
}

impl RevealOptions {
    /// Validate `overrides` and apply them on top of `self`
    pub fn merged(&self, overrides: &RevealOverrides) -> Result<RevealOptions> {
        let mut out = self.clone();

        if let Some(origin) = overrides.origin {
            out.origin = origin;
        }
        if let Some(distance) = &overrides.distance {
            out.distance = distance.parse()?;
        }
        if let Some(duration) = overrides.duration {
            out.duration = millis("duration", duration)?;
        }
        if let Some(delay) = overrides.delay {
            out.delay = millis("delay", delay)?;
        }
        if let Some(easing) = &overrides.easing {
            if easing.trim().is_empty() {
                return Err(RevealError::invalid("easing must not be empty"));
            }
            out.easing = easing.trim().to_string();
        }
        if let Some(opacity) = overrides.opacity {
            if let Some(value) = opacity {
                if !(0.0..=1.0).contains(&value) {
                    return Err(RevealError::invalid(format!(
                        "opacity {value} is outside 0..=1"
                    )));
                }
            }
            out.opacity = opacity;
        }
        if let Some(rotate) = &overrides.rotate {
            for (axis, value) in [("x", rotate.x), ("y", rotate.y), ("z", rotate.z)] {
                if matches!(value, Some(v) if !v.is_finite()) {
                    return Err(RevealError::invalid(format!("rotate.{axis} is not finite")));
                }
            }
            out.rotate = Rotate {
                x: rotate.x.unwrap_or(out.rotate.x),
                y: rotate.y.unwrap_or(out.rotate.y),
                z: rotate.z.unwrap_or(out.rotate.z),
            };
        }
        if let Some(scale) = overrides.scale {
            if !scale.is_finite() || scale < 0.0 {
                return Err(RevealError::invalid(format!("scale {scale} is invalid")));
            }
            out.scale = scale;
        }
        if let Some(container) = &overrides.container {
            out.container = container.clone();
        }
        if let Some(desktop) = overrides.desktop {
            out.desktop = desktop;
        }
        if let Some(mobile) = overrides.mobile {
            out.mobile = mobile;
        }
        if let Some(reset) = overrides.reset {
            out.reset = reset;
        }
        if let Some(use_delay) = overrides.use_delay {
            out.use_delay = use_delay;
        }
        if let Some(view_factor) = overrides.view_factor {
            if !view_factor.is_finite() {
                return Err(RevealError::invalid("viewFactor is not finite"));
            }
            out.view_factor = view_factor.clamp(0.0, 1.0);
        }
        if let Some(offset) = &overrides.view_offset {
            let view_offset = Insets {
                top: offset.top.unwrap_or(out.view_offset.top),
                right: offset.right.unwrap_or(out.view_offset.right),
                bottom: offset.bottom.unwrap_or(out.view_offset.bottom),
                left: offset.left.unwrap_or(out.view_offset.left),
            };
            if !view_offset.is_finite() {
                return Err(RevealError::invalid("viewOffset is not finite"));
            }
            out.view_offset = view_offset;
        }
        if let Some(cleanup) = overrides.cleanup {
            out.cleanup = cleanup;
        }
        if let Some(recheck) = overrides.recheck_sequence {
            out.recheck_sequence = recheck;
        }
        out.hooks = out.hooks.merged(&overrides.hooks);

        Ok(out)
    }

    /// Whether this element participates on the current device class
    pub fn enabled_for(&self, mobile: bool) -> bool {
        if mobile {
            self.mobile
        } else {
            self.desktop
        }
    }

    /// Time until a transition finishes (ms)
    pub fn transition_time(&self, delayed: bool) -> u32 {
        if delayed {
            self.duration.saturating_add(self.delay)
        } else {
            self.duration
        }
    }
}

fn millis(name: &str, value: f64) -> Result<u32> {
    if !value.is_finite() || value < 0.0 {
        return Err(RevealError::invalid(format!(
            "{name} must be a non-negative number of milliseconds, got {value}"
        )));
    }
    if value > u32::MAX as f64 {
        return Err(RevealError::invalid(format!("{name} {value} is too large")));
    }
    Ok(value.round() as u32)
}

/// Validate a sequence stagger interval
pub fn validate_interval(interval_ms: u32) -> Result<u32> {
    if interval_ms < MIN_SEQUENCE_INTERVAL_MS {
        return Err(RevealError::invalid(format!(
            "sequence interval must be at least {MIN_SEQUENCE_INTERVAL_MS}ms, got {interval_ms}ms"
        )));
    }
    Ok(interval_ms)
}

/// Partial rotation override
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotateOverrides {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
}

/// Partial view offset override
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsetOverrides {
    pub top: Option<f32>,
    pub right: Option<f32>,
    pub bottom: Option<f32>,
    pub left: Option<f32>,
}

/// Raw, unvalidated option overrides
///
/// Deserializes from camelCase keys (`useDelay`, `viewFactor`, ...). Hooks
/// can only be attached in code.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct RevealOverrides {
    pub origin: Option<Origin>,
    pub distance: Option<String>,
    pub duration: Option<f64>,
    pub delay: Option<f64>,
    pub easing: Option<String>,
    /// `Some(None)` (JSON `null`) disables the opacity animation
    #[serde(deserialize_with = "explicit_option")]
    pub opacity: Option<Option<f32>>,
    pub rotate: Option<RotateOverrides>,
    pub scale: Option<f32>,
    pub container: Option<ContainerSpec>,
    pub desktop: Option<bool>,
    pub mobile: Option<bool>,
    pub reset: Option<bool>,
    pub use_delay: Option<UseDelay>,
    pub view_factor: Option<f32>,
    pub view_offset: Option<InsetOverrides>,
    pub cleanup: Option<bool>,
    pub recheck_sequence: Option<bool>,
    #[serde(skip)]
    pub hooks: Hooks,
}

fn explicit_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl RevealOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse overrides from a JSON object
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source)
            .map_err(|e| RevealError::invalid(format!("invalid JSON options: {e}")))
    }

    /// Parse overrides from a TOML table
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source)
            .map_err(|e| RevealError::invalid(format!("invalid TOML options: {e}")))
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn distance(mut self, distance: impl Into<String>) -> Self {
        self.distance = Some(distance.into());
        self
    }

    pub fn duration(mut self, ms: impl Into<f64>) -> Self {
        self.duration = Some(ms.into());
        self
    }

    pub fn delay(mut self, ms: impl Into<f64>) -> Self {
        self.delay = Some(ms.into());
        self
    }

    pub fn easing(mut self, easing: impl Into<String>) -> Self {
        self.easing = Some(easing.into());
        self
    }

    pub fn opacity(mut self, opacity: Option<f32>) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn rotate(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotate = Some(RotateOverrides {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        });
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn container(mut self, container: impl Into<ContainerSpec>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn desktop(mut self, enabled: bool) -> Self {
        self.desktop = Some(enabled);
        self
    }

    pub fn mobile(mut self, enabled: bool) -> Self {
        self.mobile = Some(enabled);
        self
    }

    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = Some(reset);
        self
    }

    pub fn use_delay(mut self, use_delay: UseDelay) -> Self {
        self.use_delay = Some(use_delay);
        self
    }

    pub fn view_factor(mut self, factor: f32) -> Self {
        self.view_factor = Some(factor);
        self
    }

    pub fn view_offset(mut self, offset: Insets) -> Self {
        self.view_offset = Some(InsetOverrides {
            top: Some(offset.top),
            right: Some(offset.right),
            bottom: Some(offset.bottom),
            left: Some(offset.left),
        });
        self
    }

    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    pub fn recheck_sequence(mut self, recheck: bool) -> Self {
        self.recheck_sequence = Some(recheck);
        self
    }

    pub fn hook(mut self, kind: HookKind, hook: Hook) -> Self {
        self.hooks.set(kind, hook);
        self
    }

    pub fn before_reveal(self, hook: Hook) -> Self {
        self.hook(HookKind::BeforeReveal, hook)
    }

    pub fn after_reveal(self, hook: Hook) -> Self {
        self.hook(HookKind::AfterReveal, hook)
    }

    pub fn before_reset(self, hook: Hook) -> Self {
        self.hook(HookKind::BeforeReset, hook)
    }

    pub fn after_reset(self, hook: Hook) -> Self {
        self.hook(HookKind::AfterReset, hook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = RevealOptions::default()
            .merged(&RevealOverrides::default())
            .unwrap();
        assert_eq!(options.duration, 600);
        assert_eq!(options.opacity, Some(0.0));
        assert_eq!(options.origin, Origin::Bottom);
        assert!(!options.reset);
    }

    #[test]
    fn test_distance_parsing() {
        assert_eq!("20px".parse::<Distance>().unwrap(), Distance::px(20.0));
        assert_eq!(
            "1.5rem".parse::<Distance>().unwrap(),
            Distance {
                value: 1.5,
                unit: LengthUnit::Rem
            }
        );
        assert_eq!("-10%".parse::<Distance>().unwrap().unit, LengthUnit::Percent);
        assert_eq!("0".parse::<Distance>().unwrap(), Distance::ZERO);

        assert!("20".parse::<Distance>().is_err());
        assert!("20pt".parse::<Distance>().is_err());
        assert!("px".parse::<Distance>().is_err());
        assert!("".parse::<Distance>().is_err());
    }

    #[test]
    fn test_distance_display() {
        assert_eq!(Distance::px(20.0).to_string(), "20px");
        assert_eq!(
            Distance {
                value: 0.5,
                unit: LengthUnit::Em
            }
            .to_string(),
            "0.5em"
        );
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let result = RevealOptions::default().merged(&RevealOverrides::new().delay(-5));
        assert!(matches!(result, Err(RevealError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_malformed_distance_is_rejected() {
        let result = RevealOptions::default().merged(&RevealOverrides::new().distance("far"));
        assert!(matches!(result, Err(RevealError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_opacity_range() {
        let base = RevealOptions::default();
        assert!(base.merged(&RevealOverrides::new().opacity(Some(1.5))).is_err());
        assert_eq!(
            base.merged(&RevealOverrides::new().opacity(None))
                .unwrap()
                .opacity,
            None
        );
    }

    #[test]
    fn test_view_factor_is_clamped() {
        let options = RevealOptions::default()
            .merged(&RevealOverrides::new().view_factor(3.0))
            .unwrap();
        assert_eq!(options.view_factor, 1.0);
    }

    #[test]
    fn test_nested_merge_is_partial() {
        let base = RevealOptions::default()
            .merged(&RevealOverrides::new().rotate(10.0, 20.0, 30.0))
            .unwrap();
        let overrides = RevealOverrides::from_json(r#"{ "rotate": { "y": 5 } }"#).unwrap();
        let merged = base.merged(&overrides).unwrap();
        assert_eq!(
            merged.rotate,
            Rotate {
                x: 10.0,
                y: 5.0,
                z: 30.0
            }
        );
    }

    #[test]
    fn test_json_overrides() {
        let overrides = RevealOverrides::from_json(
            r#"{
                "origin": "left",
                "distance": "3em",
                "duration": 1000,
                "opacity": null,
                "container": ".scroller",
                "useDelay": "onload",
                "viewOffset": { "top": 64 }
            }"#,
        )
        .unwrap();
        let options = RevealOptions::default().merged(&overrides).unwrap();

        assert_eq!(options.origin, Origin::Left);
        assert_eq!(options.duration, 1000);
        assert_eq!(options.opacity, None);
        assert_eq!(
            options.container,
            ContainerSpec::Selector(".scroller".to_string())
        );
        assert_eq!(options.use_delay, UseDelay::OnLoad);
        assert_eq!(options.view_offset.top, 64.0);
        assert_eq!(options.view_offset.bottom, 0.0);
    }

    #[test]
    fn test_absent_opacity_keeps_base() {
        let overrides = RevealOverrides::from_json(r#"{ "scale": 0.8 }"#).unwrap();
        assert_eq!(overrides.opacity, None);
        let options = RevealOptions::default().merged(&overrides).unwrap();
        assert_eq!(options.opacity, Some(0.0));
    }

    #[test]
    fn test_toml_overrides() {
        let overrides = RevealOverrides::from_toml(
            r#"
            reset = true
            delay = 250
            easing = "ease-in-out"

            [rotate]
            z = 15
            "#,
        )
        .unwrap();
        let options = RevealOptions::default().merged(&overrides).unwrap();

        assert!(options.reset);
        assert_eq!(options.delay, 250);
        assert_eq!(options.easing, "ease-in-out");
        assert_eq!(options.rotate.z, 15.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let result = RevealOverrides::from_json(r#"{ "distanse": "20px" }"#);
        assert!(matches!(result, Err(RevealError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_interval_validation() {
        assert!(validate_interval(15).is_err());
        assert_eq!(validate_interval(16).unwrap(), 16);
    }

    #[test]
    fn test_root_container_aliases() {
        assert_eq!(ContainerSpec::from(":root"), ContainerSpec::Root);
        assert_eq!(ContainerSpec::from(""), ContainerSpec::Root);
        assert_eq!(
            ContainerSpec::from("#feed"),
            ContainerSpec::Selector("#feed".to_string())
        );
    }

    #[test]
    fn test_use_delay_policies() {
        assert!(UseDelay::Always.applies(false, false));
        assert!(UseDelay::Once.applies(true, false));
        assert!(!UseDelay::Once.applies(false, true));
        assert!(UseDelay::OnLoad.applies(false, true));
        assert!(!UseDelay::OnLoad.applies(true, false));
    }
}
