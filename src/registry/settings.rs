//! Shared settings pushed from the manager to every widget.
//!
//! The manager owns one `GlobalSettings` and one `ColorScheme`. Widgets receive
//! copies at creation; later broadcasts overwrite the copies explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default throttle period for widget transmissions, in milliseconds.
pub const DEFAULT_THROTTLE_PERIOD_MS: u64 = 20;

/// Default animation tick period, in milliseconds.
pub const DEFAULT_ANIMATION_PERIOD_MS: u64 = 30;

/// Color aspect used when `recolor` is given only a color.
pub const DEFAULT_ASPECT: &str = "accent";

/// Aspect name → color string.
///
/// Values are not validated; whatever string is set is what widgets receive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorScheme(BTreeMap<String, String>);

impl ColorScheme {
    /// An empty scheme with no aspects.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Dark variant used by the desktop host.
    pub fn dark() -> Self {
        Self::from_pairs(&[
            ("accent", "#42a5f5"),
            ("fill", "#2d2d46"),
            ("border", "#3c3c50"),
            ("black", "#f0f0f5"),
            ("white", "#1a1a2e"),
        ])
    }

    /// Looks up a named preset (`"default"` or `"dark"`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(aspect, color)| (aspect.to_string(), color.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, aspect: &str) -> Option<&str> {
        self.0.get(aspect).map(String::as_str)
    }

    pub fn set(&mut self, aspect: impl Into<String>, color: impl Into<String>) {
        self.0.insert(aspect.into(), color.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::from_pairs(&[
            ("accent", "#ff5500"),
            ("fill", "#eeeeee"),
            ("border", "#bbbbbb"),
            ("black", "#000000"),
            ("white", "#ffffff"),
        ])
    }
}

/// Label font.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub family: String,
    pub size: f32,
    pub weight: String,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: "gill sans".to_string(),
            size: 14.0,
            weight: "bold".to_string(),
        }
    }
}

/// The per-widget subset of the global settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetSettings {
    /// Minimum milliseconds between two transmissions of one widget.
    pub throttle_period_ms: u64,
    pub show_labels: bool,
    pub font: FontSettings,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            throttle_period_ms: DEFAULT_THROTTLE_PERIOD_MS,
            show_labels: false,
            font: FontSettings::default(),
        }
    }
}

impl WidgetSettings {
    /// Applies a property by name to the typed fields.
    ///
    /// Returns false when the name is not a typed setting or the value has the
    /// wrong shape; callers then keep it in their untyped property bag.
    pub fn apply_property(&mut self, name: &str, value: &Value) -> bool {
        match name {
            "throttlePeriod" | "throttle_period_ms" => match as_millis(value) {
                Some(ms) => {
                    self.throttle_period_ms = ms;
                    true
                }
                None => false,
            },
            "showLabels" | "show_labels" => match value {
                Value::Bool(on) => {
                    self.show_labels = *on;
                    true
                }
                Value::String(s) => {
                    self.show_labels = s == "on";
                    true
                }
                _ => false,
            },
            "font" | "fontFamily" => match value.as_str() {
                Some(family) => {
                    self.font.family = family.to_string();
                    true
                }
                None => false,
            },
            "fontSize" => match value.as_f64() {
                Some(size) => {
                    self.font.size = size as f32;
                    true
                }
                None => false,
            },
            "fontWeight" => match value {
                Value::String(weight) => {
                    self.font.weight = weight.clone();
                    true
                }
                Value::Number(n) => {
                    self.font.weight = n.to_string();
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

fn as_millis(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64))
}

/// Settings owned by the manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    #[serde(flatten)]
    pub widget: WidgetSettings,
    /// Bind every new widget in the exposure namespace.
    pub global_widgets: bool,
    pub animation_period_ms: u64,
    /// Properties set by name that have no typed field.
    pub extra: BTreeMap<String, Value>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            widget: WidgetSettings::default(),
            global_widgets: true,
            animation_period_ms: DEFAULT_ANIMATION_PERIOD_MS,
            extra: BTreeMap::new(),
        }
    }
}

impl GlobalSettings {
    /// Sets a property by name, typed when known, into `extra` otherwise.
    pub fn set_property(&mut self, name: &str, value: &Value) {
        if self.widget.apply_property(name, value) {
            return;
        }
        let applied = match name {
            "globalWidgets" | "global_widgets" => value.as_bool().map(|on| self.global_widgets = on),
            "animationPeriod" | "animation_period_ms" => {
                as_millis(value).map(|ms| self.animation_period_ms = ms)
            }
            _ => None,
        };
        if applied.is_none() {
            self.extra.insert(name.to_string(), value.clone());
        }
    }
}
