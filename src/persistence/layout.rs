//! Layout serialization for save/load functionality.
//!
//! A layout captures everything needed to rebuild a widget page: the global
//! settings and colors, the transmission destination, and every widget with
//! its placement, value, and named properties.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ManagerError, ManagerResult};
use crate::registry::{ColorScheme, GlobalSettings, WidgetManager};
use crate::surface::{ParentRef, Placement, SurfaceProvider};
use crate::transmit::Destination;

/// Current layout format version.
/// Increment this when making breaking changes to the format.
pub const LAYOUT_VERSION: u32 = 1;

/// A complete widget page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Human-readable name for the layout.
    pub name: String,
    /// Layout format version for future compatibility.
    pub version: u32,
    #[serde(default)]
    pub settings: GlobalSettings,
    #[serde(default)]
    pub colors: ColorScheme,
    #[serde(default)]
    pub transmit: TransmitConfig,
    /// Widgets in creation order.
    #[serde(default)]
    pub widgets: Vec<LayoutWidget>,
}

impl Layout {
    /// Create a new empty layout with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: LAYOUT_VERSION,
            settings: GlobalSettings::default(),
            colors: ColorScheme::default(),
            transmit: TransmitConfig::default(),
            widgets: Vec::new(),
        }
    }

    /// Check if this layout version is compatible with the current format.
    pub fn is_compatible(&self) -> bool {
        self.version <= LAYOUT_VERSION
    }

    /// Snapshot of a manager's widgets and globals.
    ///
    /// Widgets are listed by identifier; each is saved under its identifier
    /// so reloading reproduces the same names. A widget inside a named
    /// container keeps that container as its parent. Custom destinations
    /// cannot be saved and are recorded as local.
    pub fn capture<S: SurfaceProvider>(manager: &WidgetManager<S>) -> Self {
        let mut ids: Vec<&str> = manager.widgets().ids().collect();
        ids.sort_unstable();

        let widgets = ids
            .into_iter()
            .filter_map(|id| {
                let widget = manager.get(id)?;
                let surfaces = manager.surfaces();
                let surface = manager.surface_of(id);
                let geometry = surface
                    .and_then(|s| surfaces.geometry(s))
                    .unwrap_or_default();

                let mut placement = Placement::named(id);
                if geometry.absolute {
                    placement.x = geometry.left;
                    placement.y = geometry.top;
                }
                placement.w = geometry.width;
                placement.h = geometry.height;
                placement.parent = surface
                    .and_then(|s| surfaces.parent_of(s))
                    .filter(|&p| p != surfaces.root())
                    .and_then(|p| surfaces.id(p))
                    .map(ParentRef::from);

                Some(LayoutWidget {
                    widget_type: widget.widget_type().to_string(),
                    placement,
                    value: Some(widget.value()).filter(|v| !v.is_null()),
                    properties: widget.state().properties.clone(),
                })
            })
            .collect();

        let transmit = match manager.transmit_hub().destination() {
            Destination::Relay(relay) => TransmitConfig {
                destination: "relay".to_string(),
                endpoint: Some(relay.endpoint().to_string()),
            },
            _ => TransmitConfig::default(),
        };

        Self {
            name: "Untitled".to_string(),
            version: LAYOUT_VERSION,
            settings: manager.settings().clone(),
            colors: manager.colors().clone(),
            transmit,
            widgets,
        }
    }

    /// Applies globals and destination, then creates every widget.
    ///
    /// Returns the identifiers created. Stops at the first widget whose type
    /// is unknown; widgets created before it stay registered.
    pub fn apply_to<S: SurfaceProvider>(
        &self,
        manager: &mut WidgetManager<S>,
    ) -> ManagerResult<Vec<String>> {
        if !self.is_compatible() {
            return Err(ManagerError::IncompatibleLayout {
                found: self.version,
                expected: LAYOUT_VERSION,
            });
        }

        manager.apply_settings(self.settings.clone());
        manager.apply_color_scheme(self.colors.clone());
        manager.sends_to(&self.transmit.destination, self.transmit.endpoint.as_deref())?;

        let mut created = Vec::with_capacity(self.widgets.len());
        for entry in &self.widgets {
            let Some(id) = manager.create(&entry.widget_type, &entry.placement)? else {
                tracing::warn!(widget_type = %entry.widget_type, "layout widget skipped");
                continue;
            };
            if let Some(widget) = manager.get_mut(&id) {
                for (name, value) in &entry.properties {
                    widget.state_mut().set_property(name, value);
                }
            }
            if let Some(value) = &entry.value {
                manager.set_value(&id, value, false)?;
            }
            created.push(id);
        }

        tracing::info!(layout = %self.name, widgets = created.len(), "layout applied");
        Ok(created)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Saved transmission destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmitConfig {
    /// Short destination name (`js`, `ajax`, `relay`, `node`).
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            destination: "js".to_string(),
            endpoint: None,
        }
    }
}

/// Serialized data for a single widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutWidget {
    /// Catalog type name (e.g., "dial", "slider").
    #[serde(rename = "type")]
    pub widget_type: String,
    #[serde(flatten)]
    pub placement: Placement,
    /// Value restored without transmitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl LayoutWidget {
    pub fn new(widget_type: impl Into<String>, placement: Placement) -> Self {
        Self {
            widget_type: widget_type.into(),
            placement,
            value: None,
            properties: BTreeMap::new(),
        }
    }
}

/// Save a layout to a JSON file.
pub fn save_to_file(layout: &Layout, path: &Path) -> ManagerResult<()> {
    let json = serde_json::to_string_pretty(layout)?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), "layout saved");
    Ok(())
}

/// Load a layout from a JSON file.
pub fn load_from_file(path: &Path) -> ManagerResult<Layout> {
    let json = std::fs::read_to_string(path)?;
    let layout: Layout = serde_json::from_str(&json)?;

    if !layout.is_compatible() {
        return Err(ManagerError::IncompatibleLayout {
            found: layout.version,
            expected: LAYOUT_VERSION,
        });
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Layout {
        let mut layout = Layout::new("Mixer");
        layout.colors.set("accent", "#00aaff");
        layout.settings.widget.show_labels = true;

        let mut fader = LayoutWidget::new("slider", Placement::at(10.0, 20.0).with_size(30.0, 120.0));
        fader.value = Some(json!(0.75));
        fader.properties.insert("orientation".into(), json!("vertical"));
        layout.widgets.push(fader);

        let mut master = LayoutWidget::new("dial", Placement::named("master"));
        master.value = Some(json!(0.5));
        layout.widgets.push(master);
        layout.widgets.push(LayoutWidget::new("button", Placement::default()));
        layout
    }

    #[test]
    fn test_widget_json_shape() {
        let widget = LayoutWidget::new("dial", Placement::at(5.0, 6.0).with_name("gain"));
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json, json!({"type": "dial", "x": 5.0, "y": 6.0, "name": "gain"}));
    }

    #[test]
    fn test_minimal_layout_uses_defaults() {
        let layout: Layout = serde_json::from_str(
            r#"{"name": "Tiny", "version": 1, "widgets": [{"type": "dial"}]}"#,
        )
        .unwrap();
        assert_eq!(layout.settings, GlobalSettings::default());
        assert_eq!(layout.transmit.destination, "js");
        assert_eq!(layout.widgets[0].placement, Placement::default());
    }

    #[test]
    fn test_apply_creates_widgets_with_values() {
        let mut manager = WidgetManager::headless();
        let ids = sample().apply_to(&mut manager).unwrap();
        assert_eq!(ids, vec!["slider1", "master", "button1"]);

        assert_eq!(manager.colors().get("accent"), Some("#00aaff"));
        let slider = manager.get("slider1").unwrap();
        assert_eq!(slider.value(), json!(0.75));
        assert!(slider.state().settings.show_labels);
        assert_eq!(slider.state().properties.get("orientation"), Some(&json!("vertical")));
        assert_eq!(manager.get("master").unwrap().value(), json!(0.5));
    }

    #[test]
    fn test_apply_does_not_transmit_restored_values() {
        let mut manager = WidgetManager::headless();
        let count = std::rc::Rc::new(std::cell::Cell::new(0));
        let hits = std::rc::Rc::clone(&count);
        manager.on_any(move |_, _| hits.set(hits.get() + 1));

        sample().apply_to(&mut manager).unwrap();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_capture_then_apply_reproduces_page() {
        let mut original = WidgetManager::headless();
        sample().apply_to(&mut original).unwrap();
        let captured = Layout::capture(&original);

        let mut rebuilt = WidgetManager::headless();
        let ids = captured.apply_to(&mut rebuilt).unwrap();
        assert_eq!(ids, vec!["button1", "master", "slider1"]);
        assert_eq!(Layout::capture(&rebuilt).widgets, captured.widgets);

        let slider = &captured.widgets[2];
        assert_eq!(slider.placement.x, Some(10.0));
        assert_eq!(slider.placement.h, Some(120.0));
        assert_eq!(slider.value, Some(json!(0.75)));
    }

    #[test]
    fn test_capture_keeps_named_container() {
        let mut original = WidgetManager::headless();
        original.surfaces_mut().create_container("rack", None);
        original
            .create("dial", &Placement::default().with_parent("rack"))
            .unwrap();
        original.create("dial", &Placement::default()).unwrap();

        let captured = Layout::capture(&original);
        assert_eq!(
            captured.widgets[0].placement.parent,
            Some(ParentRef::Id("rack".to_string()))
        );
        assert_eq!(captured.widgets[1].placement.parent, None);

        let mut rebuilt = WidgetManager::headless();
        let rack = rebuilt.surfaces_mut().create_container("rack", None);
        captured.apply_to(&mut rebuilt).unwrap();
        let surface = rebuilt.surface_of("dial1").unwrap();
        assert_eq!(rebuilt.surfaces().parent_of(surface), Some(rack));
    }

    #[test]
    fn test_unknown_type_stops_apply() {
        let mut layout = Layout::new("Broken");
        layout.widgets.push(LayoutWidget::new("dial", Placement::default()));
        layout.widgets.push(LayoutWidget::new("gauge", Placement::default()));

        let mut manager = WidgetManager::headless();
        let err = layout.apply_to(&mut manager).unwrap_err();
        assert!(matches!(err, ManagerError::UnknownWidgetType(_)));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_version_compatibility() {
        let layout = Layout::new("Test");
        assert!(layout.is_compatible());

        let future = Layout {
            version: LAYOUT_VERSION + 1,
            ..Layout::new("Future")
        };
        assert!(!future.is_compatible());
        let err = future.apply_to(&mut WidgetManager::headless()).unwrap_err();
        assert!(matches!(err, ManagerError::IncompatibleLayout { found: 2, expected: 1 }));
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("layout-test-{}.json", std::process::id()));
        save_to_file(&sample(), &path).unwrap();
        let loaded = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_load_rejects_future_version() {
        let path = std::env::temp_dir().join(format!("layout-future-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"name": "Next", "version": 99}"#).unwrap();
        let result = load_from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(ManagerError::IncompatibleLayout { found: 99, .. })
        ));
    }
}
