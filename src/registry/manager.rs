//! Widget registry and dispatch manager.
//!
//! `WidgetManager` owns every live widget, the naming ledger, the shared colors
//! and settings, the animation callbacks, and the transmission hub. It is an
//! ordinary value owned by the application; nothing here is global.

use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use serde_json::Value;

use super::animation::{AnimationClock, Animator, CallbackId, TickReport};
use super::catalog::WidgetCatalog;
use super::settings::{ColorScheme, GlobalSettings, DEFAULT_ASPECT};
use super::widget::{Interaction, Widget, WidgetSet, WidgetState};
use crate::error::{ManagerError, ManagerResult};
use crate::surface::{HeadlessSurfaces, NodeHandle, Placement, SurfaceProvider};
use crate::transmit::{Destination, Transmission, TransmitHub};

/// Result of adopting every untransformed surface.
#[derive(Debug, Default)]
pub struct AdoptReport {
    /// Identifiers of the widgets created, in surface order.
    pub created: Vec<String>,
    /// Surfaces whose type could not be built.
    pub failed: Vec<(NodeHandle, ManagerError)>,
}

/// The widget registry and dispatcher.
pub struct WidgetManager<S: SurfaceProvider = HeadlessSurfaces> {
    surfaces: S,
    catalog: WidgetCatalog,
    widgets: WidgetSet,
    /// Widget identifier → backing surface.
    surface_of: HashMap<String, NodeHandle>,
    /// One entry per widget created, in creation order.
    type_counts: Vec<String>,
    animator: Animator<WidgetSet>,
    clock: AnimationClock,
    colors: ColorScheme,
    settings: GlobalSettings,
    transmit: TransmitHub,
    exposed: BTreeSet<String>,
}

impl WidgetManager<HeadlessSurfaces> {
    /// A manager over an in-memory surface tree with the built-in widgets.
    pub fn headless() -> Self {
        Self::new(HeadlessSurfaces::new(), WidgetCatalog::with_builtins())
    }
}

impl<S: SurfaceProvider> WidgetManager<S> {
    pub fn new(surfaces: S, catalog: WidgetCatalog) -> Self {
        Self::with_settings(surfaces, catalog, GlobalSettings::default(), ColorScheme::default())
    }

    pub fn with_settings(
        surfaces: S,
        catalog: WidgetCatalog,
        settings: GlobalSettings,
        colors: ColorScheme,
    ) -> Self {
        let clock = AnimationClock::new(Duration::from_millis(settings.animation_period_ms));
        Self {
            surfaces,
            catalog,
            widgets: WidgetSet::new(),
            surface_of: HashMap::new(),
            type_counts: Vec::new(),
            animator: Animator::new(),
            clock,
            colors,
            settings,
            transmit: TransmitHub::new(),
            exposed: BTreeSet::new(),
        }
    }

    // --- creation -------------------------------------------------------

    /// Creates a surface for `widget_type`, places it, and transforms it.
    ///
    /// An empty type, or a name already owned by a widget, creates nothing
    /// and returns `Ok(None)`. An empty name counts as no name.
    pub fn create(
        &mut self,
        widget_type: &str,
        placement: &Placement,
    ) -> ManagerResult<Option<String>> {
        if widget_type.is_empty() {
            return Ok(None);
        }
        if !self.catalog.contains(widget_type) {
            tracing::error!(widget_type, "unknown widget type");
            return Err(ManagerError::unknown_widget_type(widget_type));
        }
        let name = placement.name.as_deref().filter(|n| !n.is_empty());
        if let Some(name) = name {
            if self.widgets.contains(name) {
                tracing::debug!(id = name, "name already registered");
                return Ok(None);
            }
        }

        let surface = self.surfaces.create_surface(widget_type);
        if placement.x.is_some() || placement.y.is_some() {
            self.surfaces.set_position(surface, placement.x, placement.y);
        }
        if placement.w.is_some() || placement.h.is_some() {
            self.surfaces.set_size(surface, placement.w, placement.h);
        }

        let parent = placement
            .parent
            .as_ref()
            .and_then(|p| self.surfaces.resolve_parent(p))
            .unwrap_or_else(|| self.surfaces.root());

        if let Some(name) = name {
            self.surfaces.set_id(surface, name);
        }
        self.surfaces.set_parent(surface, parent);

        self.transform(surface, None)
    }

    /// Turns an existing surface into a registered widget.
    ///
    /// Returns `Ok(None)` when the surface is already registered or has no
    /// type. Fails with `UnknownWidgetType` before touching the registry.
    pub fn transform(
        &mut self,
        surface: NodeHandle,
        explicit_type: Option<&str>,
    ) -> ManagerResult<Option<String>> {
        let existing_id = self.surfaces.id(surface).map(str::to_string);
        if let Some(id) = existing_id.as_deref() {
            if self.widgets.contains(id) {
                tracing::debug!(id, "surface already registered");
                return Ok(None);
            }
        }

        let widget_type = match explicit_type
            .filter(|t| !t.is_empty())
            .or_else(|| self.surfaces.widget_type(surface))
            .filter(|t| !t.is_empty())
        {
            Some(t) => t.to_string(),
            None => return Ok(None),
        };

        if !self.catalog.contains(&widget_type) {
            tracing::error!(widget_type = %widget_type, "unknown widget type");
            return Err(ManagerError::unknown_widget_type(widget_type));
        }

        let id = match existing_id {
            Some(id) => id,
            None => {
                let id = self.next_auto_id(&widget_type);
                self.surfaces.set_id(surface, &id);
                id
            }
        };

        let state = WidgetState::new(
            id.clone(),
            widget_type.clone(),
            &self.colors,
            &self.settings.widget,
        );
        let widget = self
            .catalog
            .create(&widget_type, state)
            .ok_or_else(|| ManagerError::unknown_widget_type(widget_type.clone()))?;

        let widget = match self.widgets.insert(widget) {
            Ok(widget) => widget,
            Err(_) => return Ok(None),
        };
        self.type_counts.push(widget_type.clone());
        self.surface_of.insert(id.clone(), surface);
        if self.settings.global_widgets {
            self.exposed.insert(id.clone());
        }

        tracing::info!(id = %id, widget_type = %widget_type, "widget created");
        widget.init();
        Ok(Some(id))
    }

    /// `type + (ledger count + 1)`, skipping forward past identifiers already
    /// taken by explicitly named widgets.
    fn next_auto_id(&self, widget_type: &str) -> String {
        let mut n = self.type_count(widget_type) + 1;
        loop {
            let id = format!("{widget_type}{n}");
            if !self.widgets.contains(&id) && self.surfaces.find(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    /// Transforms every surface that carries a type tag but no widget yet.
    pub fn adopt_all(&mut self) -> AdoptReport {
        let mut report = AdoptReport::default();
        for surface in self.surfaces.surfaces() {
            let registered = self
                .surfaces
                .id(surface)
                .is_some_and(|id| self.widgets.contains(id));
            if registered {
                continue;
            }
            match self.transform(surface, None) {
                Ok(Some(id)) => report.created.push(id),
                Ok(None) => {}
                Err(err) => report.failed.push((surface, err)),
            }
        }
        report
    }

    // --- lookup ---------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&(dyn Widget + 'static)> {
        self.widgets.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut (dyn Widget + 'static)> {
        self.widgets.get_mut(id)
    }

    pub fn widgets(&self) -> &WidgetSet {
        &self.widgets
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Identifiers of widgets of `widget_type`, sorted.
    pub fn widgets_of_type(&self, widget_type: &str) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .widgets
            .iter()
            .filter(|w| w.widget_type() == widget_type)
            .map(|w| w.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of widgets of `widget_type` created so far.
    pub fn type_count(&self, widget_type: &str) -> usize {
        self.type_counts.iter().filter(|t| *t == widget_type).count()
    }

    pub fn surface_of(&self, id: &str) -> Option<NodeHandle> {
        self.surface_of.get(id).copied()
    }

    pub fn surfaces(&self) -> &S {
        &self.surfaces
    }

    pub fn surfaces_mut(&mut self) -> &mut S {
        &mut self.surfaces
    }

    pub fn catalog(&self) -> &WidgetCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut WidgetCatalog {
        &mut self.catalog
    }

    pub fn colors(&self) -> &ColorScheme {
        &self.colors
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    // --- exposure -------------------------------------------------------

    /// A widget bound in the exposure namespace.
    pub fn exposed(&self, id: &str) -> Option<&(dyn Widget + 'static)> {
        if self.exposed.contains(id) {
            self.widgets.get(id)
        } else {
            None
        }
    }

    pub fn exposed_ids(&self) -> impl Iterator<Item = &str> {
        self.exposed.iter().map(String::as_str)
    }

    /// Binds an existing widget in the exposure namespace.
    pub fn expose(&mut self, id: &str) -> bool {
        if self.widgets.contains(id) {
            self.exposed.insert(id.to_string())
        } else {
            false
        }
    }

    // --- dispatch -------------------------------------------------------

    /// Sends a widget's changed value to the destination and wildcard listeners.
    pub fn dispatch_value(&mut self, id: &str, data: &Value) -> ManagerResult<usize> {
        if !self.widgets.contains(id) {
            return Err(ManagerError::unknown_widget(id));
        }
        Ok(self.transmit.transmit(id, data))
    }

    /// Routes an interaction to a widget; a reported change is redrawn and dispatched.
    pub fn interact(&mut self, id: &str, interaction: Interaction) -> ManagerResult<Option<Value>> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| ManagerError::unknown_widget(id))?;
        let Some(value) = widget.handle_interaction(interaction) else {
            return Ok(None);
        };
        widget.draw();
        self.transmit.transmit(id, &value);
        Ok(Some(value))
    }

    /// Sets a widget's value from code, optionally transmitting it.
    pub fn set_value(&mut self, id: &str, value: &Value, transmit: bool) -> ManagerResult<Value> {
        let widget = self
            .widgets
            .get_mut(id)
            .ok_or_else(|| ManagerError::unknown_widget(id))?;
        let stored = widget.set_value(value);
        widget.draw();
        if transmit {
            self.transmit.transmit(id, &stored);
        }
        Ok(stored)
    }

    pub fn transmit_hub(&self) -> &TransmitHub {
        &self.transmit
    }

    pub fn transmit_hub_mut(&mut self) -> &mut TransmitHub {
        &mut self.transmit
    }

    /// Selects a built-in destination by short name (`js`, `ajax`, `relay`, `node`).
    pub fn sends_to(&mut self, name: &str, endpoint: Option<&str>) -> ManagerResult<()> {
        self.transmit.sends_to(name, endpoint)
    }

    pub fn set_destination(&mut self, destination: Destination) {
        self.transmit.set_destination(destination);
    }

    /// Sends every transmission unit to `callback` instead of a built-in destination.
    pub fn set_transmit_fn<F>(&mut self, callback: F)
    where
        F: FnMut(&Transmission) + 'static,
    {
        self.transmit
            .set_destination(Destination::Custom(Box::new(callback)));
    }

    /// Subscribes to one event of one widget (`"*"` for all its events).
    pub fn on<F>(&mut self, widget: &str, event: &str, callback: F)
    where
        F: FnMut(&Transmission) + 'static,
    {
        self.transmit.on(widget, event, callback);
    }

    /// Subscribes to every widget event.
    pub fn on_any<F>(&mut self, callback: F)
    where
        F: FnMut(&str, &Value) + 'static,
    {
        self.transmit.on_any(callback);
    }

    // --- broadcast ------------------------------------------------------

    fn broadcast<F>(&mut self, mut update: F)
    where
        F: FnMut(&mut WidgetState),
    {
        for widget in self.widgets.iter_mut() {
            update(widget.state_mut());
            widget.draw();
        }
    }

    /// Sets one color aspect globally and on every widget, then redraws.
    pub fn recolor(&mut self, aspect: &str, color: &str) {
        tracing::debug!(aspect, color, "recolor");
        self.colors.set(aspect, color);
        self.broadcast(|state| state.colors.set(aspect, color));
    }

    /// `recolor` of the accent aspect.
    pub fn recolor_accent(&mut self, color: &str) {
        self.recolor(DEFAULT_ASPECT, color);
    }

    /// Replaces the whole scheme globally and on every widget.
    pub fn apply_color_scheme(&mut self, colors: ColorScheme) {
        self.broadcast(|state| state.colors = colors.clone());
        self.colors = colors;
    }

    /// Pushes a new throttle period to every widget.
    pub fn set_throttle_period(&mut self, ms: u64) {
        self.settings.widget.throttle_period_ms = ms;
        for widget in self.widgets.iter_mut() {
            widget.state_mut().settings.throttle_period_ms = ms;
        }
    }

    /// `"on"` shows labels; anything else hides them. Redraws every widget.
    pub fn set_labels(&mut self, flag: &str) {
        let on = flag == "on";
        self.settings.widget.show_labels = on;
        self.broadcast(|state| state.settings.show_labels = on);
    }

    /// Sets a named property globally and on every widget, then redraws.
    pub fn set_property(&mut self, name: &str, value: Value) {
        tracing::debug!(name, value = %value, "set property");
        self.settings.set_property(name, &value);
        if let Some(ms) = self.animation_period_change(name) {
            self.clock.set_period(ms);
        }
        self.broadcast(|state| state.set_property(name, &value));
    }

    fn animation_period_change(&self, name: &str) -> Option<Duration> {
        matches!(name, "animationPeriod" | "animation_period_ms")
            .then(|| Duration::from_millis(self.settings.animation_period_ms))
    }

    /// Replaces the global settings, pushes the widget settings to every
    /// widget, and redraws.
    pub fn apply_settings(&mut self, settings: GlobalSettings) {
        self.clock
            .set_period(Duration::from_millis(settings.animation_period_ms));
        self.broadcast(|state| state.settings = settings.widget.clone());
        self.settings = settings;
    }

    /// Redraws every widget once.
    pub fn redraw_all(&mut self) {
        for widget in self.widgets.iter_mut() {
            widget.draw();
        }
    }

    // --- animation ------------------------------------------------------

    /// Registers a callback run on every tick, after those already registered.
    pub fn add_animation<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&mut WidgetSet) -> anyhow::Result<()> + 'static,
    {
        self.animator.add(callback)
    }

    /// Removes an animation callback. Unknown ids are ignored.
    pub fn remove_animation(&mut self, id: CallbackId) -> bool {
        self.animator.remove(id)
    }

    pub fn animation_count(&self) -> usize {
        self.animator.len()
    }

    /// Starts the fixed-period clock; the first tick is due one period from `now`.
    pub fn start_animation(&mut self, now: Instant) {
        self.clock.start(now);
    }

    /// Clears the pending tick.
    pub fn stop_animation(&mut self) {
        self.clock.stop();
    }

    pub fn is_animating(&self) -> bool {
        self.clock.is_running()
    }

    pub fn set_animation_period(&mut self, ms: u64) {
        self.settings.animation_period_ms = ms;
        self.clock.set_period(Duration::from_millis(ms));
    }

    /// Runs a tick if one is due at `now`.
    pub fn update(&mut self, now: Instant) -> Option<TickReport> {
        if self.clock.poll(now) {
            Some(self.tick())
        } else {
            None
        }
    }

    /// Runs one tick immediately.
    pub fn tick(&mut self) -> TickReport {
        self.animator.tick(&mut self.widgets)
    }

    /// Time until the next tick, `None` when stopped.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.clock.time_until_due(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::widget::test_support::recorder;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager() -> WidgetManager {
        let mut catalog = WidgetCatalog::new();
        catalog.register("dial", recorder).unwrap();
        catalog.register("slider", recorder).unwrap();
        WidgetManager::new(HeadlessSurfaces::new(), catalog)
    }

    fn create(m: &mut WidgetManager, widget_type: &str) -> String {
        m.create(widget_type, &Placement::default()).unwrap().unwrap()
    }

    fn draws(m: &WidgetManager, id: &str) -> u64 {
        m.get(id).unwrap().state().draw_count
    }

    #[test]
    fn test_auto_ids_are_sequential_per_type() {
        let mut m = manager();
        assert_eq!(create(&mut m, "dial"), "dial1");
        assert_eq!(create(&mut m, "dial"), "dial2");
        assert_eq!(create(&mut m, "slider"), "slider1");
        assert_eq!(create(&mut m, "dial"), "dial3");
        assert_eq!(m.type_count("dial"), 3);
        assert_eq!(m.len(), 4);
    }

    #[test]
    fn test_named_widget_still_counts_in_ledger() {
        let mut m = manager();
        assert_eq!(create(&mut m, "dial"), "dial1");
        let named = m.create("dial", &Placement::named("mainDial")).unwrap();
        assert_eq!(named.as_deref(), Some("mainDial"));
        assert_eq!(m.type_count("dial"), 2);
        assert_eq!(create(&mut m, "dial"), "dial3");
        assert!(m.get("dial2").is_none());
    }

    #[test]
    fn test_auto_id_skips_taken_names() {
        let mut m = manager();
        m.create("dial", &Placement::named("dial2")).unwrap();
        // ledger says 1 dial, so the next is dial2, which is taken
        assert_eq!(create(&mut m, "dial"), "dial3");
    }

    #[test]
    fn test_empty_name_is_auto_named() {
        let mut m = manager();
        let first = m.create("dial", &Placement::named("")).unwrap();
        let second = m.create("dial", &Placement::named("")).unwrap();
        assert_eq!(first.as_deref(), Some("dial1"));
        assert_eq!(second.as_deref(), Some("dial2"));
        assert!(m.get("").is_none());
    }

    #[test]
    fn test_taken_name_creates_nothing() {
        let mut m = manager();
        m.create("dial", &Placement::named("gain")).unwrap();
        assert_eq!(m.create("slider", &Placement::named("gain")).unwrap(), None);
        assert_eq!(m.surfaces().surfaces().len(), 1);
        assert_eq!(m.get("gain").unwrap().widget_type(), "dial");
        assert_eq!(m.type_count("slider"), 0);
    }

    #[test]
    fn test_empty_type_is_a_no_op() {
        let mut m = manager();
        assert_eq!(m.create("", &Placement::default()).unwrap(), None);
        assert!(m.surfaces().surfaces().is_empty());
        assert!(m.is_empty());
    }

    #[test]
    fn test_transform_twice_is_idempotent() {
        let mut m = manager();
        let surface = m.surfaces_mut().create_surface("dial");
        assert_eq!(m.transform(surface, None).unwrap().as_deref(), Some("dial1"));
        assert_eq!(m.transform(surface, None).unwrap(), None);
        assert_eq!(m.len(), 1);
        assert_eq!(m.type_count("dial"), 1);
    }

    #[test]
    fn test_transform_explicit_type_overrides_tag() {
        let mut m = manager();
        let surface = m.surfaces_mut().create_surface("dial");
        let id = m.transform(surface, Some("slider")).unwrap().unwrap();
        assert_eq!(id, "slider1");
        assert_eq!(m.get(&id).unwrap().widget_type(), "slider");
        assert_eq!(m.surfaces().id(surface), Some("slider1"));
    }

    #[test]
    fn test_transform_empty_explicit_type_uses_tag() {
        let mut m = manager();
        let surface = m.surfaces_mut().create_surface("slider");
        assert_eq!(m.transform(surface, Some("")).unwrap().as_deref(), Some("slider1"));
    }

    #[test]
    fn test_transform_without_type_is_a_no_op() {
        let mut m = manager();
        let surface = m.surfaces_mut().create_surface("");
        assert_eq!(m.transform(surface, None).unwrap(), None);
        assert!(m.is_empty());
    }

    #[test]
    fn test_unknown_type_fails_without_registering() {
        let mut m = manager();
        let err = m.create("gauge", &Placement::default()).unwrap_err();
        assert!(matches!(err, ManagerError::UnknownWidgetType(ref t) if t == "gauge"));
        assert!(m.is_empty());
        assert!(m.surfaces().surfaces().is_empty());
        assert_eq!(m.type_count("gauge"), 0);
        // the next valid creation is unaffected
        assert_eq!(create(&mut m, "dial"), "dial1");
    }

    #[test]
    fn test_init_called_and_globals_copied() {
        let mut m = manager();
        m.recolor("fill", "#101010");
        m.set_throttle_period(75);
        let id = create(&mut m, "dial");

        let state = m.get(&id).unwrap().state();
        assert_eq!(state.properties.get("initialized"), Some(&json!(true)));
        assert_eq!(state.color("fill"), Some("#101010"));
        assert_eq!(state.settings.throttle_period_ms, 75);
    }

    #[test]
    fn test_widget_copies_are_independent() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        m.get_mut(&id).unwrap().state_mut().colors.set("accent", "#00ff00");
        assert_eq!(m.colors().get("accent"), Some("#ff5500"));
    }

    #[test]
    fn test_placement_is_applied_to_surface() {
        let mut m = manager();
        let rack = m.surfaces_mut().create_container("rack", None);
        let id = m
            .create(
                "slider",
                &Placement::at(10.0, 20.0).with_size(30.0, 120.0).with_parent("rack"),
            )
            .unwrap()
            .unwrap();

        let surface = m.surface_of(&id).unwrap();
        let geometry = m.surfaces().geometry(surface).unwrap();
        assert!(geometry.absolute);
        assert_eq!((geometry.left, geometry.top), (Some(10.0), Some(20.0)));
        assert_eq!((geometry.width, geometry.height), (Some(30.0), Some(120.0)));
        assert_eq!(m.surfaces().parent_of(surface), Some(rack));
    }

    #[test]
    fn test_unresolved_parent_falls_back_to_root() {
        let mut m = manager();
        let id = m
            .create("dial", &Placement::default().with_parent("nowhere"))
            .unwrap()
            .unwrap();
        let surface = m.surface_of(&id).unwrap();
        assert_eq!(m.surfaces().parent_of(surface), Some(m.surfaces().root()));
        assert!(!m.surfaces().geometry(surface).unwrap().absolute);
    }

    #[test]
    fn test_recolor_updates_globals_and_redraws_once() {
        let mut m = manager();
        let a = create(&mut m, "dial");
        let b = create(&mut m, "slider");

        m.recolor("border", "#000000");
        assert_eq!(m.colors().get("border"), Some("#000000"));
        for id in [&a, &b] {
            assert_eq!(m.get(id).unwrap().state().color("border"), Some("#000000"));
            assert_eq!(draws(&m, id), 1);
        }
    }

    #[test]
    fn test_recolor_accent_matches_explicit_aspect() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        m.recolor_accent("#112233");
        assert_eq!(m.colors().get("accent"), Some("#112233"));
        assert_eq!(m.get(&id).unwrap().state().color("accent"), Some("#112233"));
    }

    #[test]
    fn test_set_labels_on_then_off() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        m.set_labels("on");
        assert!(m.settings().widget.show_labels);
        assert!(m.get(&id).unwrap().state().settings.show_labels);
        m.set_labels("off");
        assert!(!m.settings().widget.show_labels);
        assert!(!m.get(&id).unwrap().state().settings.show_labels);
        assert_eq!(draws(&m, &id), 2);

        m.set_labels("yes");
        assert!(!m.settings().widget.show_labels);
    }

    #[test]
    fn test_throttle_pushes_without_redraw() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        m.set_throttle_period(100);
        assert_eq!(m.settings().widget.throttle_period_ms, 100);
        assert_eq!(m.get(&id).unwrap().state().settings.throttle_period_ms, 100);
        assert_eq!(draws(&m, &id), 0);
    }

    #[test]
    fn test_set_property_broadcasts_and_redraws() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        m.set_property("mode", json!("relative"));
        m.set_property("fontSize", json!(20));

        assert_eq!(m.settings().extra.get("mode"), Some(&json!("relative")));
        let state = m.get(&id).unwrap().state();
        assert_eq!(state.properties.get("mode"), Some(&json!("relative")));
        assert_eq!(state.settings.font.size, 20.0);
        assert_eq!(state.draw_count, 2);
    }

    #[test]
    fn test_apply_color_scheme() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        m.apply_color_scheme(ColorScheme::dark());
        assert_eq!(m.colors(), &ColorScheme::dark());
        assert_eq!(m.get(&id).unwrap().state().colors, ColorScheme::dark());
        assert_eq!(draws(&m, &id), 1);
    }

    #[test]
    fn test_apply_settings_pushes_widget_settings() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        let mut settings = GlobalSettings::default();
        settings.widget.show_labels = true;
        settings.widget.font.family = "monospace".to_string();
        settings.animation_period_ms = 16;

        m.apply_settings(settings.clone());
        assert_eq!(m.settings(), &settings);
        assert_eq!(m.get(&id).unwrap().state().settings, settings.widget);
        assert_eq!(draws(&m, &id), 1);
    }

    #[test]
    fn test_global_exposure() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        assert!(m.exposed(&id).is_some());

        m.set_property("globalWidgets", json!(false));
        let hidden = create(&mut m, "dial");
        assert!(m.exposed(&hidden).is_none());
        assert!(m.get(&hidden).is_some());

        assert!(m.expose(&hidden));
        assert!(m.exposed(&hidden).is_some());
        assert!(!m.expose("missing"));
        assert_eq!(m.exposed_ids().count(), 2);
    }

    #[test]
    fn test_dispatch_fans_out_and_wildcards() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        let units = Rc::new(RefCell::new(Vec::new()));
        let raw = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&units);
        m.set_transmit_fn(move |t| log.borrow_mut().push(t.osc_path()));
        let log = Rc::clone(&raw);
        m.on_any(move |widget, value| log.borrow_mut().push((widget.to_string(), value.clone())));

        let sent = m.dispatch_value(&id, &json!({"pos": {"x": 1, "y": 0}})).unwrap();
        assert_eq!(sent, 2);
        assert_eq!(*units.borrow(), vec!["/dial1/pos/x", "/dial1/pos/y"]);
        assert_eq!(
            *raw.borrow(),
            vec![("dial1".to_string(), json!({"pos": {"x": 1, "y": 0}}))]
        );
    }

    #[test]
    fn test_dispatch_unknown_widget() {
        let mut m = manager();
        assert!(matches!(
            m.dispatch_value("ghost", &json!(1)),
            Err(ManagerError::UnknownWidget(_))
        ));
    }

    #[test]
    fn test_interact_dispatches_reported_value() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        m.on(&id, "x", move |t| log.borrow_mut().push(t.value.clone()));

        assert_eq!(m.interact(&id, Interaction::Release).unwrap(), None);
        let value = m.interact(&id, Interaction::Move { x: 0.5, y: 0.25 }).unwrap();
        assert_eq!(value, Some(json!({"x": 0.5, "y": 0.25})));
        assert_eq!(*seen.borrow(), vec![json!(0.5)]);
        assert_eq!(draws(&m, &id), 1);
    }

    #[test]
    fn test_set_value_optionally_transmits() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        let count = Rc::new(RefCell::new(0));
        let hits = Rc::clone(&count);
        m.on_any(move |_, _| *hits.borrow_mut() += 1);

        m.set_value(&id, &json!(0.3), false).unwrap();
        assert_eq!(*count.borrow(), 0);
        m.set_value(&id, &json!(0.4), true).unwrap();
        assert_eq!(*count.borrow(), 1);
        assert_eq!(m.get(&id).unwrap().value(), json!(0.4));
    }

    #[test]
    fn test_animation_tick_order_and_isolation() {
        let mut m = manager();
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&order);
        m.add_animation(move |_| {
            log.borrow_mut().push(1);
            anyhow::bail!("first callback fails")
        });
        let log = Rc::clone(&order);
        m.add_animation(move |_| {
            log.borrow_mut().push(2);
            Ok(())
        });
        let log = Rc::clone(&order);
        m.add_animation(move |_| {
            log.borrow_mut().push(3);
            Ok(())
        });

        let report = m.tick();
        assert_eq!(*order.borrow(), vec![1, 2, 3]);
        assert_eq!(report.invoked, 3);
        assert_eq!(report.failed.len(), 1);
    }

    #[test]
    fn test_animation_callbacks_reach_widgets() {
        let mut m = manager();
        let id = create(&mut m, "dial");
        let target = id.clone();
        let cb = m.add_animation(move |widgets| {
            if let Some(widget) = widgets.get_mut(&target) {
                widget.draw();
            }
            Ok(())
        });

        m.tick();
        m.tick();
        assert_eq!(draws(&m, &id), 2);

        assert!(m.remove_animation(cb));
        assert!(!m.remove_animation(cb));
        m.tick();
        assert_eq!(draws(&m, &id), 2);
    }

    #[test]
    fn test_update_runs_ticks_on_schedule() {
        let mut m = manager();
        let count = Rc::new(RefCell::new(0));
        let hits = Rc::clone(&count);
        m.add_animation(move |_| {
            *hits.borrow_mut() += 1;
            Ok(())
        });

        let start = Instant::now();
        assert!(m.update(start + Duration::from_secs(1)).is_none());

        m.start_animation(start);
        assert!(m.is_animating());
        assert!(m.update(start + Duration::from_millis(29)).is_none());
        assert!(m.update(start + Duration::from_millis(30)).is_some());
        assert_eq!(*count.borrow(), 1);

        m.stop_animation();
        assert!(m.update(start + Duration::from_secs(5)).is_none());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_animation_period_property_changes_clock() {
        let mut m = manager();
        m.set_property("animationPeriod", json!(50));
        let start = Instant::now();
        m.start_animation(start);
        assert_eq!(m.time_until_tick(start), Some(Duration::from_millis(50)));
        assert_eq!(m.settings().animation_period_ms, 50);
    }

    #[test]
    fn test_adopt_all_transforms_tagged_surfaces() {
        let mut m = manager();
        let s1 = m.surfaces_mut().create_surface("dial");
        let s2 = m.surfaces_mut().create_surface("gauge");
        let s3 = m.surfaces_mut().create_surface("slider");
        m.surfaces_mut().set_id(s3, "volume");
        m.transform(s1, None).unwrap();

        let report = m.adopt_all();
        assert_eq!(report.created, vec!["volume".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, s2);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_widgets_of_type() {
        let mut m = manager();
        create(&mut m, "dial");
        create(&mut m, "slider");
        create(&mut m, "dial");
        assert_eq!(m.widgets_of_type("dial"), vec!["dial1", "dial2"]);
        assert!(m.widgets_of_type("button").is_empty());
    }
}
