//! `MapView` — server-side proxy for one rendered map.
//!
//! ARCHITECTURE
//! ============
//! The proxy owns a `ViewState` and four listener registries behind a single
//! mutex. Host code mutates state through typed setters; every mutation bumps
//! the revision and publishes a `StateSnapshot` on a watch channel that each
//! connected widget subscribes to. Widget interactions come back through the
//! `on_*` handlers (or `handle_client_event` for wire events) and fan out to
//! listeners.
//!
//! LOCKING
//! =======
//! The mutex is held for a mutation or a registry snapshot, never while a
//! listener runs. Listeners may call back into the same `MapView`. A
//! listener that captures an `Arc<MapView>` keeps the map (and its watch
//! channel) alive; capture a `Weak` if the map should be droppable.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::event::{ClientEvent, InfoWindowClosed, MapMoved, MarkerClicked, MarkerDragged};
use crate::geo::{Bounds, LatLon};
use crate::listeners::{Listener, Listeners, dispatch};
use crate::overlay::{InfoWindow, MapControl, MapType, Marker, Polygon, Polyline};
use crate::view::{BoundLimit, StateSnapshot, ViewState};

// =============================================================================
// TYPES
// =============================================================================

/// Failure resolving a wire event against the current view.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("unknown marker: {0}")]
    UnknownMarker(Uuid),
    #[error("unknown info window: {0}")]
    UnknownInfoWindow(Uuid),
}

impl crate::frame::ErrorCode for MapError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownMarker(_) => "E_UNKNOWN_MARKER",
            Self::UnknownInfoWindow(_) => "E_UNKNOWN_INFO_WINDOW",
        }
    }
}

struct Inner {
    state: ViewState,
    revision: u64,
    marker_click: Listeners<MarkerClicked>,
    marker_drag: Listeners<MarkerDragged>,
    map_move: Listeners<MapMoved>,
    info_window_closed: Listeners<InfoWindowClosed>,
}

pub struct MapView {
    inner: Mutex<Inner>,
    publisher: watch::Sender<StateSnapshot>,
}

impl std::fmt::Debug for MapView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapView").finish_non_exhaustive()
    }
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl MapView {
    /// A map with default center, zoom and controls.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_state(ViewState::new(api_key))
    }

    #[must_use]
    pub fn with_center(center: LatLon, api_key: impl Into<String>) -> Self {
        let mut state = ViewState::new(api_key);
        state.center = center;
        Self::from_state(state)
    }

    #[must_use]
    pub fn with_center_and_zoom(center: LatLon, zoom: f64, api_key: impl Into<String>) -> Self {
        let mut state = ViewState::new(api_key);
        state.center = center;
        state.zoom = zoom;
        Self::from_state(state)
    }

    fn from_state(state: ViewState) -> Self {
        let (publisher, _) = watch::channel(StateSnapshot { revision: 0, state: state.clone() });
        Self {
            inner: Mutex::new(Inner {
                state,
                revision: 0,
                marker_click: Listeners::new(),
                marker_drag: Listeners::new(),
                map_move: Listeners::new(),
                info_window_closed: Listeners::new(),
            }),
            publisher,
        }
    }
}

// =============================================================================
// STATE ACCESS
// =============================================================================

impl MapView {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&self.lock().state)
    }

    /// Apply a mutation and publish the result to subscribed widgets.
    fn mutate<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut inner = self.lock();
        let result = f(&mut inner.state);
        inner.revision += 1;
        let snapshot = StateSnapshot { revision: inner.revision, state: inner.state.clone() };
        // Published under the lock so revisions reach the channel in order.
        self.publisher.send_replace(snapshot);
        result
    }

    /// Current state with its revision.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        let inner = self.lock();
        StateSnapshot { revision: inner.revision, state: inner.state.clone() }
    }

    /// Receiver that observes every published snapshot. The first `borrow`
    /// yields the current state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StateSnapshot> {
        self.publisher.subscribe()
    }

    /// Number of widgets currently subscribed.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.publisher.receiver_count()
    }
}

// =============================================================================
// CENTER / ZOOM
// =============================================================================

impl MapView {
    pub fn set_center(&self, center: LatLon) {
        self.mutate(|s| {
            s.location_from_client = false;
            s.center = center;
        });
    }

    #[must_use]
    pub fn center(&self) -> LatLon {
        self.read(|s| s.center)
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.mutate(|s| {
            s.location_from_client = false;
            s.zoom = zoom;
        });
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.read(|s| s.zoom)
    }

    /// Whether center/zoom were last reported by the widget.
    #[must_use]
    pub fn is_location_from_client(&self) -> bool {
        self.read(|s| s.location_from_client)
    }

    /// Not validated against `max_zoom`; the widget resolves conflicts.
    pub fn set_min_zoom(&self, min_zoom: f64) {
        self.mutate(|s| s.min_zoom = min_zoom);
    }

    #[must_use]
    pub fn min_zoom(&self) -> f64 {
        self.read(|s| s.min_zoom)
    }

    pub fn set_max_zoom(&self, max_zoom: f64) {
        self.mutate(|s| s.max_zoom = max_zoom);
    }

    #[must_use]
    pub fn max_zoom(&self) -> f64 {
        self.read(|s| s.max_zoom)
    }
}

// =============================================================================
// MARKERS
// =============================================================================

impl MapView {
    /// Create a marker from parts, add it, and return it.
    pub fn add_new_marker(
        &self,
        caption: impl Into<String>,
        position: LatLon,
        draggable: bool,
        icon_url: Option<String>,
    ) -> Marker {
        let mut marker = Marker::new(caption, position).with_draggable(draggable);
        marker.icon_url = icon_url;
        self.add_marker(marker.clone());
        marker
    }

    pub fn add_marker(&self, marker: Marker) {
        self.mutate(|s| s.markers.insert(marker));
    }

    pub fn remove_marker(&self, marker: &Marker) {
        self.mutate(|s| s.markers.remove(marker));
    }

    /// Replace the stored marker that has the same id. Returns false (and
    /// adds nothing) if the marker is not on the map.
    pub fn update_marker(&self, marker: Marker) -> bool {
        self.mutate(|s| {
            if !s.markers.contains(&marker) {
                return false;
            }
            s.markers.replace(marker);
            true
        })
    }

    pub fn clear_markers(&self) {
        self.mutate(|s| s.markers.clear());
    }

    #[must_use]
    pub fn has_marker(&self, marker: &Marker) -> bool {
        self.read(|s| s.markers.contains(marker))
    }

    #[must_use]
    pub fn marker(&self, id: Uuid) -> Option<Marker> {
        self.read(|s| s.markers.iter().find(|m| m.id == id).cloned())
    }

    #[must_use]
    pub fn markers(&self) -> HashSet<Marker> {
        self.read(|s| s.markers.clone())
    }
}

// =============================================================================
// POLYGONS / POLYLINES
// =============================================================================

impl MapView {
    pub fn add_polygon_overlay(&self, polygon: Polygon) {
        self.mutate(|s| s.polygons.insert(polygon));
    }

    pub fn remove_polygon_overlay(&self, polygon: &Polygon) {
        self.mutate(|s| s.polygons.remove(polygon));
    }

    #[must_use]
    pub fn polygons(&self) -> HashSet<Polygon> {
        self.read(|s| s.polygons.clone())
    }

    pub fn add_polyline(&self, polyline: Polyline) {
        self.mutate(|s| s.polylines.insert(polyline));
    }

    pub fn remove_polyline(&self, polyline: &Polyline) {
        self.mutate(|s| s.polylines.remove(polyline));
    }

    #[must_use]
    pub fn polylines(&self) -> HashSet<Polyline> {
        self.read(|s| s.polylines.clone())
    }
}

// =============================================================================
// INFO WINDOWS
// =============================================================================

impl MapView {
    pub fn open_info_window(&self, window: InfoWindow) {
        self.mutate(|s| s.info_windows.insert(window));
    }

    pub fn close_info_window(&self, window: &InfoWindow) {
        self.mutate(|s| s.info_windows.remove(window));
    }

    #[must_use]
    pub fn is_info_window_open(&self, window: &InfoWindow) -> bool {
        self.read(|s| s.info_windows.contains(window))
    }

    #[must_use]
    pub fn info_windows(&self) -> HashSet<InfoWindow> {
        self.read(|s| s.info_windows.clone())
    }
}

// =============================================================================
// LIMITS
// =============================================================================

impl MapView {
    /// Store the center limits and enable center limiting.
    pub fn set_center_bound_limits(&self, ne: LatLon, sw: LatLon) {
        self.mutate(|s| s.center_limit = BoundLimit { enabled: true, bounds: Bounds::new(ne, sw) });
    }

    pub fn set_center_bound_limits_enabled(&self, enabled: bool) {
        self.mutate(|s| s.center_limit.enabled = enabled);
    }

    #[must_use]
    pub fn is_center_bound_limits_enabled(&self) -> bool {
        self.read(|s| s.center_limit.enabled)
    }

    #[must_use]
    pub fn center_bound_limits(&self) -> Bounds {
        self.read(|s| s.center_limit.bounds)
    }

    /// Store the visible-area limits and enable them. Zoom is not limited by
    /// this; pair it with `set_min_zoom`.
    pub fn set_visible_area_bound_limits(&self, ne: LatLon, sw: LatLon) {
        self.mutate(|s| s.visible_area_limit = BoundLimit { enabled: true, bounds: Bounds::new(ne, sw) });
    }

    pub fn set_visible_area_bound_limits_enabled(&self, enabled: bool) {
        self.mutate(|s| s.visible_area_limit.enabled = enabled);
    }

    #[must_use]
    pub fn is_visible_area_bound_limits_enabled(&self) -> bool {
        self.read(|s| s.visible_area_limit.enabled)
    }

    #[must_use]
    pub fn visible_area_bound_limits(&self) -> Bounds {
        self.read(|s| s.visible_area_limit.bounds)
    }
}

// =============================================================================
// APPEARANCE / CONTROLS
// =============================================================================

impl MapView {
    pub fn set_map_type(&self, map_type: MapType) {
        self.mutate(|s| s.map_type = map_type);
    }

    #[must_use]
    pub fn map_type(&self) -> MapType {
        self.read(|s| s.map_type)
    }

    pub fn set_draggable(&self, draggable: bool) {
        self.mutate(|s| s.draggable = draggable);
    }

    #[must_use]
    pub fn is_draggable(&self) -> bool {
        self.read(|s| s.draggable)
    }

    pub fn set_keyboard_shortcuts_enabled(&self, enabled: bool) {
        self.mutate(|s| s.keyboard_shortcuts_enabled = enabled);
    }

    #[must_use]
    pub fn are_keyboard_shortcuts_enabled(&self) -> bool {
        self.read(|s| s.keyboard_shortcuts_enabled)
    }

    pub fn set_scroll_wheel_enabled(&self, enabled: bool) {
        self.mutate(|s| s.scroll_wheel_enabled = enabled);
    }

    #[must_use]
    pub fn is_scroll_wheel_enabled(&self) -> bool {
        self.read(|s| s.scroll_wheel_enabled)
    }

    pub fn add_control(&self, control: MapControl) {
        self.mutate(|s| s.controls.insert(control));
    }

    pub fn remove_control(&self, control: MapControl) {
        self.mutate(|s| s.controls.remove(&control));
    }

    pub fn set_controls(&self, controls: BTreeSet<MapControl>) {
        self.mutate(|s| s.controls = controls);
    }

    #[must_use]
    pub fn controls(&self) -> BTreeSet<MapControl> {
        self.read(|s| s.controls.clone())
    }
}

// =============================================================================
// LISTENER REGISTRATION
// =============================================================================

impl MapView {
    pub fn add_marker_click_listener(&self, listener: Listener<MarkerClicked>) {
        self.lock().marker_click.add(listener);
    }

    pub fn remove_marker_click_listener(&self, listener: &Listener<MarkerClicked>) {
        self.lock().marker_click.remove(listener);
    }

    pub fn add_marker_drag_listener(&self, listener: Listener<MarkerDragged>) {
        self.lock().marker_drag.add(listener);
    }

    pub fn remove_marker_drag_listener(&self, listener: &Listener<MarkerDragged>) {
        self.lock().marker_drag.remove(listener);
    }

    pub fn add_map_move_listener(&self, listener: Listener<MapMoved>) {
        self.lock().map_move.add(listener);
    }

    pub fn remove_map_move_listener(&self, listener: &Listener<MapMoved>) {
        self.lock().map_move.remove(listener);
    }

    pub fn add_info_window_closed_listener(&self, listener: Listener<InfoWindowClosed>) {
        self.lock().info_window_closed.add(listener);
    }

    pub fn remove_info_window_closed_listener(&self, listener: &Listener<InfoWindowClosed>) {
        self.lock().info_window_closed.remove(listener);
    }
}

// =============================================================================
// INBOUND EVENTS
// =============================================================================

impl MapView {
    /// The widget was panned or zoomed. Stores zoom and center (flagged as
    /// client-originated), then hands the full report to map-move listeners.
    pub fn on_map_moved(&self, event: MapMoved) {
        self.mutate(|s| {
            s.location_from_client = true;
            s.zoom = event.zoom;
            s.center = event.center;
        });
        let listeners = self.lock().map_move.snapshot();
        debug!(zoom = event.zoom, listeners = listeners.len(), "map moved");
        dispatch(&listeners, &event);
    }

    pub fn on_marker_clicked(&self, marker: &Marker) {
        let listeners = self.lock().marker_click.snapshot();
        debug!(marker_id = %marker.id, listeners = listeners.len(), "marker clicked");
        dispatch(&listeners, &MarkerClicked { marker: marker.clone() });
    }

    /// Relay only: the stored marker keeps its old position. Listeners call
    /// `update_marker` if the move should stick.
    pub fn on_marker_dragged(&self, marker: &Marker, new_position: LatLon) {
        let listeners = self.lock().marker_drag.snapshot();
        debug!(marker_id = %marker.id, listeners = listeners.len(), "marker dragged");
        dispatch(&listeners, &MarkerDragged { marker: marker.clone(), new_position });
    }

    /// Listeners run while the window is still in the open set; it is
    /// removed afterwards.
    pub fn on_info_window_closed(&self, window: &InfoWindow) {
        let listeners = self.lock().info_window_closed.snapshot();
        debug!(window_id = %window.id, listeners = listeners.len(), "info window closed");
        dispatch(&listeners, &InfoWindowClosed { window: window.clone() });
        self.close_info_window(window);
    }

    /// Resolve a wire event against the current view and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownMarker` / `UnknownInfoWindow` if the referenced
    /// overlay is not on the map. No listener runs in that case.
    pub fn handle_client_event(&self, event: ClientEvent) -> Result<(), MapError> {
        match event {
            ClientEvent::MapMoved(moved) => self.on_map_moved(moved),
            ClientEvent::MarkerClicked { marker_id } => {
                let marker = self.marker(marker_id).ok_or(MapError::UnknownMarker(marker_id))?;
                self.on_marker_clicked(&marker);
            }
            ClientEvent::MarkerDragged { marker_id, position } => {
                let marker = self.marker(marker_id).ok_or(MapError::UnknownMarker(marker_id))?;
                self.on_marker_dragged(&marker, position);
            }
            ClientEvent::InfoWindowClosed { window_id } => {
                let window = self
                    .read(|s| s.info_windows.iter().find(|w| w.id == window_id).cloned())
                    .ok_or(MapError::UnknownInfoWindow(window_id))?;
                self.on_info_window_closed(&window);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "map_test.rs"]
mod tests;
