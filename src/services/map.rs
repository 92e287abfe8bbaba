//! Map service — create, look up, and retire hosted maps.
//!
//! DESIGN
//! ======
//! Maps live only in memory. Creation fills in the configured API key and
//! default view, and installs one logging listener per event kind so every
//! relayed interaction shows up in the server log. Host code adds its own
//! listeners on the returned `Arc<MapView>`.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::event::{InfoWindowClosed, MapMoved, MarkerClicked, MarkerDragged};
use crate::geo::LatLon;
use crate::listeners::listener;
use crate::map::MapView;
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum MapServiceError {
    #[error("map not found: {0}")]
    NotFound(Uuid),
}

impl crate::frame::ErrorCode for MapServiceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_MAP_NOT_FOUND",
        }
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create and register a map. Missing center/zoom fall back to config.
pub async fn create_map(state: &AppState, center: Option<LatLon>, zoom: Option<f64>) -> (Uuid, Arc<MapView>) {
    let map_id = Uuid::new_v4();
    let map = Arc::new(MapView::with_center_and_zoom(
        center.unwrap_or(state.config.default_center),
        zoom.unwrap_or(state.config.default_zoom),
        state.config.api_key.clone(),
    ));
    attach_logging_listeners(map_id, &map);

    state.maps.write().await.insert(map_id, Arc::clone(&map));
    info!(%map_id, "map created");
    (map_id, map)
}

/// # Errors
///
/// Returns `NotFound` if no map is registered under `map_id`.
pub async fn get_map(state: &AppState, map_id: Uuid) -> Result<Arc<MapView>, MapServiceError> {
    state
        .maps
        .read()
        .await
        .get(&map_id)
        .cloned()
        .ok_or(MapServiceError::NotFound(map_id))
}

/// Unregister a map. Connected widgets are disconnected once the last
/// in-flight handler releases the map.
///
/// # Errors
///
/// Returns `NotFound` if no map is registered under `map_id`.
pub async fn delete_map(state: &AppState, map_id: Uuid) -> Result<(), MapServiceError> {
    let removed = state.maps.write().await.remove(&map_id);
    if removed.is_none() {
        return Err(MapServiceError::NotFound(map_id));
    }
    info!(%map_id, "map deleted");
    Ok(())
}

/// Ids of all registered maps, sorted for stable output.
pub async fn list_maps(state: &AppState) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = state.maps.read().await.keys().copied().collect();
    ids.sort();
    ids
}

// =============================================================================
// LISTENERS
// =============================================================================

fn attach_logging_listeners(map_id: Uuid, map: &MapView) {
    map.add_map_move_listener(listener(move |e: &MapMoved| {
        info!(
            %map_id,
            zoom = e.zoom,
            lat = e.center.lat,
            lon = e.center.lon,
            ne_lat = e.bounds_ne.lat,
            ne_lon = e.bounds_ne.lon,
            sw_lat = e.bounds_sw.lat,
            sw_lon = e.bounds_sw.lon,
            "map moved"
        );
    }));
    map.add_marker_click_listener(listener(move |e: &MarkerClicked| {
        info!(%map_id, marker_id = %e.marker.id, caption = %e.marker.caption, "marker clicked");
    }));
    map.add_marker_drag_listener(listener(move |e: &MarkerDragged| {
        info!(
            %map_id,
            marker_id = %e.marker.id,
            lat = e.new_position.lat,
            lon = e.new_position.lon,
            "marker dragged"
        );
    }));
    map.add_info_window_closed_listener(listener(move |e: &InfoWindowClosed| {
        info!(%map_id, window_id = %e.window.id, "info window closed");
    }));
}

#[cfg(test)]
#[path = "map_test.rs"]
mod tests;
