//! View state — everything the rendering widget draws.
//!
//! DESIGN
//! ======
//! `ViewState` is plain data owned by a `MapView`. It is serialized whole
//! into every `map:state` frame; the widget diffs against what it already
//! shows. `location_from_client` tells the widget whether center/zoom came
//! from its own pan (do not re-apply) or from the server (pan to it).

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::geo::{Bounds, LatLon};
use crate::overlay::{InfoWindow, MapControl, MapType, Marker, Polygon, Polyline};

pub const DEFAULT_CENTER: LatLon = LatLon::new(51.477_811, -0.001_475);
pub const DEFAULT_ZOOM: f64 = 8.0;
pub const DEFAULT_MIN_ZOOM: f64 = 0.0;
pub const DEFAULT_MAX_ZOOM: f64 = 21.0;

/// Controls enabled on a freshly created map.
pub const DEFAULT_CONTROLS: [MapControl; 6] = [
    MapControl::MapType,
    MapControl::Pan,
    MapControl::Rotate,
    MapControl::Scale,
    MapControl::StreetView,
    MapControl::Zoom,
];

/// A bounding-box limit with its own on/off switch.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundLimit {
    pub enabled: bool,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewState {
    pub api_key: String,
    pub center: LatLon,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub map_type: MapType,
    pub draggable: bool,
    pub keyboard_shortcuts_enabled: bool,
    pub scroll_wheel_enabled: bool,
    pub controls: BTreeSet<MapControl>,
    pub center_limit: BoundLimit,
    pub visible_area_limit: BoundLimit,
    pub markers: HashSet<Marker>,
    pub polygons: HashSet<Polygon>,
    pub polylines: HashSet<Polyline>,
    pub info_windows: HashSet<InfoWindow>,
    /// True when center/zoom were last written by a client map-moved event.
    pub location_from_client: bool,
}

impl ViewState {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            map_type: MapType::Roadmap,
            draggable: true,
            keyboard_shortcuts_enabled: true,
            scroll_wheel_enabled: true,
            controls: DEFAULT_CONTROLS.into_iter().collect(),
            center_limit: BoundLimit::default(),
            visible_area_limit: BoundLimit::default(),
            markers: HashSet::new(),
            polygons: HashSet::new(),
            polylines: HashSet::new(),
            info_windows: HashSet::new(),
            location_from_client: false,
        }
    }
}

/// A published copy of the view state. `revision` increases by one on every
/// publication so widgets can drop stale frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub revision: u64,
    pub state: ViewState,
}
