//! Interaction events relayed from the rendering widget.
//!
//! Payload structs are what listeners receive. `ClientEvent` is the wire
//! shape: overlays are referenced by id and resolved by the `MapView`
//! before dispatch.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::LatLon;
use crate::overlay::{InfoWindow, Marker};

// =============================================================================
// LISTENER PAYLOADS
// =============================================================================

/// The user panned or zoomed. Carries the raw widget report, including the
/// visible bounds which are not stored in the view state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapMoved {
    pub zoom: f64,
    pub center: LatLon,
    pub bounds_ne: LatLon,
    pub bounds_sw: LatLon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerClicked {
    pub marker: Marker,
}

/// `marker.position` is still the stored (pre-drag) position.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDragged {
    pub marker: Marker,
    pub new_position: LatLon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoWindowClosed {
    pub window: InfoWindow,
}

// =============================================================================
// WIRE EVENTS
// =============================================================================

/// Event kinds the widget reports back, with overlays referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientEvent {
    MapMoved(MapMoved),
    MarkerClicked { marker_id: Uuid },
    MarkerDragged { marker_id: Uuid, position: LatLon },
    InfoWindowClosed { window_id: Uuid },
}

impl ClientEvent {
    /// Short name used in log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MapMoved(_) => "map_moved",
            Self::MarkerClicked { .. } => "marker_clicked",
            Self::MarkerDragged { .. } => "marker_dragged",
            Self::InfoWindowClosed { .. } => "info_window_closed",
        }
    }
}
