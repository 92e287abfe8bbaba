//! Overlay value objects drawn on top of the base map, plus the closed
//! enumerations the widget understands (controls and base map types).
//!
//! DESIGN
//! ======
//! Every overlay carries a `Uuid`. Equality and hashing look at the id only,
//! so the view state's sets behave like identity sets: two markers with the
//! same caption and position are still distinct, and an updated copy of a
//! marker replaces the stored one.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::LatLon;

// =============================================================================
// ENUMS
// =============================================================================

/// Base map types supported by Google Maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapType {
    Hybrid,
    #[default]
    Roadmap,
    Satellite,
    Terrain,
}

/// Controls rendered by the widget itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MapControl {
    MapType,
    OverView,
    Pan,
    Rotate,
    Scale,
    StreetView,
    Zoom,
}

// =============================================================================
// IDENTITY
// =============================================================================

macro_rules! identity_by_id {
    ($ty:ty) => {
        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl Eq for $ty {}

        impl Hash for $ty {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }
    };
}

// =============================================================================
// MARKER
// =============================================================================

/// A pin on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub id: Uuid,
    /// Shown when the marker is hovered.
    pub caption: String,
    pub position: LatLon,
    pub draggable: bool,
    pub icon_url: Option<String>,
}

impl Marker {
    #[must_use]
    pub fn new(caption: impl Into<String>, position: LatLon) -> Self {
        Self { id: Uuid::new_v4(), caption: caption.into(), position, draggable: false, icon_url: None }
    }

    #[must_use]
    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    #[must_use]
    pub fn with_icon_url(mut self, icon_url: impl Into<String>) -> Self {
        self.icon_url = Some(icon_url.into());
        self
    }

    /// Copy of this marker (same identity) at a new position.
    #[must_use]
    pub fn moved_to(&self, position: LatLon) -> Self {
        Self { position, ..self.clone() }
    }
}

identity_by_id!(Marker);

// =============================================================================
// POLYGON / POLYLINE
// =============================================================================

/// A closed filled shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    pub id: Uuid,
    pub coordinates: Vec<LatLon>,
    pub stroke_color: String,
    pub stroke_opacity: f64,
    pub stroke_weight: u32,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub geodesic: bool,
    pub z_index: i32,
}

impl Polygon {
    #[must_use]
    pub fn new(coordinates: Vec<LatLon>) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinates,
            stroke_color: "#000000".into(),
            stroke_opacity: 1.0,
            stroke_weight: 1,
            fill_color: "#ffffff".into(),
            fill_opacity: 1.0,
            geodesic: false,
            z_index: 0,
        }
    }

    #[must_use]
    pub fn with_stroke(mut self, color: impl Into<String>, opacity: f64, weight: u32) -> Self {
        self.stroke_color = color.into();
        self.stroke_opacity = opacity;
        self.stroke_weight = weight;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, color: impl Into<String>, opacity: f64) -> Self {
        self.fill_color = color.into();
        self.fill_opacity = opacity;
        self
    }
}

identity_by_id!(Polygon);

/// An open line through a list of coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polyline {
    pub id: Uuid,
    pub coordinates: Vec<LatLon>,
    pub stroke_color: String,
    pub stroke_opacity: f64,
    pub stroke_weight: u32,
    pub geodesic: bool,
    pub z_index: i32,
}

impl Polyline {
    #[must_use]
    pub fn new(coordinates: Vec<LatLon>) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinates,
            stroke_color: "#000000".into(),
            stroke_opacity: 1.0,
            stroke_weight: 1,
            geodesic: false,
            z_index: 0,
        }
    }

    #[must_use]
    pub fn with_stroke(mut self, color: impl Into<String>, opacity: f64, weight: u32) -> Self {
        self.stroke_color = color.into();
        self.stroke_opacity = opacity;
        self.stroke_weight = weight;
        self
    }

    #[must_use]
    pub fn with_geodesic(mut self, geodesic: bool) -> Self {
        self.geodesic = geodesic;
        self
    }
}

identity_by_id!(Polyline);

// =============================================================================
// INFO WINDOW
// =============================================================================

/// A popup bound to a map location, optionally anchored to a marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoWindow {
    pub id: Uuid,
    /// HTML content rendered by the widget.
    pub content: String,
    pub position: LatLon,
    pub anchor_marker: Option<Uuid>,
    pub max_width: Option<u32>,
    pub z_index: i32,
}

impl InfoWindow {
    #[must_use]
    pub fn new(content: impl Into<String>, position: LatLon) -> Self {
        Self { id: Uuid::new_v4(), content: content.into(), position, anchor_marker: None, max_width: None, z_index: 0 }
    }

    /// Anchor the window to a marker; the window opens at the marker position.
    #[must_use]
    pub fn anchored_to(mut self, marker: &Marker) -> Self {
        self.anchor_marker = Some(marker.id);
        self.position = marker.position;
        self
    }

    #[must_use]
    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }
}

identity_by_id!(InfoWindow);

#[cfg(test)]
#[path = "overlay_test.rs"]
mod tests;
