//! Server-side view state for embedded Google Maps widgets.
//!
//! ARCHITECTURE
//! ============
//! Each hosted map is a `MapView`: the authoritative view state (center,
//! zoom, overlays, limits, controls) plus typed listener lists for widget
//! events. Application code mutates the view; every mutation publishes a
//! revisioned snapshot that connected widgets receive over a websocket.
//! Widgets report moves, clicks, drags and info window closes back, which
//! the map applies and fans out to its listeners.

pub mod config;
pub mod event;
pub mod frame;
pub mod geo;
pub mod listeners;
pub mod map;
pub mod overlay;
pub mod routes;
pub mod services;
pub mod state;
pub mod view;
