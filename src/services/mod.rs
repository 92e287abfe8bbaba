//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own map lifecycle so route handlers can stay focused on
//! protocol translation.

pub mod map;
