//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the server configuration and the registry of hosted maps. Each
//! map is an `Arc<MapView>`; WebSocket tasks look the map up per inbound
//! frame and otherwise hold only a watch receiver, so removing a map from
//! the registry lets its connections wind down.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::map::MapView;

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub maps: Arc<RwLock<HashMap<Uuid, Arc<MapView>>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config), maps: Arc::new(RwLock::new(HashMap::new())) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
