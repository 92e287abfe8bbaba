//! Map management routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::LatLon;
use crate::services::map::{self, MapServiceError};
use crate::state::AppState;
use crate::view::StateSnapshot;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateMapBody {
    pub center: Option<LatLon>,
    pub zoom: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateMapResponse {
    pub id: Uuid,
    pub state: StateSnapshot,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MapListResponse {
    pub maps: Vec<Uuid>,
}

/// `GET /api/maps` — ids of hosted maps.
pub async fn list_maps(State(state): State<AppState>) -> Json<MapListResponse> {
    Json(MapListResponse { maps: map::list_maps(&state).await })
}

/// `POST /api/maps` — create a map with optional center and zoom. The body
/// may be omitted entirely.
pub async fn create_map(
    State(state): State<AppState>,
    body: Option<Json<CreateMapBody>>,
) -> (StatusCode, Json<CreateMapResponse>) {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let (id, view) = map::create_map(&state, body.center, body.zoom).await;
    (StatusCode::CREATED, Json(CreateMapResponse { id, state: view.snapshot() }))
}

/// `GET /api/maps/:id` — current snapshot.
pub async fn get_map(
    State(state): State<AppState>,
    Path(map_id): Path<Uuid>,
) -> Result<Json<StateSnapshot>, StatusCode> {
    let view = map::get_map(&state, map_id)
        .await
        .map_err(map_error_to_status)?;
    Ok(Json(view.snapshot()))
}

/// `DELETE /api/maps/:id` — unregister a map.
pub async fn delete_map(State(state): State<AppState>, Path(map_id): Path<Uuid>) -> StatusCode {
    match map::delete_map(&state, map_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => map_error_to_status(e),
    }
}

pub(crate) fn map_error_to_status(err: MapServiceError) -> StatusCode {
    match err {
        MapServiceError::NotFound(_) => StatusCode::NOT_FOUND,
    }
}

#[cfg(test)]
#[path = "maps_test.rs"]
mod tests;
