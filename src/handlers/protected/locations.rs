use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::{Location, LocationId, LocationPatch, LocationQuery, NewLocation};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json, Path, Query};
use crate::services::{LocationDetail, LocationNode};

/// GET /api/locations - live locations, newest first, optionally filtered
pub async fn list(State(state): State<AppState>, Query(query): Query<LocationQuery>) -> ApiResult<Vec<Location>> {
    Ok(ApiResponse::success(state.locations.list(&query).await?))
}

/// POST /api/locations
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(draft): Json<NewLocation>,
) -> ApiResult<Location> {
    let location = state.locations.create(draft, Some(user.user_id)).await?;
    Ok(ApiResponse::created(location))
}

/// GET /api/locations/root
pub async fn roots(State(state): State<AppState>) -> ApiResult<Vec<Location>> {
    Ok(ApiResponse::success(state.locations.find_root_locations().await?))
}

/// GET /api/locations/hierarchy - the whole forest with nested `child_locations`
pub async fn hierarchy(State(state): State<AppState>) -> ApiResult<Vec<LocationNode>> {
    Ok(ApiResponse::success(state.locations.get_location_hierarchy().await?))
}

/// GET /api/locations/bounds/:ne_lat/:ne_lng/:sw_lat/:sw_lng
pub async fn bounds(
    State(state): State<AppState>,
    Path((ne_lat, ne_lng, sw_lat, sw_lng)): Path<(f64, f64, f64, f64)>,
) -> ApiResult<Vec<Location>> {
    let found = state.locations.within_bounds(ne_lat, ne_lng, sw_lat, sw_lng).await?;
    Ok(ApiResponse::success(found))
}

/// GET /api/locations/:id - one location with its `full_location_path`
pub async fn show(State(state): State<AppState>, Path(id): Path<LocationId>) -> ApiResult<LocationDetail> {
    Ok(ApiResponse::success(state.locations.find_one(id).await?))
}

/// PATCH /api/locations/:id - partial update; `parent_location_id` re-parents
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<LocationId>,
    Json(patch): Json<LocationPatch>,
) -> ApiResult<Location> {
    Ok(ApiResponse::success(state.locations.update(id, patch, Some(user.user_id)).await?))
}

/// DELETE /api/locations/:id - soft delete
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<LocationId>,
) -> ApiResult<()> {
    state.locations.remove(id, Some(user.user_id)).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/locations/:id/children
pub async fn children(State(state): State<AppState>, Path(id): Path<LocationId>) -> ApiResult<Vec<Location>> {
    Ok(ApiResponse::success(state.locations.find_child_locations(id).await?))
}

/// GET /api/locations/:id/descendants - breadth-first
pub async fn descendants(State(state): State<AppState>, Path(id): Path<LocationId>) -> ApiResult<Vec<Location>> {
    Ok(ApiResponse::success(state.locations.get_location_descendants(id).await?))
}

/// GET /api/locations/:id/ancestors - nearest parent first
pub async fn ancestors(State(state): State<AppState>, Path(id): Path<LocationId>) -> ApiResult<Vec<Location>> {
    Ok(ApiResponse::success(state.locations.get_location_ancestors(id).await?))
}
