use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Role, UserId};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Json, Path};
use crate::services::MenuItem;

#[derive(Debug, Deserialize)]
pub struct AssignRolesRequest {
    pub roles: Vec<String>,
}

/// GET /api/users/menu - navigation menu for the authenticated user
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "id": 10, "name": "Setup", "children": [ { "id": 11, "name": "Company Details", "children": [] } ] }
///   ]
/// }
/// ```
pub async fn menu(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Vec<MenuItem>> {
    Ok(ApiResponse::success(state.users.get_user_menu(user.user_id).await?))
}

/// GET /api/users/:id/roles
pub async fn roles(State(state): State<AppState>, Path(id): Path<UserId>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(state.users.user_roles(id).await?))
}

/// PUT /api/users/:id/roles - replaces every role the user holds
pub async fn assign_roles(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<UserId>,
    Json(body): Json<AssignRolesRequest>,
) -> ApiResult<Vec<Role>> {
    tracing::info!("User {} assigning roles {:?} to user {}", actor.user_id, body.roles, id);
    Ok(ApiResponse::success(state.users.assign_roles(id, &body.roles).await?))
}

/// GET /api/roles
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Vec<Role>> {
    Ok(ApiResponse::success(state.users.list_roles().await?))
}
