use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use sea_orm::EntityTrait;

use models::technician::TechnicianProfile;
use models::user;
use service::auth::Principal;
use service::technician_service::{self, ProfileUpdate};

use crate::auth::ServerState;
use crate::errors::ApiError;

#[utoipa::path(get, path = "/api/profile/me", tag = "profile",
    responses(
        (status = 200, description = "Caller's account"),
        (status = 401, description = "Missing or invalid token, or account gone"),
    ))]
pub async fn me(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
) -> Result<Json<user::Model>, ApiError> {
    let found = user::Entity::find_by_id(caller.id)
        .one(&state.db)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    found.map(Json).ok_or_else(|| ApiError::NotFound("user not found".into()))
}

#[utoipa::path(get, path = "/api/profile/technician/me", tag = "profile",
    responses(
        (status = 200, description = "Caller's technician profile"),
        (status = 404, description = "No profile"),
    ))]
pub async fn technician_me(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
) -> Result<Json<TechnicianProfile>, ApiError> {
    Ok(Json(technician_service::get_own(&state.db, caller.id).await?))
}

#[utoipa::path(post, path = "/api/profile/technician", tag = "profile",
    request_body = crate::openapi::ProfileUpdateDoc,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 201, description = "Profile created"),
        (status = 400, description = "Validation failed"),
    ))]
pub async fn upsert_technician(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<(StatusCode, Json<TechnicianProfile>), ApiError> {
    let Json(update) = payload?;
    let (profile, created) =
        technician_service::upsert_own(&state.db, caller.id, update).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(profile)))
}
