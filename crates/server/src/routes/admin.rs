use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use models::technician::TechnicianProfile;
use models::user;
use service::admin_service;
use service::auth::Principal;
use service::technician_service;

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::routes::parse_id;

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub role: String,
}

#[utoipa::path(get, path = "/api/admin/unverified-technicians", tag = "admin",
    responses((status = 200, description = "Technicians awaiting verification")))]
pub async fn unverified_technicians(
    State(state): State<ServerState>,
) -> Result<Json<Vec<TechnicianProfile>>, ApiError> {
    Ok(Json(technician_service::list_all(&state.db, true).await?))
}

#[utoipa::path(get, path = "/api/admin/all-technicians", tag = "admin",
    responses((status = 200, description = "Every technician profile")))]
pub async fn all_technicians(
    State(state): State<ServerState>,
) -> Result<Json<Vec<TechnicianProfile>>, ApiError> {
    Ok(Json(technician_service::list_all(&state.db, false).await?))
}

#[utoipa::path(get, path = "/api/admin/users", tag = "admin",
    responses((status = 200, description = "Every account, newest first")))]
pub async fn users(State(state): State<ServerState>) -> Result<Json<Vec<user::Model>>, ApiError> {
    Ok(Json(admin_service::list_users(&state.db).await?))
}

#[utoipa::path(put, path = "/api/admin/technicians/{id}/verify", tag = "admin",
    params(("id" = String, Path, description = "Technician profile id")),
    responses(
        (status = 200, description = "Verified"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already verified"),
    ))]
pub async fn verify(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "technician")?;
    let technician = admin_service::verify_technician(&state.db, id).await?;
    Ok(Json(json!({ "msg": "technician verified successfully", "technician": technician })))
}

#[utoipa::path(put, path = "/api/admin/technicians/{id}/disapprove", tag = "admin",
    params(("id" = String, Path, description = "Technician profile id")),
    responses(
        (status = 200, description = "Disapproved"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already unverified"),
    ))]
pub async fn disapprove(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "technician")?;
    let technician = admin_service::disapprove_technician(&state.db, id).await?;
    Ok(Json(json!({ "msg": "technician disapproved successfully", "technician": technician })))
}

#[utoipa::path(put, path = "/api/admin/users/{id}/role", tag = "admin",
    request_body = crate::openapi::RoleChangeDoc,
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Role updated"),
        (status = 400, description = "Invalid role"),
        (status = 403, description = "Self-demotion"),
        (status = 404, description = "Not found"),
    ))]
pub async fn change_role(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<RoleChange>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "user")?;
    let Json(body) = payload?;
    let updated = admin_service::change_role(&state.db, &caller, id, &body.role).await?;
    Ok(Json(json!({
        "msg": format!("user {} role updated to {}", updated.email, updated.role),
        "user": { "id": updated.id, "email": updated.email, "role": updated.role },
    })))
}

#[utoipa::path(delete, path = "/api/admin/technicians/{id}", tag = "admin",
    params(("id" = String, Path, description = "Technician profile id")),
    responses(
        (status = 200, description = "Profile and dependents deleted"),
        (status = 404, description = "Not found"),
    ))]
pub async fn delete_technician(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "technician profile")?;
    let report = admin_service::delete_technician(&state.db, id).await?;
    let msg = if report.user_removed {
        "technician and associated user deleted successfully"
    } else {
        "technician profile deleted successfully, user role updated if necessary"
    };
    Ok(Json(json!({ "msg": msg, "report": report })))
}

#[utoipa::path(delete, path = "/api/admin/users/{id}", tag = "admin",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Account and dependents deleted"),
        (status = 403, description = "Self-deletion"),
        (status = 404, description = "Not found"),
    ))]
pub async fn delete_user(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id, "user")?;
    let report = admin_service::delete_user(&state.db, &caller, id).await?;
    let msg = "user and all associated data deleted successfully";
    Ok(Json(json!({ "msg": msg, "report": report })))
}
