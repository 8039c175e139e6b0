use axum::{extract::{Path, Query, State}, Json};

use models::technician::TechnicianProfile;
use service::technician_service::{self, SearchFilter};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::routes::parse_id;

#[utoipa::path(get, path = "/api/technicians", tag = "technicians",
    responses((status = 200, description = "Verified technicians")))]
pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<TechnicianProfile>>, ApiError> {
    Ok(Json(technician_service::list_verified(&state.db).await?))
}

#[utoipa::path(get, path = "/api/technicians/search", tag = "technicians",
    params(
        ("service" = Option<String>, Query, description = "Partial service name, any case"),
        ("location" = Option<String>, Query, description = "Partial location, any case"),
        ("serviceArea" = Option<String>, Query, description = "Partial service area, any case"),
    ),
    responses((status = 200, description = "Matching verified technicians, possibly empty")))]
pub async fn search(
    State(state): State<ServerState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<TechnicianProfile>>, ApiError> {
    Ok(Json(technician_service::search(&state.db, &filter).await?))
}

#[utoipa::path(get, path = "/api/technicians/{id}", tag = "technicians",
    params(("id" = String, Path, description = "Technician profile id")),
    responses(
        (status = 200, description = "Technician profile"),
        (status = 404, description = "Not found"),
    ))]
pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TechnicianProfile>, ApiError> {
    let id = parse_id(&id, "technician")?;
    Ok(Json(technician_service::get(&state.db, id).await?))
}
