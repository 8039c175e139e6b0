use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};

use models::review;
use service::auth::Principal;
use service::review_service::{self, ReviewRequest, ReviewView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::routes::parse_id;

#[utoipa::path(post, path = "/api/reviews", tag = "reviews",
    request_body = crate::openapi::ReviewRequestDoc,
    responses(
        (status = 201, description = "Review stored, rating refreshed"),
        (status = 403, description = "No completed booking with this technician"),
        (status = 404, description = "Technician not found"),
        (status = 409, description = "Already reviewed"),
    ))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<review::Model>), ApiError> {
    let Json(req) = payload?;
    let created = review_service::create(&state.db, caller.id, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/reviews/{technician_id}", tag = "reviews",
    params(("technician_id" = String, Path, description = "Technician profile id")),
    responses(
        (status = 200, description = "Reviews, newest first"),
        (status = 404, description = "Invalid id"),
    ))]
pub async fn list(
    State(state): State<ServerState>,
    Path(technician_id): Path<String>,
) -> Result<Json<Vec<ReviewView>>, ApiError> {
    let id = parse_id(&technician_id, "technician")?;
    Ok(Json(review_service::list_for_technician(&state.db, id).await?))
}
