use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use models::booking;
use service::auth::Principal;
use service::booking_service::{self, BookingRequest, BookingView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::routes::parse_id;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[utoipa::path(post, path = "/api/bookings", tag = "bookings",
    request_body = crate::openapi::BookingRequestDoc,
    responses(
        (status = 201, description = "Booking created with status pending"),
        (status = 400, description = "Validation failed or technician unavailable that day"),
        (status = 404, description = "Technician missing or unverified"),
        (status = 409, description = "Slot already booked"),
    ))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<booking::Model>), ApiError> {
    let Json(req) = payload?;
    let created = booking_service::create(&state.db, caller.id, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(get, path = "/api/bookings/me", tag = "bookings",
    responses((status = 200, description = "Caller's bookings, newest first")))]
pub async fn mine(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    Ok(Json(booking_service::list_mine(&state.db, &caller).await?))
}

#[utoipa::path(put, path = "/api/bookings/{id}/status", tag = "bookings",
    request_body = crate::openapi::StatusUpdateDoc,
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Updated booking"),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Not the assigned technician"),
        (status = 404, description = "Booking not found"),
    ))]
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(caller): Extension<Principal>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<booking::Model>, ApiError> {
    let id = parse_id(&id, "booking")?;
    let Json(body) = payload?;
    Ok(Json(booking_service::update_status(&state.db, &caller, id, &body.status).await?))
}
