//! Booking creation (slot conflict checking), listing and status transitions.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use models::booking::{self, BookingStatus, NewBooking};
use models::errors::ModelError;
use models::technician;
use models::user::{self, Role, UserSummary};

use crate::auth::Principal;
use crate::errors::ServiceError;

const SLOT_TAKEN: &str = "this time slot is already booked for this technician";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub technician_id: Uuid,
    pub service: String,
    /// `YYYY-MM-DD` or RFC 3339.
    pub booking_date: String,
    pub booking_time: String,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Technician side of a booking as shown to the customer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedTechnician {
    pub id: Uuid,
    pub contact_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: booking::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technician: Option<BookedTechnician>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Create a pending booking for `user_id` after the availability and slot checks.
#[instrument(skip(db, req), fields(user_id = %user_id, technician_id = %req.technician_id))]
pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    req: BookingRequest,
) -> Result<booking::Model, ServiceError> {
    let tech = technician::Entity::find_by_id(req.technician_id)
        .one(db)
        .await?
        .filter(|t| t.is_verified_by_admin)
        .ok_or_else(|| ServiceError::NotFound("technician not found or not verified".into()))?;

    let date = booking::parse_booking_date(&req.booking_date)?;
    let time = booking::normalize_time(&req.booking_time)?;

    let weekday = technician::weekday_name(date);
    if !tech.availability.contains(weekday) {
        let msg = format!("technician is not available on {weekday}");
        return Err(ServiceError::InvalidRequest(msg));
    }

    if booking::find_active_in_slot(db, tech.id, date, &time).await?.is_some() {
        return Err(ServiceError::conflict(SLOT_TAKEN));
    }

    // The partial unique index catches a concurrent insert that passed the check above.
    let created = booking::create(db, NewBooking {
        user_id,
        technician_id: tech.id,
        service: req.service,
        booking_date: date,
        booking_time: time,
        total_price: req.total_price.unwrap_or(0.0),
        notes: req.notes,
    })
    .await
    .map_err(|e| match e {
        ModelError::Duplicate(_) => ServiceError::conflict(SLOT_TAKEN),
        other => other.into(),
    })?;
    info!(
        booking_id = %created.id,
        date = %created.booking_date,
        time = %created.booking_time,
        "booking_created"
    );
    Ok(created)
}

/// Bookings made by a user, or assigned to a technician; newest first.
pub async fn list_mine(
    db: &DatabaseConnection,
    caller: &Principal,
) -> Result<Vec<BookingView>, ServiceError> {
    match caller.role {
        Role::User => {
            let bookings = booking::Entity::find()
                .filter(booking::Column::UserId.eq(caller.id))
                .order_by_desc(booking::Column::CreatedAt)
                .all(db)
                .await?;
            let ids: Vec<Uuid> = bookings.iter().map(|b| b.technician_id).collect();
            let techs: HashMap<Uuid, BookedTechnician> = technician::Entity::find()
                .filter(technician::Column::Id.is_in(ids))
                .find_also_related(user::Entity)
                .all(db)
                .await?
                .into_iter()
                .map(|(t, u)| {
                    (t.id, BookedTechnician {
                        id: t.id,
                        contact_number: t.contact_number,
                        name: u.as_ref().map(|u| u.name.clone()),
                        email: u.map(|u| u.email),
                    })
                })
                .collect();
            Ok(bookings
                .into_iter()
                .map(|b| BookingView {
                    technician: techs.get(&b.technician_id).cloned(),
                    booking: b,
                    user: None,
                })
                .collect())
        }
        Role::Technician => {
            let profile = technician::find_by_user(db, caller.id)
                .await?
                .ok_or_else(|| ServiceError::not_found("technician profile"))?;
            let rows = booking::Entity::find()
                .filter(booking::Column::TechnicianId.eq(profile.id))
                .order_by_desc(booking::Column::CreatedAt)
                .find_also_related(user::Entity)
                .all(db)
                .await?;
            Ok(rows
                .into_iter()
                .map(|(b, u)| BookingView {
                    booking: b,
                    technician: None,
                    user: u.as_ref().map(UserSummary::from),
                })
                .collect())
        }
        Role::Admin => {
            Err(ServiceError::forbidden("bookings are listed for users and technicians only"))
        }
    }
}

/// Transition a booking. Only the assigned technician or an admin may do this.
#[instrument(skip(db), fields(caller = %caller.id))]
pub async fn update_status(
    db: &DatabaseConnection,
    caller: &Principal,
    booking_id: Uuid,
    status: &str,
) -> Result<booking::Model, ServiceError> {
    let status: BookingStatus = status.parse()?;
    let current = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))?;

    if !caller.is_admin() {
        let owns = technician::find_by_user(db, caller.id)
            .await?
            .map(|t| t.id == current.technician_id)
            .unwrap_or(false);
        if !owns {
            let msg = "you are not authorized to update this booking status";
            return Err(ServiceError::forbidden(msg));
        }
    }

    let from = current.status;
    let updated = booking::set_status(db, current, status).await.map_err(|e| match e {
        ModelError::Duplicate(_) => ServiceError::conflict(SLOT_TAKEN),
        other => other.into(),
    })?;
    info!(booking_id = %updated.id, from = %from, to = %updated.status, "booking_status_changed");
    Ok(updated)
}
