use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{technician, user};

pub const MAX_NOTES_LEN: usize = 300;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold a slot.
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn is_active(self) -> bool { Self::ACTIVE.contains(&self) }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for BookingStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(ModelError::validation("invalid booking status provided")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub technician_id: Uuid,
    pub service: String,
    pub booking_date: Date,
    pub booking_time: String,
    pub status: BookingStatus,
    pub total_price: f64,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User, Technician }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Technician => Entity::belongs_to(technician::Entity)
                .from(Column::TechnicianId)
                .to(technician::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<technician::Entity> for Entity {
    fn to() -> RelationDef { Relation::Technician.def() }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        self.updated_at = Set(Utc::now().into());
        Ok(self)
    }
}

/// Normalise a client-supplied booking date to a UTC calendar date.
///
/// Accepts `YYYY-MM-DD` or any RFC 3339 timestamp; the latter is converted to
/// UTC before truncation so the same instant always maps to the same slot.
pub fn parse_booking_date(raw: &str) -> Result<NaiveDate, ModelError> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| ModelError::validation(format!("invalid booking date: {raw}")))
}

pub fn normalize_time(raw: &str) -> Result<String, ModelError> {
    let t = raw.trim();
    if t.is_empty() { return Err(ModelError::validation("booking time required")); }
    if t.chars().count() > 32 {
        return Err(ModelError::validation("booking time too long (<=32)"));
    }
    Ok(t.to_string())
}

pub fn validate_notes(notes: &str) -> Result<(), ModelError> {
    if notes.chars().count() > MAX_NOTES_LEN {
        let msg = format!("notes cannot be more than {MAX_NOTES_LEN} characters");
        return Err(ModelError::validation(msg));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), ModelError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ModelError::validation("price must be a non-negative number"));
    }
    Ok(())
}

/// Validated booking request, ready to insert.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub technician_id: Uuid,
    pub service: String,
    pub booking_date: NaiveDate,
    pub booking_time: String,
    pub total_price: f64,
    pub notes: Option<String>,
}

/// Insert with status `pending`. A taken slot surfaces as
/// [`ModelError::Duplicate`] from the partial unique index.
pub async fn create<C: ConnectionTrait>(db: &C, input: NewBooking) -> Result<Model, ModelError> {
    if input.service.trim().is_empty() { return Err(ModelError::validation("service required")); }
    validate_price(input.total_price)?;
    if let Some(n) = &input.notes { validate_notes(n)?; }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(input.user_id),
        technician_id: Set(input.technician_id),
        service: Set(input.service.trim().to_string()),
        booking_date: Set(input.booking_date),
        booking_time: Set(input.booking_time),
        status: Set(BookingStatus::Pending),
        total_price: Set(input.total_price),
        notes: Set(input.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Active booking occupying the given slot, if any.
pub async fn find_active_in_slot<C: ConnectionTrait>(
    db: &C,
    technician_id: Uuid,
    date: NaiveDate,
    time: &str,
) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::TechnicianId.eq(technician_id))
        .filter(Column::BookingDate.eq(date))
        .filter(Column::BookingTime.eq(time))
        .filter(Column::Status.is_in(BookingStatus::ACTIVE))
        .one(db)
        .await?)
}

pub async fn set_status<C: ConnectionTrait>(
    db: &C,
    booking: Model,
    status: BookingStatus,
) -> Result<Model, ModelError> {
    let mut am: ActiveModel = booking.into();
    am.status = Set(status);
    Ok(am.update(db).await?)
}
