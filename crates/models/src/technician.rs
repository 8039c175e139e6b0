use chrono::{Datelike, NaiveDate, Utc, Weekday};
use sea_orm::{entity::prelude::*, ConnectionTrait, FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::user;

/// Closed vocabulary of services a technician can offer.
pub const SERVICE_CATALOG: [&str; 10] = [
    "Home Appliance Repair",
    "Plumbing",
    "Electrical Services",
    "Computer Hardware Repair",
    "Software Troubleshooting",
    "Network Setup",
    "Car Repair",
    "Motorcycle Repair",
    "Vehicle AC Repair",
    "Other",
];

pub const WEEKDAYS: [&str; 7] =
    ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

pub const MAX_DESCRIPTION_LEN: usize = 500;

pub const PLACEHOLDER_SERVICE: &str = "Other";
pub const PLACEHOLDER_LOCATION: &str = "To be specified";
pub const PLACEHOLDER_CONTACT: &str = "0000000000";

/// JSON-backed list of strings (services, areas, weekdays).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn contains(&self, value: &str) -> bool { self.0.iter().any(|v| v == value) }

    /// Case-insensitive substring match against any entry.
    pub fn any_contains_ci(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.0.iter().any(|v| v.to_lowercase().contains(&needle))
    }
}

impl From<Vec<String>> for StringList {
    fn from(v: Vec<String>) -> Self { Self(v) }
}

impl From<&[&str]> for StringList {
    fn from(v: &[&str]) -> Self { Self(v.iter().map(|s| (*s).to_owned()).collect()) }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "technician")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    #[sea_orm(column_type = "Json")]
    pub services_offered: StringList,
    #[sea_orm(column_type = "Json")]
    pub specializations: StringList,
    pub contact_number: String,
    pub location: String,
    #[sea_orm(column_type = "Json")]
    pub service_areas: StringList,
    pub description: Option<String>,
    /// Cached mean of review ratings; see the rating aggregator.
    pub average_rating: f64,
    /// Cached count of review rows.
    pub review_count: i32,
    #[sea_orm(column_type = "Json")]
    pub availability: StringList,
    pub is_available: bool,
    pub is_verified_by_admin: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
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

/// English weekday name, matching the entries stored in `availability`.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn validate_services(services: &[String]) -> Result<(), ModelError> {
    if services.is_empty() {
        return Err(ModelError::validation("at least one service is required"));
    }
    if let Some(bad) = services.iter().find(|s| !SERVICE_CATALOG.contains(&s.as_str())) {
        return Err(ModelError::validation(format!("unknown service: {bad}")));
    }
    Ok(())
}

/// `^\+?\d{10,15}$`
pub fn validate_contact_number(number: &str) -> Result<(), ModelError> {
    let digits = number.strip_prefix('+').unwrap_or(number);
    let ok = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    if !ok { return Err(ModelError::validation("please fill a valid contact number")); }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), ModelError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        let msg = format!("description cannot be more than {MAX_DESCRIPTION_LEN} characters");
        return Err(ModelError::validation(msg));
    }
    Ok(())
}

pub fn validate_availability(days: &[String]) -> Result<(), ModelError> {
    if let Some(bad) = days.iter().find(|d| !WEEKDAYS.contains(&d.as_str())) {
        return Err(ModelError::validation(format!("unknown weekday: {bad}")));
    }
    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), ModelError> {
    if location.trim().is_empty() { return Err(ModelError::validation("location required")); }
    Ok(())
}

/// Profile with owner details populated, as served by the listing endpoints.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianProfile {
    #[serde(flatten)]
    pub technician: Model,
    pub user: Option<user::UserSummary>,
}

/// Placeholder profile created at registration or on promotion to technician.
pub async fn create_placeholder<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Model, ModelError> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        services_offered: Set(StringList(vec![PLACEHOLDER_SERVICE.to_string()])),
        specializations: Set(StringList::default()),
        contact_number: Set(PLACEHOLDER_CONTACT.to_string()),
        location: Set(PLACEHOLDER_LOCATION.to_string()),
        service_areas: Set(StringList::default()),
        description: Set(None),
        average_rating: Set(0.0),
        review_count: Set(0),
        availability: Set(StringList::from(&WEEKDAYS[..5])),
        is_available: Set(true),
        is_verified_by_admin: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).one(db).await?)
}

pub async fn set_verified<C: ConnectionTrait>(
    db: &C,
    technician: Model,
    verified: bool,
) -> Result<Model, ModelError> {
    let mut am: ActiveModel = technician.into();
    am.is_verified_by_admin = Set(verified);
    Ok(am.update(db).await?)
}
