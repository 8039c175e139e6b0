use chrono::Utc;
use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{technician, user};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_LEN: usize = 500;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "review")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub technician_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Technician, User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Technician => Entity::belongs_to(technician::Entity)
                .from(Column::TechnicianId)
                .to(technician::Column::Id)
                .into(),
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

impl Related<technician::Entity> for Entity {
    fn to() -> RelationDef { Relation::Technician.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_rating(rating: i32) -> Result<(), ModelError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        let msg = format!("rating must be between {MIN_RATING} and {MAX_RATING}");
        return Err(ModelError::validation(msg));
    }
    Ok(())
}

pub fn validate_comment(comment: &str) -> Result<(), ModelError> {
    if comment.chars().count() > MAX_COMMENT_LEN {
        let msg = format!("comment cannot be more than {MAX_COMMENT_LEN} characters");
        return Err(ModelError::validation(msg));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub technician_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Insert a review. A second review by the same user for the same
/// technician hits the unique index and comes back as `Duplicate`.
pub async fn create<C: ConnectionTrait>(db: &C, input: NewReview) -> Result<Model, ModelError> {
    validate_rating(input.rating)?;
    if let Some(c) = &input.comment { validate_comment(c)?; }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        technician_id: Set(input.technician_id),
        user_id: Set(input.user_id),
        rating: Set(input.rating),
        comment: Set(input.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

/// `(average, count)` over the given ratings; `(0.0, 0)` when empty.
pub fn aggregate(ratings: &[i32]) -> (f64, i32) {
    if ratings.is_empty() { return (0.0, 0); }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    (sum as f64 / ratings.len() as f64, ratings.len() as i32)
}
