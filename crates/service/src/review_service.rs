//! Reviews and the technician rating aggregator.
//!
//! `average_rating` and `review_count` on a technician are a cache over the
//! review rows. They are recomputed from scratch by [`refresh_rating`] after
//! every review insert and inside the user-deletion cascade;
//! [`rating_cache_consistent`] checks the invariant.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use models::booking::{self, BookingStatus};
use models::errors::ModelError;
use models::review::{self, NewReview};
use models::technician;
use models::user;

use crate::errors::ServiceError;

const ALREADY_REVIEWED: &str = "you have already reviewed this technician";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub technician_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reviewer {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: review::Model,
    pub user: Option<Reviewer>,
}

/// Submit a review. The reviewer must have a completed booking with the technician.
#[instrument(skip(db, req), fields(user_id = %user_id, technician_id = %req.technician_id))]
pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    req: ReviewRequest,
) -> Result<review::Model, ServiceError> {
    review::validate_rating(req.rating)?;
    if technician::Entity::find_by_id(req.technician_id).one(db).await?.is_none() {
        return Err(ServiceError::not_found("technician"));
    }

    let completed = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user_id))
        .filter(booking::Column::TechnicianId.eq(req.technician_id))
        .filter(booking::Column::Status.eq(BookingStatus::Completed))
        .count(db)
        .await?;
    if completed == 0 {
        return Err(ServiceError::forbidden(
            "only customers with a completed booking can review this technician",
        ));
    }

    let existing = review::Entity::find()
        .filter(review::Column::TechnicianId.eq(req.technician_id))
        .filter(review::Column::UserId.eq(user_id))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(ServiceError::conflict(ALREADY_REVIEWED));
    }

    let new = NewReview {
        technician_id: req.technician_id,
        user_id,
        rating: req.rating,
        comment: req.comment,
    };
    let created = review::create(db, new)
        .await
        .map_err(|e| match e {
            ModelError::Duplicate(_) => ServiceError::conflict(ALREADY_REVIEWED),
            other => other.into(),
        })?;
    info!(review_id = %created.id, rating = created.rating, "review_created");

    // best effort: the review stands even if the cache write fails
    if let Err(e) = refresh_rating(db, created.technician_id).await {
        error!(technician_id = %created.technician_id, error = %e, "rating_refresh_failed");
    }
    Ok(created)
}

/// Recompute `average_rating` / `review_count` from all reviews of a technician.
pub async fn refresh_rating<C: ConnectionTrait>(
    db: &C,
    technician_id: Uuid,
) -> Result<technician::Model, ServiceError> {
    let ratings = ratings_of(db, technician_id).await?;
    let (average, count) = review::aggregate(&ratings);
    let tech = technician::Entity::find_by_id(technician_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("technician"))?;
    let mut am: technician::ActiveModel = tech.into();
    am.average_rating = Set(average);
    am.review_count = Set(count);
    let updated = am.update(db).await?;
    info!(technician_id = %technician_id, average, count, "rating_refreshed");
    Ok(updated)
}

/// True when the cached aggregate matches the review rows.
pub async fn rating_cache_consistent<C: ConnectionTrait>(
    db: &C,
    technician_id: Uuid,
) -> Result<bool, ServiceError> {
    let tech = technician::Entity::find_by_id(technician_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("technician"))?;
    let (average, count) = review::aggregate(&ratings_of(db, technician_id).await?);
    Ok(tech.review_count == count && (tech.average_rating - average).abs() < 1e-9)
}

async fn ratings_of<C: ConnectionTrait>(
    db: &C,
    technician_id: Uuid,
) -> Result<Vec<i32>, ServiceError> {
    Ok(review::Entity::find()
        .select_only()
        .column(review::Column::Rating)
        .filter(review::Column::TechnicianId.eq(technician_id))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}

/// Public list for a technician, newest first, with the reviewer's name.
pub async fn list_for_technician(
    db: &DatabaseConnection,
    technician_id: Uuid,
) -> Result<Vec<ReviewView>, ServiceError> {
    let rows = review::Entity::find()
        .filter(review::Column::TechnicianId.eq(technician_id))
        .order_by_desc(review::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(r, u)| ReviewView {
            review: r,
            user: u.map(|u| Reviewer { id: u.id, name: u.name }),
        })
        .collect())
}
