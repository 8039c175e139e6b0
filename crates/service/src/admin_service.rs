//! Admin moderation: verification, role changes and cascade deletion.
//!
//! Every cascade runs in a single transaction. Reviews and bookings hold
//! restricting foreign keys, so they are removed before their parents.

use std::collections::BTreeSet;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::{error, info, instrument};
use uuid::Uuid;

use models::booking;
use models::review;
use models::technician;
use models::user::{self, Role};

use crate::auth::Principal;
use crate::errors::ServiceError;
use crate::review_service;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicianDeletion {
    pub technician_id: Uuid,
    pub reviews_removed: u64,
    pub bookings_removed: u64,
    pub user_removed: bool,
    pub user_demoted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDeletion {
    pub user_id: Uuid,
    pub technician_profiles_removed: u64,
    pub reviews_removed: u64,
    pub bookings_removed: u64,
}

/// All accounts, newest first.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>, ServiceError> {
    Ok(user::Entity::find().order_by_desc(user::Column::CreatedAt).all(db).await?)
}

/// Mark a technician verified and promote a plain `user` owner to `technician`.
#[instrument(skip(db))]
pub async fn verify_technician(
    db: &DatabaseConnection,
    technician_id: Uuid,
) -> Result<technician::Model, ServiceError> {
    let tech = find_technician(db, technician_id).await?;
    if tech.is_verified_by_admin {
        return Err(ServiceError::conflict("technician is already verified"));
    }
    let txn = db.begin().await?;
    let owner_id = tech.user_id;
    let tech = technician::set_verified(&txn, tech, true).await?;
    if let Some(owner) = user::Entity::find_by_id(owner_id).one(&txn).await? {
        if owner.role == Role::User {
            user::set_role(&txn, owner, Role::Technician).await?;
            info!(user_id = %owner_id, "owner_promoted_to_technician");
        }
    }
    txn.commit().await?;
    info!(technician_id = %tech.id, "technician_verified");
    Ok(tech)
}

#[instrument(skip(db))]
pub async fn disapprove_technician(
    db: &DatabaseConnection,
    technician_id: Uuid,
) -> Result<technician::Model, ServiceError> {
    let tech = find_technician(db, technician_id).await?;
    if !tech.is_verified_by_admin {
        return Err(ServiceError::conflict("technician is already unverified"));
    }
    let tech = technician::set_verified(db, tech, false).await?;
    info!(technician_id = %tech.id, "technician_disapproved");
    Ok(tech)
}

/// Change a user's role. An admin may not demote themself. Promotion to
/// `technician` creates a placeholder profile when none exists.
#[instrument(skip(db), fields(caller = %caller.id))]
pub async fn change_role(
    db: &DatabaseConnection,
    caller: &Principal,
    user_id: Uuid,
    role: &str,
) -> Result<user::Model, ServiceError> {
    let role: Role = role.parse()?;
    let target = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    if caller.id == user_id && role != Role::Admin {
        return Err(ServiceError::forbidden("cannot demote yourself"));
    }

    let txn = db.begin().await?;
    let from = target.role;
    let updated = user::set_role(&txn, target, role).await?;
    if role == Role::Technician && technician::find_by_user(&txn, user_id).await?.is_none() {
        let profile = technician::create_placeholder(&txn, user_id).await?;
        info!(user_id = %user_id, technician_id = %profile.id, "technician_placeholder_created");
    }
    txn.commit().await?;
    info!(user_id = %user_id, from = %from, to = %role, "user_role_changed");
    Ok(updated)
}

/// Delete a technician profile with its reviews and bookings, then remove or
/// demote the owning account.
#[instrument(skip(db))]
pub async fn delete_technician(
    db: &DatabaseConnection,
    technician_id: Uuid,
) -> Result<TechnicianDeletion, ServiceError> {
    let tech = technician::Entity::find_by_id(technician_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("technician profile"))?;

    let txn = db.begin().await?;
    match technician_cascade(&txn, tech).await {
        Ok(report) => {
            txn.commit().await?;
            info!(
                technician_id = %technician_id,
                reviews = report.reviews_removed,
                bookings = report.bookings_removed,
                user_removed = report.user_removed,
                user_demoted = report.user_demoted,
                "technician_deleted"
            );
            Ok(report)
        }
        Err(e) => {
            error!(technician_id = %technician_id, error = %e, "technician_cascade_failed");
            let _ = txn.rollback().await;
            Err(e)
        }
    }
}

/// Delete an account and everything that references it. Self-deletion is refused.
#[instrument(skip(db), fields(caller = %caller.id))]
pub async fn delete_user(
    db: &DatabaseConnection,
    caller: &Principal,
    user_id: Uuid,
) -> Result<UserDeletion, ServiceError> {
    if caller.id == user_id {
        return Err(ServiceError::forbidden("cannot delete your own admin account"));
    }
    let target = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;

    let txn = db.begin().await?;
    match user_cascade(&txn, target).await {
        Ok(report) => {
            txn.commit().await?;
            info!(
                user_id = %user_id,
                profiles = report.technician_profiles_removed,
                reviews = report.reviews_removed,
                bookings = report.bookings_removed,
                "user_deleted"
            );
            Ok(report)
        }
        Err(e) => {
            error!(user_id = %user_id, error = %e, "user_cascade_failed");
            let _ = txn.rollback().await;
            Err(e)
        }
    }
}

async fn find_technician(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<technician::Model, ServiceError> {
    technician::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("technician"))
}

/// Reviews and bookings of one profile, then the profile. Returns `(reviews, bookings)`.
async fn remove_profile<C: ConnectionTrait>(
    db: &C,
    tech: technician::Model,
) -> Result<(u64, u64), ServiceError> {
    let reviews = review::Entity::delete_many()
        .filter(review::Column::TechnicianId.eq(tech.id))
        .exec(db)
        .await?
        .rows_affected;
    let bookings = booking::Entity::delete_many()
        .filter(booking::Column::TechnicianId.eq(tech.id))
        .exec(db)
        .await?
        .rows_affected;
    tech.delete(db).await?;
    Ok((reviews, bookings))
}

/// Remove what an account did as a customer and refresh the ratings it touched.
/// Returns `(reviews, bookings)`.
async fn remove_customer_activity<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<(u64, u64), ServiceError> {
    let touched: BTreeSet<Uuid> = review::Entity::find()
        .filter(review::Column::UserId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.technician_id)
        .collect();
    let reviews = review::Entity::delete_many()
        .filter(review::Column::UserId.eq(user_id))
        .exec(db)
        .await?
        .rows_affected;
    let bookings = booking::Entity::delete_many()
        .filter(booking::Column::UserId.eq(user_id))
        .exec(db)
        .await?
        .rows_affected;
    for technician_id in touched {
        match review_service::refresh_rating(db, technician_id).await {
            Ok(_) | Err(ServiceError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok((reviews, bookings))
}

async fn technician_cascade(
    txn: &DatabaseTransaction,
    tech: technician::Model,
) -> Result<TechnicianDeletion, ServiceError> {
    let technician_id = tech.id;
    let owner_id = tech.user_id;
    let (reviews_removed, bookings_removed) = remove_profile(txn, tech).await?;
    let mut report = TechnicianDeletion {
        technician_id,
        reviews_removed,
        bookings_removed,
        ..Default::default()
    };

    let Some(owner) = user::Entity::find_by_id(owner_id).one(txn).await? else {
        return Ok(report);
    };
    let remaining = technician::Entity::find()
        .filter(technician::Column::UserId.eq(owner_id))
        .count(txn)
        .await?;
    if remaining == 0 && owner.role != Role::Admin {
        let (r, b) = remove_customer_activity(txn, owner_id).await?;
        report.reviews_removed += r;
        report.bookings_removed += b;
        owner.delete(txn).await?;
        report.user_removed = true;
    } else if owner.role == Role::Technician {
        user::set_role(txn, owner, Role::User).await?;
        report.user_demoted = true;
    }
    Ok(report)
}

async fn user_cascade(
    txn: &DatabaseTransaction,
    target: user::Model,
) -> Result<UserDeletion, ServiceError> {
    let mut report = UserDeletion { user_id: target.id, ..Default::default() };
    let profiles = technician::Entity::find()
        .filter(technician::Column::UserId.eq(target.id))
        .all(txn)
        .await?;
    for profile in profiles {
        let (r, b) = remove_profile(txn, profile).await?;
        report.technician_profiles_removed += 1;
        report.reviews_removed += r;
        report.bookings_removed += b;
    }
    let (r, b) = remove_customer_activity(txn, target.id).await?;
    report.reviews_removed += r;
    report.bookings_removed += b;
    target.delete(txn).await?;
    Ok(report)
}
